#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sportshub::{
    auth::{Authenticator, SessionIssuer, SessionSecret, SystemClock},
    build_router,
    models::{CreateTeamMemberRequest, TeamMember, UpdateTeamMemberRequest},
    repository::Repositories,
    state::AppState,
};
use tower::ServiceExt;

pub const ADMIN_USER: &str = "owner";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub router: Router,
    pub repos: Repositories,
    pub auth: Authenticator,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_repos(Repositories::memory()).await
    }

    pub async fn with_repos(repos: Repositories) -> Self {
        let secret = SessionSecret::new("integration-test-secret-integration-test")
            .expect("secret should be long enough");
        let sessions = SessionIssuer::new(&secret, 3600, Arc::new(SystemClock));
        let auth = Authenticator::new(repos.admins.clone(), sessions, 4);
        auth.bootstrap(ADMIN_USER, ADMIN_PASSWORD)
            .await
            .expect("admin should bootstrap");

        let router = build_router(AppState::new(repos.clone(), auth.clone()), None);
        Self {
            router,
            repos,
            auth,
        }
    }

    /// Logs in over HTTP and returns the `Cookie` header value to send back.
    pub async fn login(&self) -> String {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "user_id": ADMIN_USER, "password": ADMIN_PASSWORD }).to_string(),
            ))
            .expect("request should build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("response expected");
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .expect("login should set a cookie");
        set_cookie
            .split(';')
            .next()
            .expect("cookie should have a name=value pair")
            .to_string()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        payload: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match payload {
            Some(payload) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(payload.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("request should build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("response expected");
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("response body should be readable")
            .to_bytes();

        if body.is_empty() {
            return (status, Value::Null);
        }

        let json = serde_json::from_slice::<Value>(&body).expect("body should be valid JSON");
        (status, json)
    }

    pub async fn add_member(&self, name: &str, order: i32) -> TeamMember {
        self.repos
            .team
            .create(CreateTeamMemberRequest {
                name: name.to_string(),
                role: "coach".to_string(),
                image: None,
                description: String::new(),
                order: Some(order),
            })
            .await
            .expect("member should be created")
    }

    /// Edits the row until its version reaches `version`.
    pub async fn advance_version(&self, id: i64, version: i32) -> TeamMember {
        loop {
            let member = self
                .repos
                .team
                .get(id)
                .await
                .expect("lookup should succeed")
                .expect("member should exist");
            if member.version >= version {
                return member;
            }
            self.repos
                .team
                .update(
                    id,
                    UpdateTeamMemberRequest {
                        description: Some(format!("edit {}", member.version)),
                        ..Default::default()
                    },
                )
                .await
                .expect("edit should succeed");
        }
    }

    /// Rows `{1, order 1, v5}` and `{2, order 2, v3}`.
    pub async fn seed_pair(&self) {
        let first = self.add_member("first", 1).await;
        let second = self.add_member("second", 2).await;
        assert_eq!((first.id, second.id), (1, 2));
        self.advance_version(1, 5).await;
        self.advance_version(2, 3).await;
    }

    pub async fn member(&self, id: i64) -> Option<TeamMember> {
        self.repos.team.get(id).await.expect("lookup should succeed")
    }
}

pub fn order_and_version(member: &TeamMember) -> (i32, i32) {
    (member.order, member.version)
}
