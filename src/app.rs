use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::{get, patch, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    auth::require_admin,
    handlers::{
        auth::{login, logout, me},
        enrollment::{
            delete_enrollment, get_enrollment, list_class_enrollments, list_enrollments,
            submit_enrollment, update_enrollment_status,
        },
        healthcheck,
        team::{
            create_team_member, delete_team_member, list_team, reorder_team, update_team_member,
        },
    },
    state::AppState,
};

/// Builds the full router. Every `/api/v1/admin` route sits behind
/// [`require_admin`].
pub fn build_router(state: AppState, frontend_origin: Option<&str>) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    let admin = Router::new()
        .route("/team", get(list_team).post(create_team_member))
        .route("/team/reorder", patch(reorder_team))
        .route(
            "/team/{id}",
            put(update_team_member).delete(delete_team_member),
        )
        .route("/enrollments", get(list_enrollments))
        .route(
            "/enrollments/{id}",
            get(get_enrollment)
                .patch(update_enrollment_status)
                .delete(delete_enrollment),
        )
        .route("/classes/{id}/enrollments", get(list_class_enrollments))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_admin,
        ));

    Router::new()
        .route("/health", get(healthcheck))
        .route("/api/v1/team", get(list_team))
        .route("/api/v1/enrollments", post(submit_enrollment))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/me", get(me))
        .nest("/api/v1/admin", admin)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors_layer(frontend_origin))
        .with_state(state)
}

/// Cookies only travel cross-origin to an explicitly configured front end.
fn cors_layer(frontend_origin: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ]);

    match frontend_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => cors
            .allow_origin(origin)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .allow_credentials(true),
        Some(Err(err)) => {
            warn!(error = %err, "ignoring unparsable FRONTEND_ORIGIN");
            cors.allow_origin(Any).allow_headers(Any)
        }
        None => cors.allow_origin(Any).allow_headers(Any),
    }
}
