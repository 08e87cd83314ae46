use crate::{auth::Authenticator, repository::Repositories};

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub auth: Authenticator,
}

impl AppState {
    pub fn new(repos: Repositories, auth: Authenticator) -> Self {
        Self { repos, auth }
    }
}
