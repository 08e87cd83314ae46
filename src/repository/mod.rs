//! Storage seams. Every back end implements the three repository traits; the
//! application only ever sees `Arc<dyn ...>` handles.

mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{
        AdminAccount, CreateEnrollmentRequest, CreateTeamMemberRequest, Enrollment,
        EnrollmentStatus, NewAdminAccount, ReorderEntry, TeamMember, UpdateTeamMemberRequest,
    },
    storage::MemoryStore,
};

pub use postgres::PgStore;

/// Returned when a defaulted `order` would step past `i32::MAX`.
pub(crate) const NO_POSITION_AFTER_LAST: &str =
    "no position left after the last member; pass an explicit order";

#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// All members by `order`, ties broken by `id`.
    async fn list(&self) -> AppResult<Vec<TeamMember>>;
    async fn get(&self, id: i64) -> AppResult<Option<TeamMember>>;
    async fn create(&self, payload: CreateTeamMemberRequest) -> AppResult<TeamMember>;
    /// `Ok(None)` when the row does not exist; a conflict error when
    /// `patch.version` is set and no longer matches.
    async fn update(
        &self,
        id: i64,
        patch: UpdateTeamMemberRequest,
    ) -> AppResult<Option<TeamMember>>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
    /// Applies every entry as `SET order WHERE id AND version` inside one
    /// transaction. If any entry matches no row the transaction is rolled
    /// back and the error lists every entry that missed.
    async fn reorder(&self, entries: &[ReorderEntry]) -> AppResult<()>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn create(&self, payload: CreateEnrollmentRequest) -> AppResult<Enrollment>;
    /// Newest first, optionally narrowed to one class.
    async fn list(&self, class_id: Option<i64>) -> AppResult<Vec<Enrollment>>;
    async fn get(&self, id: i64) -> AppResult<Option<Enrollment>>;
    async fn update_status(
        &self,
        id: i64,
        status: EnrollmentStatus,
    ) -> AppResult<Option<Enrollment>>;
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<AdminAccount>>;
    /// Fails with a conflict when the user id is taken.
    async fn create(&self, account: NewAdminAccount) -> AppResult<AdminAccount>;
}

/// The set of repositories one back end provides.
#[derive(Clone)]
pub struct Repositories {
    pub team: Arc<dyn TeamRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub admins: Arc<dyn AdminRepository>,
}

impl Repositories {
    pub fn memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    pub fn postgres(store: PgStore) -> Self {
        Self::from_store(Arc::new(store))
    }

    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: TeamRepository + EnrollmentRepository + AdminRepository + 'static,
    {
        Self {
            team: store.clone(),
            enrollments: store.clone(),
            admins: store,
        }
    }
}
