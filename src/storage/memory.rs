use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{Record, Table};
use crate::{
    error::{AppError, AppResult},
    models::{
        AdminAccount, CreateEnrollmentRequest, CreateTeamMemberRequest, Enrollment,
        EnrollmentStatus, NewAdminAccount, ReorderEntry, TeamMember, UpdateTeamMemberRequest,
        normalize_image,
    },
    repository::{AdminRepository, EnrollmentRepository, NO_POSITION_AFTER_LAST, TeamRepository},
    transaction::Transaction,
};

impl Record for TeamMember {
    fn id(&self) -> i64 {
        self.id
    }

    fn assign_id(&mut self, id: i64) {
        self.id = id;
    }

    fn on_insert(&mut self) {
        self.version = 1;
    }

    fn on_update(&mut self, previous: &Self) {
        self.version = previous.version + 1;
    }
}

impl Record for Enrollment {
    fn id(&self) -> i64 {
        self.id
    }

    fn assign_id(&mut self, id: i64) {
        self.id = id;
    }
}

impl Record for AdminAccount {
    fn id(&self) -> i64 {
        self.id
    }

    fn assign_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// Process-local back end. Each table sits behind its own lock; a writer
/// holds the lock for its whole transaction, which makes concurrent
/// reorders serialize the same way row locks do in Postgres.
#[derive(Debug, Default)]
pub struct MemoryStore {
    team: RwLock<Table<TeamMember>>,
    enrollments: RwLock<Table<Enrollment>>,
    admins: RwLock<Table<AdminAccount>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_team(table: &Table<TeamMember>) -> Vec<TeamMember> {
    let mut members = table.scan().cloned().collect::<Vec<_>>();
    members.sort_by(|left, right| left.order.cmp(&right.order).then(left.id.cmp(&right.id)));
    members
}

#[async_trait]
impl TeamRepository for MemoryStore {
    async fn list(&self) -> AppResult<Vec<TeamMember>> {
        Ok(sorted_team(&*self.team.read().await))
    }

    async fn get(&self, id: i64) -> AppResult<Option<TeamMember>> {
        Ok(self.team.read().await.get(id).cloned())
    }

    async fn create(&self, payload: CreateTeamMemberRequest) -> AppResult<TeamMember> {
        let mut team = self.team.write().await;
        let order = match payload.order {
            Some(order) => order,
            None => team
                .scan()
                .map(|member| member.order)
                .max()
                .unwrap_or(0)
                .checked_add(1)
                .ok_or_else(|| AppError::validation(NO_POSITION_AFTER_LAST))?,
        };

        let member = team.insert(TeamMember {
            id: 0,
            name: payload.name.trim().to_string(),
            role: payload.role.trim().to_string(),
            image: normalize_image(payload.image),
            description: payload.description,
            order,
            version: 0,
        });

        debug!(id = member.id, order = member.order, "team member added");
        Ok(member)
    }

    async fn update(
        &self,
        id: i64,
        patch: UpdateTeamMemberRequest,
    ) -> AppResult<Option<TeamMember>> {
        let mut team = self.team.write().await;
        let Some(current_version) = team.get(id).map(|member| member.version) else {
            return Ok(None);
        };

        if let Some(expected) = patch.version {
            if expected != current_version {
                warn!(id, expected, actual = current_version, "team member edit on stale version");
                return Err(AppError::stale_versions(vec![id]));
            }
        }

        let change = team
            .update_where(id, |_| true, |member| patch.apply_to(member))
            .ok_or_else(|| AppError::storage(format!("team member {id} vanished under lock")))?;

        Ok(team.get(change.row_id()).cloned())
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.team.write().await.delete(id).is_some())
    }

    async fn reorder(&self, entries: &[ReorderEntry]) -> AppResult<()> {
        let mut team = self.team.write().await;
        let mut txn = Transaction::begin();
        let mut conflicting_ids = Vec::new();

        for entry in entries {
            let change = team.update_where(
                entry.id,
                |member| member.version == entry.version,
                |member| member.order = entry.order,
            );
            match change {
                Some(change) => txn.record_change(change)?,
                None => conflicting_ids.push(entry.id),
            }
        }

        if !conflicting_ids.is_empty() {
            txn.rollback(&mut *team)?;
            warn!(
                txn = %txn.id(),
                conflicting = ?conflicting_ids,
                "team reorder aborted on stale versions"
            );
            return Err(AppError::stale_versions(conflicting_ids));
        }

        let applied = txn.change_count();
        txn.commit()?;
        info!(txn = %txn.id(), rows = applied, "team reorder committed");
        Ok(())
    }
}

#[async_trait]
impl EnrollmentRepository for MemoryStore {
    async fn create(&self, payload: CreateEnrollmentRequest) -> AppResult<Enrollment> {
        let now = Utc::now();
        let enrollment = self.enrollments.write().await.insert(Enrollment {
            id: 0,
            class_id: payload.class_id,
            name: payload.name.trim().to_string(),
            phone: payload.phone.trim().to_string(),
            email: payload.email.trim().to_string(),
            age: payload.age,
            gender: payload.gender,
            experience: payload.experience,
            message: payload.message,
            medical_conditions: payload.medical_conditions,
            emergency_contact: payload.emergency_contact,
            emergency_phone: payload.emergency_phone,
            status: EnrollmentStatus::Pending,
            enrollment_date: now,
            approval_date: None,
            created_at: now,
            updated_at: now,
        });
        Ok(enrollment)
    }

    async fn list(&self, class_id: Option<i64>) -> AppResult<Vec<Enrollment>> {
        let mut enrollments = self
            .enrollments
            .read()
            .await
            .scan()
            .filter(|enrollment| class_id.is_none_or(|class_id| enrollment.class_id == class_id))
            .cloned()
            .collect::<Vec<_>>();
        enrollments.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then(right.id.cmp(&left.id))
        });
        Ok(enrollments)
    }

    async fn get(&self, id: i64) -> AppResult<Option<Enrollment>> {
        Ok(self.enrollments.read().await.get(id).cloned())
    }

    async fn update_status(
        &self,
        id: i64,
        status: EnrollmentStatus,
    ) -> AppResult<Option<Enrollment>> {
        let now = Utc::now();
        let mut enrollments = self.enrollments.write().await;
        let updated = enrollments
            .update_where(id, |_| true, |enrollment| enrollment.transition(status, now))
            .and_then(|change| enrollments.get(change.row_id()).cloned());
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.enrollments.write().await.delete(id).is_some())
    }
}

#[async_trait]
impl AdminRepository for MemoryStore {
    async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<AdminAccount>> {
        Ok(self
            .admins
            .read()
            .await
            .find(|account| account.user_id == user_id)
            .cloned())
    }

    async fn create(&self, account: NewAdminAccount) -> AppResult<AdminAccount> {
        let mut admins = self.admins.write().await;
        if admins.find(|existing| existing.user_id == account.user_id).is_some() {
            return Err(AppError::conflict(format!(
                "admin '{}' already exists",
                account.user_id
            )));
        }

        Ok(admins.insert(AdminAccount {
            id: 0,
            user_id: account.user_id,
            password_hash: account.password_hash,
            name: account.name,
            role: account.role,
            created_at: Utc::now(),
        }))
    }
}
