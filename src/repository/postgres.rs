use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, warn};

use super::{AdminRepository, EnrollmentRepository, NO_POSITION_AFTER_LAST, TeamRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        AdminAccount, CreateEnrollmentRequest, CreateTeamMemberRequest, Enrollment,
        EnrollmentStatus, NewAdminAccount, ReorderEntry, TeamMember, UpdateTeamMemberRequest,
        normalize_image,
    },
};

const TEAM_COLUMNS: &str = "id, name, role, image, description, display_order, version";

const ENROLLMENT_COLUMNS: &str = r#"
    id,
    class_id,
    name,
    phone,
    email,
    age,
    gender,
    experience,
    message,
    medical_conditions,
    emergency_contact,
    emergency_phone,
    status,
    enrollment_date,
    approval_date,
    created_at,
    updated_at
"#;

/// Postgres back end. `team_members.version` is maintained by a
/// `BEFORE UPDATE` trigger, so no statement here ever writes it.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn has_sql_state(err: &sqlx::Error, state: &str) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(state))
}

#[async_trait]
impl TeamRepository for PgStore {
    async fn list(&self) -> AppResult<Vec<TeamMember>> {
        let members = sqlx::query_as::<_, TeamMember>(&format!(
            "SELECT {TEAM_COLUMNS} FROM team_members ORDER BY display_order ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn get(&self, id: i64) -> AppResult<Option<TeamMember>> {
        let member = sqlx::query_as::<_, TeamMember>(&format!(
            "SELECT {TEAM_COLUMNS} FROM team_members WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn create(&self, payload: CreateTeamMemberRequest) -> AppResult<TeamMember> {
        let member = sqlx::query_as::<_, TeamMember>(&format!(
            r#"
            INSERT INTO team_members (name, role, image, description, display_order)
            VALUES (
                $1, $2, $3, $4,
                COALESCE($5, (SELECT COALESCE(MAX(display_order), 0) + 1 FROM team_members))
            )
            RETURNING {TEAM_COLUMNS}
            "#
        ))
        .bind(payload.name.trim())
        .bind(payload.role.trim())
        .bind(normalize_image(payload.image))
        .bind(payload.description)
        .bind(payload.order)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            // 22003: the defaulted position ran past INTEGER.
            if has_sql_state(&err, "22003") {
                AppError::validation(NO_POSITION_AFTER_LAST)
            } else {
                AppError::from(err)
            }
        })?;

        Ok(member)
    }

    async fn update(
        &self,
        id: i64,
        patch: UpdateTeamMemberRequest,
    ) -> AppResult<Option<TeamMember>> {
        let updated = sqlx::query_as::<_, TeamMember>(&format!(
            r#"
            UPDATE team_members SET
                name = COALESCE($2, name),
                role = COALESCE($3, role),
                image = CASE
                    WHEN $4::TEXT IS NULL THEN image
                    WHEN $4 = '' THEN NULL
                    ELSE $4
                END,
                description = COALESCE($5, description),
                display_order = COALESCE($6, display_order)
            WHERE id = $1 AND ($7::INT IS NULL OR version = $7)
            RETURNING {TEAM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.name.as_deref().map(str::trim))
        .bind(patch.role.as_deref().map(str::trim))
        // Some("") clears the image, None keeps it.
        .bind(patch.image.as_ref().map(|image| normalize_image(Some(image.clone())).unwrap_or_default()))
        .bind(patch.description)
        .bind(patch.order)
        .bind(patch.version)
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_some() || patch.version.is_none() {
            return Ok(updated);
        }

        // Zero rows with an expected version: either gone or stale.
        match TeamRepository::get(self, id).await? {
            Some(current) => {
                warn!(
                    id,
                    expected = ?patch.version,
                    actual = current.version,
                    "team member edit on stale version"
                );
                Err(AppError::stale_versions(vec![id]))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM team_members WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reorder(&self, entries: &[ReorderEntry]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let mut conflicting_ids = Vec::new();

        for entry in entries {
            let result = sqlx::query(
                "UPDATE team_members SET display_order = $1 WHERE id = $2 AND version = $3",
            )
            .bind(entry.order)
            .bind(entry.id)
            .bind(entry.version)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                conflicting_ids.push(entry.id);
            }
        }

        if !conflicting_ids.is_empty() {
            tx.rollback().await?;
            warn!(conflicting = ?conflicting_ids, "team reorder aborted on stale versions");
            return Err(AppError::stale_versions(conflicting_ids));
        }

        tx.commit().await?;
        info!(rows = entries.len(), "team reorder committed");
        Ok(())
    }
}

#[async_trait]
impl EnrollmentRepository for PgStore {
    async fn create(&self, payload: CreateEnrollmentRequest) -> AppResult<Enrollment> {
        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            r#"
            INSERT INTO enrollments (
                class_id, name, phone, email, age, gender, experience,
                message, medical_conditions, emergency_contact, emergency_phone
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {ENROLLMENT_COLUMNS}
            "#
        ))
        .bind(payload.class_id)
        .bind(payload.name.trim())
        .bind(payload.phone.trim())
        .bind(payload.email.trim())
        .bind(payload.age)
        .bind(payload.gender)
        .bind(payload.experience)
        .bind(payload.message)
        .bind(payload.medical_conditions)
        .bind(payload.emergency_contact)
        .bind(payload.emergency_phone)
        .fetch_one(&self.pool)
        .await?;

        Ok(enrollment)
    }

    async fn list(&self, class_id: Option<i64>) -> AppResult<Vec<Enrollment>> {
        let enrollments = sqlx::query_as::<_, Enrollment>(&format!(
            r#"
            SELECT {ENROLLMENT_COLUMNS}
            FROM enrollments
            WHERE ($1::BIGINT IS NULL OR class_id = $1)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(class_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(enrollments)
    }

    async fn get(&self, id: i64) -> AppResult<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(enrollment)
    }

    async fn update_status(
        &self,
        id: i64,
        status: EnrollmentStatus,
    ) -> AppResult<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            r#"
            UPDATE enrollments SET
                status = $2,
                approval_date = CASE WHEN $2 = 'APPROVED'::enrollment_status
                    THEN NOW() ELSE approval_date END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ENROLLMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(enrollment)
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AdminRepository for PgStore {
    async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<AdminAccount>> {
        let account = sqlx::query_as::<_, AdminAccount>(
            r#"
            SELECT id, user_id, password_hash, name, role, created_at
            FROM admin_accounts
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn create(&self, account: NewAdminAccount) -> AppResult<AdminAccount> {
        let created = sqlx::query_as::<_, AdminAccount>(
            r#"
            INSERT INTO admin_accounts (user_id, password_hash, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, password_hash, name, role, created_at
            "#,
        )
        .bind(&account.user_id)
        .bind(account.password_hash)
        .bind(account.name)
        .bind(account.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if has_sql_state(&err, "23505") {
                AppError::conflict(format!("admin '{}' already exists", account.user_id))
            } else {
                AppError::from(err)
            }
        })?;

        Ok(created)
    }
}
