use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "enrollment_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "gender", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

/// An application to join a sports class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: i64,
    pub class_id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub age: i32,
    pub gender: Gender,
    pub experience: String,
    pub message: Option<String>,
    pub medical_conditions: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub status: EnrollmentStatus,
    pub enrollment_date: DateTime<Utc>,
    pub approval_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Enrollment {
    /// Moves the application to `status`. Approval stamps `approval_date`;
    /// any other status keeps whatever stamp was there.
    pub fn transition(&mut self, status: EnrollmentStatus, now: DateTime<Utc>) {
        self.status = status;
        if status == EnrollmentStatus::Approved {
            self.approval_date = Some(now);
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEnrollmentRequest {
    pub class_id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub age: i32,
    pub gender: Gender,
    pub experience: String,
    pub message: Option<String>,
    pub medical_conditions: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEnrollmentStatusRequest {
    pub status: EnrollmentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEnrollmentsQuery {
    pub class_id: Option<i64>,
}
