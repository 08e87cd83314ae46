mod admin;
mod enrollment;
mod team;

use serde::Serialize;

pub use admin::{AdminAccount, LoginRequest, NewAdminAccount, SessionInfo};
pub use enrollment::{
    CreateEnrollmentRequest, Enrollment, EnrollmentStatus, Gender, ListEnrollmentsQuery,
    UpdateEnrollmentStatusRequest,
};
pub use team::{
    CreateTeamMemberRequest, ReorderEntry, TeamMember, UpdateTeamMemberRequest,
    find_duplicate_ids, normalize_image,
};

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiMessage {
    pub message: String,
}
