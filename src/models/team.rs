use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A member of the coaching team as shown on the public team page.
///
/// `version` belongs to the storage layer: it starts at 1 and every
/// successful update of the row bumps it by exactly one. Clients only ever
/// echo it back as the expected version of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TeamMember {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub image: Option<String>,
    pub description: String,
    #[sqlx(rename = "display_order")]
    pub order: i32,
    pub version: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeamMemberRequest {
    pub name: String,
    pub role: String,
    pub image: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Defaults to one past the current last position.
    pub order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTeamMemberRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub order: Option<i32>,
    /// When present the update only applies if the stored version matches.
    pub version: Option<i32>,
}

impl UpdateTeamMemberRequest {
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.role.is_some()
            || self.image.is_some()
            || self.description.is_some()
            || self.order.is_some()
    }

    /// Applies the present fields to `member`. The version is left alone.
    pub fn apply_to(&self, member: &mut TeamMember) {
        if let Some(name) = &self.name {
            member.name = name.trim().to_string();
        }
        if let Some(role) = &self.role {
            member.role = role.trim().to_string();
        }
        if let Some(image) = &self.image {
            member.image = normalize_image(Some(image.clone()));
        }
        if let Some(description) = &self.description {
            member.description = description.clone();
        }
        if let Some(order) = self.order {
            member.order = order;
        }
    }
}

/// A blank image URL means "no image", which is how an edit clears it.
pub fn normalize_image(image: Option<String>) -> Option<String> {
    image.filter(|url| !url.trim().is_empty())
}

/// One row of a drag-and-drop reorder: the new display position for `id`,
/// valid only while the row is still at `version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderEntry {
    pub id: i64,
    pub order: i32,
    pub version: i32,
}

/// Returns the ids that occur more than once in `entries`, in first-seen order.
pub fn find_duplicate_ids(entries: &[ReorderEntry]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(entries.len());
    let mut duplicates = Vec::new();
    for entry in entries {
        if !seen.insert(entry.id) && !duplicates.contains(&entry.id) {
            duplicates.push(entry.id);
        }
    }
    duplicates
}
