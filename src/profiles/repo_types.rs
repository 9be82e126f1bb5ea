use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Engineer,
    Recruiter,
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileKind::Engineer => f.write_str("engineer"),
            ProfileKind::Recruiter => f.write_str("recruiter"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Engineer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub tagline: String,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub avatar: String,
    pub bio: String,
    pub search_status: String,
    pub role_type: Vec<String>,
    pub role_level: Vec<String>,
    pub website: Option<String>,
    pub github: String,
    pub twitter: Option<String>,
    #[serde(rename = "linkedIn")]
    pub linkedin: String,
    #[serde(rename = "stackOverflow")]
    pub stackoverflow: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// What a non-member sees of an engineer: no name, no contact links.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialEngineer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tagline: String,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub avatar: String,
    pub bio: String,
    pub search_status: String,
    pub role_type: Vec<String>,
    pub role_level: Vec<String>,
}

impl From<&Engineer> for PartialEngineer {
    fn from(e: &Engineer) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            tagline: e.tagline.clone(),
            city: e.city.clone(),
            state: e.state.clone(),
            country: e.country.clone(),
            avatar: e.avatar.clone(),
            bio: e.bio.clone(),
            search_status: e.search_status.clone(),
            role_type: e.role_type.clone(),
            role_level: e.role_level.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecruiterStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Error)]
#[error("unknown recruiter status {0:?}")]
pub struct UnknownStatus(pub String);

impl RecruiterStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecruiterStatus::Pending => "pending",
            RecruiterStatus::Approved => "approved",
            RecruiterStatus::Rejected => "rejected",
        }
    }
}

impl TryFrom<String> for RecruiterStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(RecruiterStatus::Pending),
            "approved" => Ok(RecruiterStatus::Approved),
            "rejected" => Ok(RecruiterStatus::Rejected),
            _ => Err(UnknownStatus(value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recruiter {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub role: String,
    pub logo: String,
    pub bio: String,
    #[serde(rename = "linkedIn")]
    pub linkedin: String,
    pub website: Option<String>,
    /// Approved for full directory access.
    pub is_member: bool,
    #[sqlx(try_from = "String")]
    pub status: RecruiterStatus,
    pub rejection_reason: Option<String>,
    pub approved_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub approval_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Partial update of an engineer; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct EngineerPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub tagline: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub search_status: Option<String>,
    pub role_type: Option<Vec<String>>,
    pub role_level: Option<Vec<String>>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub stackoverflow: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RecruiterPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub bio: Option<String>,
    pub logo: Option<String>,
    pub role: Option<String>,
    pub website: Option<String>,
}

/// Moderation outcome written by an admin.
#[derive(Debug, Clone)]
pub struct RecruiterDecision {
    pub status: RecruiterStatus,
    pub rejection_reason: Option<String>,
    pub decided_by: Uuid,
    pub decided_at: OffsetDateTime,
}

impl RecruiterDecision {
    pub fn is_member(&self) -> bool {
        self.status == RecruiterStatus::Approved
    }

    /// Approval columns are only set by an approval; any other decision clears them.
    pub fn approved_by(&self) -> Option<Uuid> {
        self.is_member().then_some(self.decided_by)
    }

    pub fn approval_date(&self) -> Option<OffsetDateTime> {
        self.is_member().then_some(self.decided_at)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineerFilter {
    pub country: Option<String>,
    pub search_status: Option<String>,
    pub role_level: Option<String>,
    pub role_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineerQuery {
    pub page: i64,
    pub limit: i64,
    pub filter: EngineerFilter,
}

impl Default for EngineerQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            filter: EngineerFilter::default(),
        }
    }
}

/// Row offset of a 1-based page, or `None` when it does not fit an `i64`.
pub fn page_offset(page: i64, limit: i64) -> Option<i64> {
    page.checked_sub(1)?.checked_mul(limit)
}

impl EngineerQuery {
    pub fn offset(&self) -> i64 {
        page_offset(self.page, self.limit).unwrap_or(i64::MAX)
    }
}
