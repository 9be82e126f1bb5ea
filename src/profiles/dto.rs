use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::profiles::repo_types::{EngineerPatch, PartialEngineer, Engineer, RecruiterPatch};

pub const SEARCH_STATUSES: &[&str] = &["actively_looking", "open", "not_interested", "invisible"];
pub const ROLE_TYPES: &[&str] = &[
    "contract_part_time",
    "contract_full_time",
    "employee_part_time",
    "employee_full_time",
];
pub const ROLE_LEVELS: &[&str] = &["junior", "mid_level", "senior", "principal_staff", "c_level"];

fn one_of(value: &str, allowed: &[&str]) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        return Ok(());
    }
    let mut err = ValidationError::new("one_of");
    err.message = Some(format!("must be one of {}", allowed.join(", ")).into());
    Err(err)
}

fn valid_search_status(value: &str) -> Result<(), ValidationError> {
    one_of(value, SEARCH_STATUSES)
}

fn role_types(values: &[String]) -> Result<(), ValidationError> {
    values.iter().try_for_each(|v| one_of(v, ROLE_TYPES))
}

fn role_levels(values: &[String]) -> Result<(), ValidationError> {
    values.iter().try_for_each(|v| one_of(v, ROLE_LEVELS))
}

fn alphabetic(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.chars().all(char::is_alphabetic) {
        return Ok(());
    }
    let mut err = ValidationError::new("alpha");
    err.message = Some("must contain letters only".into());
    Err(err)
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateEngineerRequest {
    #[validate(custom(function = "alphabetic"))]
    pub first_name: String,
    #[validate(custom(function = "alphabetic"))]
    pub last_name: String,
    #[validate(length(min = 1))]
    pub tagline: String,
    #[validate(length(min = 1))]
    pub city: String,
    pub state: Option<String>,
    #[validate(length(min = 1))]
    pub country: String,
    #[validate(length(min = 1))]
    pub avatar: String,
    #[validate(length(min = 1))]
    pub bio: String,
    #[validate(custom(function = "valid_search_status"))]
    pub search_status: String,
    #[validate(length(min = 1), custom(function = "role_types"))]
    pub role_type: Vec<String>,
    #[validate(length(min = 1), custom(function = "role_levels"))]
    pub role_level: Vec<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(url)]
    pub github: String,
    #[validate(url)]
    pub twitter: Option<String>,
    #[serde(rename = "linkedIn")]
    #[validate(url)]
    pub linkedin: String,
    #[serde(rename = "stackOverflow")]
    #[validate(url)]
    pub stackoverflow: Option<String>,
}

/// Every field optional; omitted fields keep their stored value.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateEngineerRequest {
    #[validate(custom(function = "alphabetic"))]
    pub first_name: Option<String>,
    #[validate(custom(function = "alphabetic"))]
    pub last_name: Option<String>,
    pub tagline: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    #[validate(custom(function = "valid_search_status"))]
    pub search_status: Option<String>,
    #[validate(custom(function = "role_types"))]
    pub role_type: Option<Vec<String>>,
    #[validate(custom(function = "role_levels"))]
    pub role_level: Option<Vec<String>>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(url)]
    pub twitter: Option<String>,
    #[serde(rename = "stackOverflow")]
    #[validate(url)]
    pub stackoverflow: Option<String>,
}

impl From<UpdateEngineerRequest> for EngineerPatch {
    fn from(r: UpdateEngineerRequest) -> Self {
        Self {
            first_name: r.first_name,
            last_name: r.last_name,
            tagline: r.tagline,
            city: r.city,
            state: r.state,
            country: r.country,
            avatar: r.avatar,
            bio: r.bio,
            search_status: r.search_status,
            role_type: r.role_type,
            role_level: r.role_level,
            website: r.website,
            twitter: r.twitter,
            stackoverflow: r.stackoverflow,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateRecruiterRequest {
    #[validate(custom(function = "alphabetic"))]
    pub first_name: String,
    #[validate(custom(function = "alphabetic"))]
    pub last_name: String,
    #[validate(length(min = 1))]
    pub company: String,
    #[validate(length(min = 1))]
    pub role: String,
    #[validate(length(min = 1))]
    pub logo: String,
    #[validate(length(min = 1))]
    pub bio: String,
    #[serde(rename = "linkedIn")]
    #[validate(url)]
    pub linkedin: String,
    #[validate(url)]
    pub website: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateRecruiterRequest {
    #[validate(custom(function = "alphabetic"))]
    pub first_name: Option<String>,
    #[validate(custom(function = "alphabetic"))]
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub bio: Option<String>,
    pub logo: Option<String>,
    pub role: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
}

impl From<UpdateRecruiterRequest> for RecruiterPatch {
    fn from(r: UpdateRecruiterRequest) -> Self {
        Self {
            first_name: r.first_name,
            last_name: r.last_name,
            company: r.company,
            bio: r.bio,
            logo: r.logo,
            role: r.role,
            website: r.website,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerCreated {
    pub engineer_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterCreated {
    pub recruiter_id: Uuid,
}

/// An engineer as a given viewer may see it.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum EngineerView {
    Full(Engineer),
    Partial(PartialEngineer),
}

impl EngineerView {
    pub fn for_viewer(engineer: Engineer, is_member: bool) -> Self {
        if is_member {
            EngineerView::Full(engineer)
        } else {
            EngineerView::Partial(PartialEngineer::from(&engineer))
        }
    }
}
