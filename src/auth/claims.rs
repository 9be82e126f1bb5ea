use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which principal space a token was issued for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    Admin,
    Super,
}

/// JWT payload shared by both principal kinds.
///
/// `role` is present exactly when `kind` is `Admin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,       // account or admin id
    pub kind: PrincipalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<AdminRole>,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    /// The claim shape is consistent with its kind tag.
    pub fn shape_matches(&self) -> bool {
        match self.kind {
            PrincipalKind::User => self.role.is_none(),
            PrincipalKind::Admin => self.role.is_some(),
        }
    }
}
