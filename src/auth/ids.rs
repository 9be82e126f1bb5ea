//! Deterministic identifiers.
//!
//! Account ids are derived from the normalized email and profile ids from the
//! owning account id, so an existence check is a primary-key lookup. Both use
//! UUIDv5 (SHA-1 name-based) under fixed namespaces; only determinism is
//! relied upon, the ids are not secrets.

use uuid::{uuid, Uuid};

const ACCOUNT_NAMESPACE: Uuid = uuid!("6f1c2b8e-3d4a-5b6c-8d7e-9f0a1b2c3d4e");
const PROFILE_NAMESPACE: Uuid = uuid!("0b7e4c1a-9d2f-5e3b-a6c8-1f2e3d4c5b6a");

/// Trims and lowercases an email so that casing never yields a second account.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn account_id(email: &str) -> Uuid {
    Uuid::new_v5(&ACCOUNT_NAMESPACE, normalize_email(email).as_bytes())
}

/// Engineer and recruiter profiles of the same account share this id, which is
/// what makes "one profile per account" checkable across both tables.
pub fn profile_id(user_id: Uuid) -> Uuid {
    Uuid::new_v5(&PROFILE_NAMESPACE, user_id.as_bytes())
}
