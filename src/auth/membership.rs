//! Membership resolution for public directory reads.
//!
//! Unlike the auth gates this never rejects a caller over credentials: a
//! missing, malformed, expired or forged token simply yields an anonymous,
//! non-member session. Only a failing profile lookup is an error.

use axum::http::HeaderMap;
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::{claims::PrincipalKind, extractors::bearer_token, jwt::TokenCodec},
    profiles::repo::ProfileStore,
};

/// Session of a membership-gated request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Membership {
    pub actor_id: Option<Uuid>,
    pub is_member: bool,
}

impl Membership {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

pub async fn resolve(
    tokens: &TokenCodec,
    profiles: &dyn ProfileStore,
    headers: &HeaderMap,
) -> anyhow::Result<Membership> {
    let token = match bearer_token(headers) {
        Ok(t) => t,
        Err(reason) => {
            debug!(%reason, "no usable bearer token; anonymous access");
            return Ok(Membership::anonymous());
        }
    };

    let claims = match tokens.verify(token, PrincipalKind::User) {
        Ok(c) => c,
        Err(reason) => {
            debug!(%reason, "token refused; anonymous access");
            return Ok(Membership::anonymous());
        }
    };

    // Engineers have no recruiter row and are therefore never members.
    let is_member = profiles
        .find_recruiter_by_owner(claims.sub)
        .await?
        .map(|r| r.is_member)
        .unwrap_or(false);

    Ok(Membership {
        actor_id: Some(claims.sub),
        is_member,
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{header::AUTHORIZATION, HeaderValue};
    use time::{Duration, OffsetDateTime};

    use super::*;
    use crate::testing::{sample_engineer, sample_recruiter, test_config, MemoryStore};

    fn codec() -> TokenCodec {
        TokenCodec::new(&test_config().jwt)
    }

    fn with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[tokio::test]
    async fn missing_header_is_anonymous() {
        let store = MemoryStore::default();
        let m = resolve(&codec(), &store, &HeaderMap::new()).await.unwrap();
        assert_eq!(m, Membership::anonymous());
    }

    #[tokio::test]
    async fn malformed_and_expired_tokens_degrade_to_anonymous() {
        let store = MemoryStore::default();
        let codec = codec();
        let expired = codec
            .issue_at(
                Uuid::new_v4(),
                PrincipalKind::User,
                None,
                OffsetDateTime::now_utc() - Duration::hours(3),
            )
            .unwrap();

        for header in [
            "Bearer not-a-token".to_string(),
            "Basic dXNlcjpwYXNz".to_string(),
            "Bearer ".to_string(),
            format!("Bearer {expired}"),
        ] {
            let m = resolve(&codec, &store, &with_auth(&header)).await.unwrap();
            assert_eq!(m, Membership::anonymous(), "header {header:?}");
        }
    }

    #[tokio::test]
    async fn admin_token_is_not_a_user_session() {
        let store = MemoryStore::default();
        let codec = codec();
        let token = codec
            .issue_admin(Uuid::new_v4(), crate::auth::claims::AdminRole::Super)
            .unwrap();
        let m = resolve(&codec, &store, &with_auth(&format!("Bearer {token}")))
            .await
            .unwrap();
        assert_eq!(m, Membership::anonymous());
    }

    #[tokio::test]
    async fn approved_recruiter_is_member() {
        let store = MemoryStore::default();
        let codec = codec();
        let user = Uuid::new_v4();
        let mut recruiter = sample_recruiter(user);
        recruiter.is_member = true;
        store.put_recruiter(recruiter);

        let token = codec.issue_user(user).unwrap();
        let m = resolve(&codec, &store, &with_auth(&format!("Bearer {token}")))
            .await
            .unwrap();
        assert_eq!(
            m,
            Membership {
                actor_id: Some(user),
                is_member: true
            }
        );
    }

    #[tokio::test]
    async fn pending_recruiter_and_engineer_are_not_members() {
        let store = MemoryStore::default();
        let codec = codec();
        let (recruiter_user, engineer_user) = (Uuid::new_v4(), Uuid::new_v4());
        store.put_recruiter(sample_recruiter(recruiter_user));
        store.put_engineer(sample_engineer(engineer_user));

        for user in [recruiter_user, engineer_user] {
            let token = codec.issue_user(user).unwrap();
            let m = resolve(&codec, &store, &with_auth(&format!("Bearer {token}")))
                .await
                .unwrap();
            assert_eq!(m.actor_id, Some(user));
            assert!(!m.is_member);
        }
    }

    #[tokio::test]
    async fn store_fault_is_the_only_error() {
        let store = MemoryStore::default();
        store.set_failing(true);
        let codec = codec();

        // anonymous paths never touch the store
        assert!(resolve(&codec, &store, &HeaderMap::new()).await.is_ok());

        let token = codec.issue_user(Uuid::new_v4()).unwrap();
        assert!(resolve(&codec, &store, &with_auth(&format!("Bearer {token}")))
            .await
            .is_err());
    }
}
