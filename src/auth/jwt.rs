use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::claims::{AdminRole, Claims, PrincipalKind},
    config::JwtConfig,
};

/// Why a token was refused. Every variant is a 401 with the same body; the
/// variant only shows up in server logs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed token")]
    MalformedToken,
    #[error("bad token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token issued for another principal kind")]
    WrongPrincipalKind,
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            JwtErrorKind::ExpiredSignature => AuthError::Expired,
            JwtErrorKind::InvalidSignature => AuthError::BadSignature,
            _ => AuthError::MalformedToken,
        }
    }
}

/// Signs and verifies identity tokens for users and admins with one HS256 secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    user_ttl: Duration,
    admin_ttl: Duration,
}

impl TokenCodec {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            user_ttl: Duration::from_secs((cfg.user_ttl_minutes as u64) * 60),
            admin_ttl: Duration::from_secs((cfg.admin_ttl_minutes as u64) * 60),
        }
    }

    fn ttl(&self, kind: PrincipalKind) -> Duration {
        match kind {
            PrincipalKind::User => self.user_ttl,
            PrincipalKind::Admin => self.admin_ttl,
        }
    }

    /// Issues a token as of `now`. `role` must be given for admins and omitted for users.
    pub fn issue_at(
        &self,
        subject: Uuid,
        kind: PrincipalKind,
        role: Option<AdminRole>,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let claims = Claims {
            sub: subject,
            kind,
            role,
            iat: now.unix_timestamp(),
            exp: (now + TimeDuration::seconds(self.ttl(kind).as_secs() as i64)).unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        anyhow::ensure!(claims.shape_matches(), "role given for the wrong principal kind");

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(subject = %subject, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn issue_user(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_at(user_id, PrincipalKind::User, None, OffsetDateTime::now_utc())
    }

    pub fn issue_admin(&self, admin_id: Uuid, role: AdminRole) -> anyhow::Result<String> {
        self.issue_at(admin_id, PrincipalKind::Admin, Some(role), OffsetDateTime::now_utc())
    }

    /// Verifies `token` for the `expected` principal kind as of `now`.
    ///
    /// Expiry is rechecked against `now` after the library validation so that a
    /// caller-supplied clock is authoritative.
    pub fn verify_at(
        &self,
        token: &str,
        expected: PrincipalKind,
        now: OffsetDateTime,
    ) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let claims = decode::<Claims>(token, &self.decoding, &validation)?.claims;

        if now.unix_timestamp() > claims.exp {
            return Err(AuthError::Expired);
        }
        if claims.kind != expected || !claims.shape_matches() {
            return Err(AuthError::WrongPrincipalKind);
        }

        debug!(subject = %claims.sub, kind = ?claims.kind, "jwt verified");
        Ok(claims)
    }

    pub fn verify(&self, token: &str, expected: PrincipalKind) -> Result<Claims, AuthError> {
        self.verify_at(token, expected, OffsetDateTime::now_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_codec(secret: &str, issuer: &str, audience: &str) -> TokenCodec {
        TokenCodec::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            user_ttl_minutes: 60,
            admin_ttl_minutes: 60 * 24,
        })
    }

    fn codec() -> TokenCodec {
        make_codec("dev-secret", "test-issuer", "test-aud")
    }

    #[test]
    fn user_token_roundtrip() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let token = codec.issue_user(user_id).expect("issue user");
        let claims = codec.verify(&token, PrincipalKind::User).expect("verify user");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.kind, PrincipalKind::User);
        assert_eq!(claims.role, None);
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn admin_token_roundtrip_keeps_role() {
        let codec = codec();
        let admin_id = Uuid::new_v4();
        let token = codec.issue_admin(admin_id, AdminRole::Super).expect("issue admin");
        let claims = codec.verify(&token, PrincipalKind::Admin).expect("verify admin");
        assert_eq!(claims.sub, admin_id);
        assert_eq!(claims.role, Some(AdminRole::Super));
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn user_token_rejected_by_admin_verifier_and_back() {
        let codec = codec();
        let user_token = codec.issue_user(Uuid::new_v4()).unwrap();
        let admin_token = codec.issue_admin(Uuid::new_v4(), AdminRole::Admin).unwrap();

        assert_eq!(
            codec.verify(&user_token, PrincipalKind::Admin).unwrap_err(),
            AuthError::WrongPrincipalKind
        );
        assert_eq!(
            codec.verify(&admin_token, PrincipalKind::User).unwrap_err(),
            AuthError::WrongPrincipalKind
        );
    }

    #[test]
    fn verify_fails_once_clock_passes_expiry() {
        let codec = codec();
        let now = OffsetDateTime::now_utc();
        let token = codec.issue_at(Uuid::new_v4(), PrincipalKind::User, None, now).unwrap();

        assert!(codec
            .verify_at(&token, PrincipalKind::User, now + TimeDuration::minutes(59))
            .is_ok());
        assert_eq!(
            codec
                .verify_at(&token, PrincipalKind::User, now + TimeDuration::minutes(61))
                .unwrap_err(),
            AuthError::Expired
        );
    }

    #[test]
    fn token_issued_in_the_past_is_expired() {
        let codec = codec();
        let issued = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let token = codec.issue_at(Uuid::new_v4(), PrincipalKind::User, None, issued).unwrap();
        assert_eq!(
            codec.verify(&token, PrincipalKind::User).unwrap_err(),
            AuthError::Expired
        );
    }

    #[test]
    fn foreign_secret_is_bad_signature() {
        let token = make_codec("other-secret", "test-issuer", "test-aud")
            .issue_user(Uuid::new_v4())
            .unwrap();
        assert_eq!(
            codec().verify(&token, PrincipalKind::User).unwrap_err(),
            AuthError::BadSignature
        );
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            codec().verify("not.a.jwt", PrincipalKind::User).unwrap_err(),
            AuthError::MalformedToken
        );
        assert_eq!(
            codec().verify("", PrincipalKind::User).unwrap_err(),
            AuthError::MalformedToken
        );
    }

    #[test]
    fn wrong_issuer_or_audience_is_rejected() {
        let token = make_codec("dev-secret", "good-iss", "good-aud")
            .issue_user(Uuid::new_v4())
            .unwrap();
        let bad = make_codec("dev-secret", "bad-iss", "bad-aud");
        assert!(bad.verify(&token, PrincipalKind::User).is_err());
    }

    #[test]
    fn role_for_user_is_refused_at_issue() {
        let err = codec()
            .issue_at(
                Uuid::new_v4(),
                PrincipalKind::User,
                Some(AdminRole::Admin),
                OffsetDateTime::now_utc(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("wrong principal kind"));
    }
}
