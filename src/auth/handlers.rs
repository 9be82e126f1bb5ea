use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use rand::Rng;
use serde_json::{json, Value};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::{
    auth::{
        dto::{
            CountResponse, HealthResponse, LoginRequest, LoginResponse, SignUpRequest,
            SignUpResponse,
        },
        extractors::AuthUser,
        ids::{account_id, normalize_email},
        password::{hash_password, verify_password},
        repo_types::Account,
    },
    envelope::{respond, validate_payload, StrictJson},
    error::{ApiError, ApiResult, ErrorKind},
    notify::{dispatch, Event},
    state::AppState,
};

const VERIFICATION_CODE_BOUND: i32 = 10_000_000;

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    StrictJson(mut payload): StrictJson<SignUpRequest>,
) -> ApiResult<Json<SignUpResponse>> {
    const MSG: &str = "failed to sign up";
    payload.email = normalize_email(&payload.email);
    validate_payload("user.sign_up", &payload)?;

    let existing = state
        .accounts
        .count_by_email(&payload.email)
        .await
        .map_err(|e| ApiError::upstream("user.sign_up.count_by_email", MSG, e))?;
    if existing > 0 {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::conflict(
            "user.sign_up.already_created",
            MSG,
            "already created",
        ));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|e| ApiError::upstream("user.sign_up.hash_password", MSG, e))?;

    let account = Account {
        id: account_id(&payload.email),
        email: payload.email,
        password_hash,
        verified: false,
        verification_code: rand::thread_rng().gen_range(0..VERIFICATION_CODE_BOUND),
        created_at: OffsetDateTime::now_utc(),
    };
    let created = state
        .accounts
        .insert(&account)
        .await
        .map_err(|e| ApiError::upstream("user.sign_up.insert", MSG, e))?;
    if !created {
        warn!(email = %account.email, "email registered concurrently");
        return Err(ApiError::conflict(
            "user.sign_up.already_created",
            MSG,
            "already created",
        ));
    }

    let verify_url = format!(
        "{}/verify/{}/{}",
        state.config.public_base_url.trim_end_matches('/'),
        account.id,
        account.verification_code
    );
    dispatch(
        state.notifier.clone(),
        Event::UserSignedUp {
            user_id: account.id,
            email: account.email.clone(),
            verify_url,
        },
    );

    info!(user_id = %account.id, "user signed up");
    Ok(Json(SignUpResponse {
        user_id: account.id,
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    StrictJson(mut payload): StrictJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    const MSG: &str = "failed to log in";
    payload.email = normalize_email(&payload.email);
    validate_payload("user.login", &payload)?;

    let invalid = || {
        ApiError::new(
            ErrorKind::InvalidCredentials,
            "user.login.invalid_credentials",
            MSG,
            "invalid email or password",
        )
    };

    let account = state
        .accounts
        .find_by_email(&payload.email)
        .await
        .map_err(|e| ApiError::upstream("user.login.find_by_email", MSG, e))?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            invalid()
        })?;

    let ok = verify_password(&payload.password, &account.password_hash)
        .map_err(|e| ApiError::upstream("user.login.verify_password", MSG, e))?;
    if !ok {
        warn!(user_id = %account.id, "login invalid password");
        return Err(invalid());
    }

    if !account.verified {
        return Err(ApiError::forbidden(
            "user.login.not_verified",
            MSG,
            "email address not verified",
        ));
    }

    let auth_token = state
        .tokens
        .issue_user(account.id)
        .map_err(|e| ApiError::upstream("user.login.issue_token", MSG, e))?;

    info!(user_id = %account.id, "user logged in");
    Ok(Json(LoginResponse { auth_token }))
}

fn frontend_redirect(base: &str, page: &str, message: Option<&str>) -> Result<Redirect, url::ParseError> {
    let mut url = Url::parse(&format!("{}/{page}", base.trim_end_matches('/')))?;
    if let Some(message) = message {
        url.query_pairs_mut().append_pair("message", message);
    }
    Ok(Redirect::to(url.as_str()))
}

/// Confirms an email address from the emailed link and sends the browser back
/// to the frontend. Outcomes are reported through the redirect target.
#[instrument(skip_all)]
pub async fn verify_email(
    State(state): State<AppState>,
    Path((user_id, code)): Path<(String, String)>,
) -> Response {
    let outcome = verify_outcome(&state, &user_id, &code).await;
    let base = &state.config.frontend_url;
    let redirect = match outcome {
        Ok(()) => frontend_redirect(base, "verification-success", None),
        Err(message) => frontend_redirect(base, "verification-error", Some(message)),
    };

    match redirect {
        Ok(r) => r.into_response(),
        Err(e) => ApiError::upstream(
            "user.verify.redirect",
            "failed to verify email",
            anyhow::anyhow!("bad FRONTEND_URL {base:?}: {e}"),
        )
        .into_response(),
    }
}

async fn verify_outcome(state: &AppState, user_id: &str, code: &str) -> Result<(), &'static str> {
    let user_id = uuid::Uuid::parse_str(user_id).map_err(|_| "invalid verification link")?;
    let code: i32 = code.parse().map_err(|_| "invalid verification link")?;

    let account = match state.accounts.find_by_id(user_id).await {
        Ok(Some(a)) => a,
        Ok(None) => return Err("user not found"),
        Err(e) => {
            error!(error = %e, %user_id, "verify lookup failed");
            return Err("verification failed, please try again later");
        }
    };

    if account.verified {
        return Ok(());
    }
    if account.verification_code != code {
        warn!(%user_id, "wrong verification code");
        return Err("invalid verification code");
    }

    if let Err(e) = state.accounts.mark_verified(user_id).await {
        error!(error = %e, %user_id, "mark_verified failed");
        return Err("verification failed, please try again later");
    }
    info!(%user_id, "email verified");
    Ok(())
}

#[instrument(skip(state))]
pub async fn me(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> ApiResult<Json<Value>> {
    const MSG: &str = "failed to read current user";

    if let Some(engineer) = state
        .profiles
        .find_engineer_by_owner(user_id)
        .await
        .map_err(|e| ApiError::upstream("user.me.find_engineer", MSG, e))?
    {
        return Ok(Json(json!({ "type": "engineer", "user": engineer })));
    }

    if let Some(recruiter) = state
        .profiles
        .find_recruiter_by_owner(user_id)
        .await
        .map_err(|e| ApiError::upstream("user.me.find_recruiter", MSG, e))?
    {
        return Ok(Json(json!({ "type": "recruiter", "user": recruiter })));
    }

    Err(ApiError::not_found(
        "user.me.not_found",
        MSG,
        "no profile for this account",
    ))
}

pub async fn count(State(state): State<AppState>) -> ApiResult<Json<CountResponse>> {
    let engineers_count = state.profiles.count_engineers().await.map_err(|e| {
        ApiError::upstream("engineer.count", "failed to count engineers", e)
    })?;
    Ok(Json(CountResponse { engineers_count }))
}

pub async fn health(State(state): State<AppState>) -> Response {
    respond(
        StatusCode::OK,
        HealthResponse {
            status: "ok",
            uptime_secs: state.started_at.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}
