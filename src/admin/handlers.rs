use axum::{
    extract::{Path, RawQuery, State},
    Json,
};
use serde_json::{json, Value};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use url::form_urlencoded;
use uuid::Uuid;

use crate::{
    admin::dto::{
        AdminLoginRequest, AdminLoginResponse, CreateAdminRequest, RecruiterPage,
        RejectRecruiterRequest,
    },
    auth::{
        claims::AdminRole,
        extractors::AuthAdmin,
        password::{hash_password, verify_password},
        repo_types::Admin,
    },
    envelope::{parse_id, validate_payload, StrictJson},
    error::{ApiError, ApiResult, ErrorKind},
    notify::{dispatch, Event},
    profiles::repo_types::{page_offset, Recruiter, RecruiterDecision, RecruiterStatus},
    state::AppState,
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    StrictJson(payload): StrictJson<AdminLoginRequest>,
) -> ApiResult<Json<AdminLoginResponse>> {
    const MSG: &str = "failed to log in";
    validate_payload("admin.login", &payload)?;

    let invalid = || {
        ApiError::new(
            ErrorKind::InvalidCredentials,
            "admin.login.invalid_credentials",
            MSG,
            "invalid username or password",
        )
    };

    let admin = state
        .admins
        .find_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::upstream("admin.login.find_by_username", MSG, e))?
        .ok_or_else(|| {
            warn!(username = %payload.username, "admin login unknown username");
            invalid()
        })?;

    let ok = verify_password(&payload.password, &admin.password_hash)
        .map_err(|e| ApiError::upstream("admin.login.verify_password", MSG, e))?;
    if !ok {
        warn!(admin_id = %admin.id, "admin login invalid password");
        return Err(invalid());
    }

    let role = if admin.is_super {
        AdminRole::Super
    } else {
        AdminRole::Admin
    };
    let token = state
        .tokens
        .issue_admin(admin.id, role)
        .map_err(|e| ApiError::upstream("admin.login.issue_token", MSG, e))?;

    info!(admin_id = %admin.id, ?role, "admin logged in");
    Ok(Json(AdminLoginResponse { admin, token }))
}

pub async fn profile(auth: AuthAdmin) -> Json<Value> {
    Json(json!({ "admin": auth.admin }))
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RecruiterListQuery {
    status: Option<RecruiterStatus>,
    page: i64,
    limit: i64,
}

pub(crate) fn recruiter_query(raw: Option<&str>) -> Result<RecruiterListQuery, String> {
    let mut query = RecruiterListQuery {
        status: None,
        page: 1,
        limit: DEFAULT_PAGE_SIZE,
    };
    for (key, value) in form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            "status" => {
                query.status = Some(
                    RecruiterStatus::try_from(value.into_owned()).map_err(|e| e.to_string())?,
                );
            }
            "page" => {
                query.page = value
                    .parse()
                    .ok()
                    .filter(|p| *p >= 1)
                    .ok_or_else(|| format!("invalid page {value:?}"))?;
            }
            "limit" => {
                query.limit = value
                    .parse()
                    .ok()
                    .filter(|l| (1..=MAX_PAGE_SIZE).contains(l))
                    .ok_or_else(|| format!("limit must be between 1 and {MAX_PAGE_SIZE}"))?;
            }
            _ => {}
        }
    }
    if page_offset(query.page, query.limit).is_none() {
        return Err(format!("page {} is out of range", query.page));
    }
    Ok(query)
}

async fn recruiter_page(
    state: &AppState,
    query: RecruiterListQuery,
    scope: &str,
) -> ApiResult<Json<RecruiterPage<Recruiter>>> {
    let (recruiters, total) = state
        .profiles
        .list_recruiters(query.status, query.page, query.limit)
        .await
        .map_err(|e| {
            ApiError::upstream(&format!("{scope}.read_recruiters"), "failed to list recruiters", e)
        })?;
    Ok(Json(RecruiterPage {
        recruiters,
        total,
        page: query.page,
        limit: query.limit,
    }))
}

#[instrument(skip(state, _auth, raw_query))]
pub async fn list_recruiters(
    State(state): State<AppState>,
    _auth: AuthAdmin,
    RawQuery(raw_query): RawQuery,
) -> ApiResult<Json<RecruiterPage<Recruiter>>> {
    let query = recruiter_query(raw_query.as_deref()).map_err(|detail| {
        ApiError::validation("admin.recruiters.query_params", "failed to list recruiters", detail)
    })?;
    recruiter_page(&state, query, "admin.recruiters").await
}

#[instrument(skip(state, _auth))]
pub async fn pending_recruiters(
    State(state): State<AppState>,
    _auth: AuthAdmin,
) -> ApiResult<Json<RecruiterPage<Recruiter>>> {
    let query = RecruiterListQuery {
        status: Some(RecruiterStatus::Pending),
        page: 1,
        limit: MAX_PAGE_SIZE,
    };
    recruiter_page(&state, query, "admin.recruiters.pending").await
}

async fn decide(
    state: &AppState,
    auth: &AuthAdmin,
    raw_id: &str,
    status: RecruiterStatus,
    rejection_reason: Option<String>,
    scope: &str,
) -> ApiResult<(Recruiter, RecruiterStatus)> {
    const MSG: &str = "failed to update recruiter status";
    let id = parse_id(scope, raw_id)?;

    let previous = state
        .profiles
        .find_recruiter(id)
        .await
        .map_err(|e| ApiError::upstream(&format!("{scope}.find_recruiter"), MSG, e))?
        .ok_or_else(|| ApiError::not_found(&format!("{scope}.not_found"), MSG, "recruiter not found"))?
        .status;

    let decision = RecruiterDecision {
        status,
        rejection_reason,
        decided_by: auth.admin.id,
        decided_at: OffsetDateTime::now_utc(),
    };
    let recruiter = state
        .profiles
        .decide_recruiter(id, &decision)
        .await
        .map_err(|e| ApiError::upstream(&format!("{scope}.update_failed"), MSG, e))?
        .ok_or_else(|| ApiError::not_found(&format!("{scope}.not_found"), MSG, "recruiter not found"))?;

    info!(
        recruiter_id = %id,
        admin_id = %auth.admin.id,
        status = status.as_str(),
        "recruiter status updated"
    );
    Ok((recruiter, previous))
}

#[instrument(skip(state, auth))]
pub async fn approve_recruiter(
    State(state): State<AppState>,
    auth: AuthAdmin,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Recruiter>> {
    let (recruiter, previous) = decide(
        &state,
        &auth,
        &raw_id,
        RecruiterStatus::Approved,
        None,
        "recruiter.approve",
    )
    .await?;

    if previous != RecruiterStatus::Approved {
        // The approval already happened; a missing email only skips the notice.
        match state.accounts.find_by_id(recruiter.user_id).await {
            Ok(Some(account)) => dispatch(
                state.notifier.clone(),
                Event::RecruiterApproved {
                    recruiter_id: recruiter.id,
                    name: format!("{} {}", recruiter.first_name, recruiter.last_name),
                    company: recruiter.company.clone(),
                    email: account.email,
                },
            ),
            Ok(None) => warn!(recruiter_id = %recruiter.id, "approved recruiter has no account"),
            Err(e) => warn!(recruiter_id = %recruiter.id, error = %e, "account lookup for approval notice failed"),
        }
    }
    Ok(Json(recruiter))
}

#[instrument(skip(state, auth, payload))]
pub async fn reject_recruiter(
    State(state): State<AppState>,
    auth: AuthAdmin,
    Path(raw_id): Path<String>,
    StrictJson(payload): StrictJson<RejectRecruiterRequest>,
) -> ApiResult<Json<Recruiter>> {
    validate_payload("recruiter.reject", &payload)?;
    let (recruiter, _) = decide(
        &state,
        &auth,
        &raw_id,
        RecruiterStatus::Rejected,
        Some(payload.reason),
        "recruiter.reject",
    )
    .await?;
    Ok(Json(recruiter))
}

#[instrument(skip(state, auth))]
pub async fn verify_user(
    State(state): State<AppState>,
    auth: AuthAdmin,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Value>> {
    const MSG: &str = "failed to verify user";
    let id = parse_id("user.manual_verify", &raw_id)?;

    let mut account = state
        .accounts
        .find_by_id(id)
        .await
        .map_err(|e| ApiError::upstream("user.manual_verify.find_by_id", MSG, e))?
        .ok_or_else(|| ApiError::not_found("user.manual_verify.not_found", MSG, "user not found"))?;

    if !account.verified {
        state
            .accounts
            .mark_verified(id)
            .await
            .map_err(|e| ApiError::upstream("user.manual_verify.mark_verified", MSG, e))?;
        account.verified = true;
    }

    info!(user_id = %id, admin_id = %auth.admin.id, "user verified by admin");
    Ok(Json(json!({ "user": account })))
}

#[instrument(skip(state, auth, payload))]
pub async fn create_admin(
    State(state): State<AppState>,
    auth: AuthAdmin,
    StrictJson(payload): StrictJson<CreateAdminRequest>,
) -> ApiResult<Json<Value>> {
    const MSG: &str = "failed to create admin";
    auth.require_super()?;
    validate_payload("admin.create", &payload)?;

    let taken = state
        .admins
        .find_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::upstream("admin.create.find_by_username", MSG, e))?;
    if taken.is_some() {
        return Err(ApiError::conflict(
            "admin.create.already_created",
            MSG,
            "username already taken",
        ));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|e| ApiError::upstream("admin.create.hash_password", MSG, e))?;
    let now = OffsetDateTime::now_utc();
    let admin = Admin {
        id: Uuid::new_v4(),
        username: payload.username,
        password_hash,
        email: payload.email.trim().to_lowercase(),
        first_name: payload.first_name,
        last_name: payload.last_name,
        is_super: payload.is_super,
        created_at: now,
        updated_at: now,
    };
    let created = state
        .admins
        .insert(&admin)
        .await
        .map_err(|e| ApiError::upstream("admin.create.insert", MSG, e))?;
    if !created {
        return Err(ApiError::conflict(
            "admin.create.already_created",
            MSG,
            "username already taken",
        ));
    }

    info!(admin_id = %admin.id, created_by = %auth.admin.id, "admin created");
    Ok(Json(json!({ "admin": admin })))
}

#[instrument(skip(state, auth))]
pub async fn list_admins(State(state): State<AppState>, auth: AuthAdmin) -> ApiResult<Json<Value>> {
    auth.require_super()?;
    let admins = state
        .admins
        .list()
        .await
        .map_err(|e| ApiError::upstream("admin.list.read_admins", "failed to list admins", e))?;
    Ok(Json(json!({ "admins": admins })))
}

#[instrument(skip(state, auth))]
pub async fn delete_admin(
    State(state): State<AppState>,
    auth: AuthAdmin,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Value>> {
    const MSG: &str = "failed to delete admin";
    auth.require_super()?;
    let id = parse_id("admin.delete", &raw_id)?;

    if id == auth.admin.id {
        return Err(ApiError::forbidden(
            "admin.delete.self",
            MSG,
            "an admin cannot delete itself",
        ));
    }

    let removed = state
        .admins
        .delete(id)
        .await
        .map_err(|e| ApiError::upstream("admin.delete.delete", MSG, e))?;
    if !removed {
        return Err(ApiError::not_found("admin.delete.not_found", MSG, "admin not found"));
    }

    info!(admin_id = %id, deleted_by = %auth.admin.id, "admin deleted");
    Ok(Json(json!({ "deleted": id })))
}
