use axum::{
    extract::{Path, RawQuery, State},
    Json,
};
use serde_json::{json, Value};
use time::OffsetDateTime;
use tracing::{info, instrument};
use url::form_urlencoded;
use uuid::Uuid;

use crate::{
    auth::{
        extractors::AuthUser,
        ids::profile_id,
        membership::Membership,
        ownership::assert_owner,
    },
    envelope::{parse_id, validate_payload, StrictJson},
    error::{ApiError, ApiResult},
    notify::{dispatch, Event},
    profiles::{
        dto::{
            CreateEngineerRequest, CreateRecruiterRequest, EngineerCreated, EngineerView,
            RecruiterCreated, UpdateEngineerRequest, UpdateRecruiterRequest,
        },
        repo_types::{
            page_offset, Engineer, EngineerPatch, EngineerQuery, ProfileKind, Recruiter,
            RecruiterPatch, RecruiterStatus,
        },
    },
    state::AppState,
};

const MAX_PAGE_SIZE: i64 = 100;

/// Rejects a second profile of either kind for the same account.
async fn ensure_no_profile(state: &AppState, id: Uuid, scope: &str, message: &str) -> ApiResult<()> {
    let existing = state
        .profiles
        .profile_exists(id)
        .await
        .map_err(|e| ApiError::upstream(&format!("{scope}.profile_exists"), message, e))?;
    match existing {
        Some(kind) => Err(ApiError::conflict(
            &format!("{scope}.already_created"),
            message,
            format!("{kind} profile already created"),
        )),
        None => Ok(()),
    }
}

#[instrument(skip(state, payload))]
pub async fn create_engineer(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    StrictJson(payload): StrictJson<CreateEngineerRequest>,
) -> ApiResult<Json<EngineerCreated>> {
    const MSG: &str = "failed to create new engineer";
    validate_payload("engineer.create", &payload)?;

    let id = profile_id(user_id);
    ensure_no_profile(&state, id, "engineer.create", MSG).await?;

    let engineer = Engineer {
        id,
        user_id,
        first_name: payload.first_name,
        last_name: payload.last_name,
        tagline: payload.tagline,
        city: payload.city,
        state: payload.state,
        country: payload.country,
        avatar: payload.avatar,
        bio: payload.bio,
        search_status: payload.search_status,
        role_type: payload.role_type,
        role_level: payload.role_level,
        website: payload.website,
        github: payload.github,
        twitter: payload.twitter,
        linkedin: payload.linkedin,
        stackoverflow: payload.stackoverflow,
        created_at: OffsetDateTime::now_utc(),
    };
    let created = state
        .profiles
        .insert_engineer(&engineer)
        .await
        .map_err(|e| ApiError::upstream("engineer.create.insert", MSG, e))?;
    if !created {
        return Err(ApiError::conflict(
            "engineer.create.already_created",
            MSG,
            "engineer profile already created",
        ));
    }

    dispatch(
        state.notifier.clone(),
        Event::EngineerCreated {
            engineer_id: id,
            user_id,
        },
    );
    info!(engineer_id = %id, %user_id, "engineer created");
    Ok(Json(EngineerCreated { engineer_id: id }))
}

#[instrument(skip(state, payload))]
pub async fn create_recruiter(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    StrictJson(payload): StrictJson<CreateRecruiterRequest>,
) -> ApiResult<Json<RecruiterCreated>> {
    const MSG: &str = "failed to create new recruiter";
    validate_payload("recruiter.create", &payload)?;

    let id = profile_id(user_id);
    ensure_no_profile(&state, id, "recruiter.create", MSG).await?;

    let recruiter = Recruiter {
        id,
        user_id,
        first_name: payload.first_name,
        last_name: payload.last_name,
        company: payload.company,
        role: payload.role,
        logo: payload.logo,
        bio: payload.bio,
        linkedin: payload.linkedin,
        website: payload.website,
        is_member: false,
        status: RecruiterStatus::Pending,
        rejection_reason: None,
        approved_by: None,
        approval_date: None,
        created_at: OffsetDateTime::now_utc(),
    };
    let created = state
        .profiles
        .insert_recruiter(&recruiter)
        .await
        .map_err(|e| ApiError::upstream("recruiter.create.insert", MSG, e))?;
    if !created {
        return Err(ApiError::conflict(
            "recruiter.create.already_created",
            MSG,
            "recruiter profile already created",
        ));
    }

    dispatch(
        state.notifier.clone(),
        Event::RecruiterCreated {
            recruiter_id: id,
            company: recruiter.company.clone(),
        },
    );
    info!(recruiter_id = %id, %user_id, "recruiter created");
    Ok(Json(RecruiterCreated { recruiter_id: id }))
}

async fn apply_engineer_patch(
    state: &AppState,
    id: Uuid,
    patch: EngineerPatch,
    scope: &str,
) -> ApiResult<Json<Value>> {
    const MSG: &str = "failed to update engineer";
    let engineer = state
        .profiles
        .update_engineer(id, &patch)
        .await
        .map_err(|e| ApiError::upstream(&format!("{scope}.update_table"), MSG, e))?
        .ok_or_else(|| ApiError::not_found(&format!("{scope}.not_found"), MSG, "engineer not found"))?;
    info!(engineer_id = %id, "engineer updated");
    Ok(Json(json!({ "engineer": engineer })))
}

async fn apply_recruiter_patch(
    state: &AppState,
    id: Uuid,
    patch: RecruiterPatch,
    scope: &str,
) -> ApiResult<Json<Value>> {
    const MSG: &str = "failed to update recruiter";
    let recruiter = state
        .profiles
        .update_recruiter(id, &patch)
        .await
        .map_err(|e| ApiError::upstream(&format!("{scope}.update_table"), MSG, e))?
        .ok_or_else(|| {
            ApiError::not_found(&format!("{scope}.not_found"), MSG, "recruiter not found")
        })?;
    info!(recruiter_id = %id, "recruiter updated");
    Ok(Json(json!({ "recruiter": recruiter })))
}

#[instrument(skip(state, payload))]
pub async fn update_own_engineer(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    StrictJson(payload): StrictJson<UpdateEngineerRequest>,
) -> ApiResult<Json<Value>> {
    const SCOPE: &str = "authenticated_engineer.update";
    validate_payload(SCOPE, &payload)?;

    let engineer = state
        .profiles
        .find_engineer_by_owner(user_id)
        .await
        .map_err(|e| ApiError::upstream(&format!("{SCOPE}.find_by_owner"), "failed to update engineer", e))?
        .ok_or_else(|| {
            ApiError::not_found(&format!("{SCOPE}.not_found"), "failed to update engineer", "engineer not found")
        })?;

    apply_engineer_patch(&state, engineer.id, payload.into(), SCOPE).await
}

#[instrument(skip(state, payload))]
pub async fn update_engineer(
    State(state): State<AppState>,
    AuthUser(actor_id): AuthUser,
    Path(raw_id): Path<String>,
    StrictJson(payload): StrictJson<UpdateEngineerRequest>,
) -> ApiResult<Json<Value>> {
    const SCOPE: &str = "engineer.update";
    let id = parse_id(SCOPE, &raw_id)?;
    validate_payload(SCOPE, &payload)?;

    assert_owner(state.profiles.as_ref(), actor_id, id, ProfileKind::Engineer)
        .await
        .map_err(|e| e.into_api(SCOPE, "failed to update engineer"))?;

    apply_engineer_patch(&state, id, payload.into(), SCOPE).await
}

#[instrument(skip(state, payload))]
pub async fn update_own_recruiter(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    StrictJson(payload): StrictJson<UpdateRecruiterRequest>,
) -> ApiResult<Json<Value>> {
    const SCOPE: &str = "authenticated_recruiter.update";
    validate_payload(SCOPE, &payload)?;

    let recruiter = state
        .profiles
        .find_recruiter_by_owner(user_id)
        .await
        .map_err(|e| ApiError::upstream(&format!("{SCOPE}.find_by_owner"), "failed to update recruiter", e))?
        .ok_or_else(|| {
            ApiError::not_found(&format!("{SCOPE}.not_found"), "failed to update recruiter", "recruiter not found")
        })?;

    apply_recruiter_patch(&state, recruiter.id, payload.into(), SCOPE).await
}

#[instrument(skip(state, payload))]
pub async fn update_recruiter(
    State(state): State<AppState>,
    AuthUser(actor_id): AuthUser,
    Path(raw_id): Path<String>,
    StrictJson(payload): StrictJson<UpdateRecruiterRequest>,
) -> ApiResult<Json<Value>> {
    const SCOPE: &str = "recruiter.update";
    let id = parse_id(SCOPE, &raw_id)?;
    validate_payload(SCOPE, &payload)?;

    assert_owner(state.profiles.as_ref(), actor_id, id, ProfileKind::Recruiter)
        .await
        .map_err(|e| e.into_api(SCOPE, "failed to update recruiter"))?;

    apply_recruiter_patch(&state, id, payload.into(), SCOPE).await
}

/// Builds the listing query. Non-members always get the first default page,
/// unfiltered, whatever they ask for.
pub(crate) fn list_query(is_member: bool, raw: Option<&str>) -> Result<EngineerQuery, String> {
    let mut query = EngineerQuery::default();
    if !is_member {
        return Ok(query);
    }

    for (key, value) in form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
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
            "country" => query.filter.country = Some(value.into_owned()),
            "searchStatus" => query.filter.search_status = Some(value.into_owned()),
            "roleLevel" => query.filter.role_level = Some(value.into_owned()),
            "roleType" => query.filter.role_type = Some(value.into_owned()),
            _ => {}
        }
    }
    if page_offset(query.page, query.limit).is_none() {
        return Err(format!("page {} is out of range", query.page));
    }
    Ok(query)
}

#[instrument(skip(state, raw_query))]
pub async fn list_engineers(
    State(state): State<AppState>,
    membership: Membership,
    RawQuery(raw_query): RawQuery,
) -> ApiResult<Json<Value>> {
    const MSG: &str = "failed to list engineers";
    let query = list_query(membership.is_member, raw_query.as_deref())
        .map_err(|detail| ApiError::validation("engineer.list.new_query_params", MSG, detail))?;

    let engineers = state
        .profiles
        .list_engineers(&query)
        .await
        .map_err(|e| ApiError::upstream("engineer.list.read_engineers", MSG, e))?;

    let views: Vec<EngineerView> = engineers
        .into_iter()
        .map(|e| EngineerView::for_viewer(e, membership.is_member))
        .collect();
    info!(count = views.len(), is_member = membership.is_member, "engineers listed");
    Ok(Json(json!({ "engineers": views })))
}

#[instrument(skip(state))]
pub async fn read_engineer(
    State(state): State<AppState>,
    membership: Membership,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Value>> {
    const MSG: &str = "failed to read engineer";
    let id = parse_id("engineer.read", &raw_id)?;

    let engineer = state
        .profiles
        .find_engineer(id)
        .await
        .map_err(|e| ApiError::upstream("engineer.read.read_by_id", MSG, e))?
        .ok_or_else(|| ApiError::not_found("engineer.read.not_found", MSG, "engineer not found"))?;

    Ok(Json(json!({
        "engineer": EngineerView::for_viewer(engineer, membership.is_member)
    })))
}

#[instrument(skip(state))]
pub async fn read_recruiter(
    State(state): State<AppState>,
    _membership: Membership,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Value>> {
    const MSG: &str = "failed to read recruiter";
    let id = parse_id("recruiter.read", &raw_id)?;

    let recruiter = state
        .profiles
        .find_recruiter(id)
        .await
        .map_err(|e| ApiError::upstream("recruiter.read.read_by_id", MSG, e))?
        .ok_or_else(|| ApiError::not_found("recruiter.read.not_found", MSG, "recruiter not found"))?;
    Ok(Json(json!({ "recruiter": recruiter })))
}
