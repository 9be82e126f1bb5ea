use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::{inserted, PgStore},
    profiles::repo_types::{
        Engineer, EngineerPatch, EngineerQuery, ProfileKind, Recruiter, RecruiterDecision,
        page_offset, RecruiterPatch, RecruiterStatus,
    },
};

/// Engineer and recruiter persistence. `Ok(None)` means "no such row".
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_engineer(&self, id: Uuid) -> anyhow::Result<Option<Engineer>>;
    async fn find_engineer_by_owner(&self, user_id: Uuid) -> anyhow::Result<Option<Engineer>>;
    async fn list_engineers(&self, query: &EngineerQuery) -> anyhow::Result<Vec<Engineer>>;
    async fn count_engineers(&self) -> anyhow::Result<i64>;
    /// Returns `false` when the profile id is already taken.
    async fn insert_engineer(&self, engineer: &Engineer) -> anyhow::Result<bool>;
    async fn update_engineer(
        &self,
        id: Uuid,
        patch: &EngineerPatch,
    ) -> anyhow::Result<Option<Engineer>>;

    async fn find_recruiter(&self, id: Uuid) -> anyhow::Result<Option<Recruiter>>;
    async fn find_recruiter_by_owner(&self, user_id: Uuid) -> anyhow::Result<Option<Recruiter>>;
    /// One page of recruiters plus the total matching `status`.
    async fn list_recruiters(
        &self,
        status: Option<RecruiterStatus>,
        page: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<Recruiter>, i64)>;
    /// Returns `false` when the profile id is already taken.
    async fn insert_recruiter(&self, recruiter: &Recruiter) -> anyhow::Result<bool>;
    async fn update_recruiter(
        &self,
        id: Uuid,
        patch: &RecruiterPatch,
    ) -> anyhow::Result<Option<Recruiter>>;
    async fn decide_recruiter(
        &self,
        id: Uuid,
        decision: &RecruiterDecision,
    ) -> anyhow::Result<Option<Recruiter>>;

    /// Which profile table, if any, already holds `id`.
    async fn profile_exists(&self, id: Uuid) -> anyhow::Result<Option<ProfileKind>>;
}

const ENGINEER_COLUMNS: &str = "id, user_id, first_name, last_name, tagline, city, state, country, \
     avatar, bio, search_status, role_type, role_level, website, github, twitter, linkedin, \
     stackoverflow, created_at";
const RECRUITER_COLUMNS: &str = "id, user_id, first_name, last_name, company, role, logo, bio, \
     linkedin, website, is_member, status, rejection_reason, approved_by, approval_date, created_at";

#[async_trait]
impl ProfileStore for PgStore {
    async fn find_engineer(&self, id: Uuid) -> anyhow::Result<Option<Engineer>> {
        let row = sqlx::query_as::<_, Engineer>(&format!(
            "SELECT {ENGINEER_COLUMNS} FROM engineers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_engineer_by_owner(&self, user_id: Uuid) -> anyhow::Result<Option<Engineer>> {
        let row = sqlx::query_as::<_, Engineer>(&format!(
            "SELECT {ENGINEER_COLUMNS} FROM engineers WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_engineers(&self, query: &EngineerQuery) -> anyhow::Result<Vec<Engineer>> {
        let f = &query.filter;
        let rows = sqlx::query_as::<_, Engineer>(&format!(
            r#"
            SELECT {ENGINEER_COLUMNS}
              FROM engineers
             WHERE ($1::text IS NULL OR country = $1)
               AND ($2::text IS NULL OR search_status = $2)
               AND ($3::text IS NULL OR $3 = ANY(role_level))
               AND ($4::text IS NULL OR $4 = ANY(role_type))
             ORDER BY created_at DESC
             LIMIT $5 OFFSET $6
            "#
        ))
        .bind(f.country.as_deref())
        .bind(f.search_status.as_deref())
        .bind(f.role_level.as_deref())
        .bind(f.role_type.as_deref())
        .bind(query.limit)
        .bind(query.offset())
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn count_engineers(&self) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM engineers")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    async fn insert_engineer(&self, e: &Engineer) -> anyhow::Result<bool> {
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO engineers ({ENGINEER_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#
        ))
        .bind(e.id)
        .bind(e.user_id)
        .bind(&e.first_name)
        .bind(&e.last_name)
        .bind(&e.tagline)
        .bind(&e.city)
        .bind(&e.state)
        .bind(&e.country)
        .bind(&e.avatar)
        .bind(&e.bio)
        .bind(&e.search_status)
        .bind(&e.role_type)
        .bind(&e.role_level)
        .bind(&e.website)
        .bind(&e.github)
        .bind(&e.twitter)
        .bind(&e.linkedin)
        .bind(&e.stackoverflow)
        .bind(e.created_at)
        .execute(&self.db)
        .await;
        inserted(result)
    }

    async fn update_engineer(
        &self,
        id: Uuid,
        p: &EngineerPatch,
    ) -> anyhow::Result<Option<Engineer>> {
        let row = sqlx::query_as::<_, Engineer>(&format!(
            r#"
            UPDATE engineers SET
                first_name    = COALESCE($2, first_name),
                last_name     = COALESCE($3, last_name),
                tagline       = COALESCE($4, tagline),
                city          = COALESCE($5, city),
                state         = COALESCE($6, state),
                country       = COALESCE($7, country),
                avatar        = COALESCE($8, avatar),
                bio           = COALESCE($9, bio),
                search_status = COALESCE($10, search_status),
                role_type     = COALESCE($11, role_type),
                role_level    = COALESCE($12, role_level),
                website       = COALESCE($13, website),
                twitter       = COALESCE($14, twitter),
                stackoverflow = COALESCE($15, stackoverflow)
             WHERE id = $1
            RETURNING {ENGINEER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&p.first_name)
        .bind(&p.last_name)
        .bind(&p.tagline)
        .bind(&p.city)
        .bind(&p.state)
        .bind(&p.country)
        .bind(&p.avatar)
        .bind(&p.bio)
        .bind(&p.search_status)
        .bind(&p.role_type)
        .bind(&p.role_level)
        .bind(&p.website)
        .bind(&p.twitter)
        .bind(&p.stackoverflow)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_recruiter(&self, id: Uuid) -> anyhow::Result<Option<Recruiter>> {
        let row = sqlx::query_as::<_, Recruiter>(&format!(
            "SELECT {RECRUITER_COLUMNS} FROM recruiters WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_recruiter_by_owner(&self, user_id: Uuid) -> anyhow::Result<Option<Recruiter>> {
        let row = sqlx::query_as::<_, Recruiter>(&format!(
            "SELECT {RECRUITER_COLUMNS} FROM recruiters WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_recruiters(
        &self,
        status: Option<RecruiterStatus>,
        page: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<Recruiter>, i64)> {
        let status = status.map(RecruiterStatus::as_str);

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM recruiters WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, Recruiter>(&format!(
            r#"
            SELECT {RECRUITER_COLUMNS}
              FROM recruiters
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY created_at ASC
             LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status)
        .bind(limit)
        .bind(page_offset(page, limit).unwrap_or(i64::MAX))
        .fetch_all(&self.db)
        .await?;

        Ok((rows, total))
    }

    async fn insert_recruiter(&self, r: &Recruiter) -> anyhow::Result<bool> {
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO recruiters ({RECRUITER_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#
        ))
        .bind(r.id)
        .bind(r.user_id)
        .bind(&r.first_name)
        .bind(&r.last_name)
        .bind(&r.company)
        .bind(&r.role)
        .bind(&r.logo)
        .bind(&r.bio)
        .bind(&r.linkedin)
        .bind(&r.website)
        .bind(r.is_member)
        .bind(r.status.as_str())
        .bind(&r.rejection_reason)
        .bind(r.approved_by)
        .bind(r.approval_date)
        .bind(r.created_at)
        .execute(&self.db)
        .await;
        inserted(result)
    }

    async fn update_recruiter(
        &self,
        id: Uuid,
        p: &RecruiterPatch,
    ) -> anyhow::Result<Option<Recruiter>> {
        let row = sqlx::query_as::<_, Recruiter>(&format!(
            r#"
            UPDATE recruiters SET
                first_name = COALESCE($2, first_name),
                last_name  = COALESCE($3, last_name),
                company    = COALESCE($4, company),
                bio        = COALESCE($5, bio),
                logo       = COALESCE($6, logo),
                role       = COALESCE($7, role),
                website    = COALESCE($8, website)
             WHERE id = $1
            RETURNING {RECRUITER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&p.first_name)
        .bind(&p.last_name)
        .bind(&p.company)
        .bind(&p.bio)
        .bind(&p.logo)
        .bind(&p.role)
        .bind(&p.website)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn decide_recruiter(
        &self,
        id: Uuid,
        d: &RecruiterDecision,
    ) -> anyhow::Result<Option<Recruiter>> {
        let row = sqlx::query_as::<_, Recruiter>(&format!(
            r#"
            UPDATE recruiters SET
                status           = $2,
                is_member        = $3,
                rejection_reason = $4,
                approved_by      = $5,
                approval_date    = $6
             WHERE id = $1
            RETURNING {RECRUITER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(d.status.as_str())
        .bind(d.is_member())
        .bind(&d.rejection_reason)
        .bind(d.approved_by())
        .bind(d.approval_date())
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn profile_exists(&self, id: Uuid) -> anyhow::Result<Option<ProfileKind>> {
        let (engineers,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM engineers WHERE id = $1")
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        if engineers != 0 {
            return Ok(Some(ProfileKind::Engineer));
        }

        let (recruiters,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM recruiters WHERE id = $1")
                .bind(id)
                .fetch_one(&self.db)
                .await?;
        Ok((recruiters != 0).then_some(ProfileKind::Recruiter))
    }
}
