//! In-memory collaborators for unit and router tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        ids::profile_id,
        password::hash_password,
        repo::{AccountStore, AdminStore},
        repo_types::{Account, Admin},
    },
    config::{AppConfig, JwtConfig},
    notify::{Event, Notifier},
    profiles::{
        repo::ProfileStore,
        repo_types::{
            page_offset, Engineer, EngineerPatch, EngineerQuery, ProfileKind, Recruiter,
            RecruiterDecision, RecruiterPatch, RecruiterStatus,
        },
    },
    state::AppState,
};

/// Every store trait over plain hash maps. `set_failing(true)` makes each
/// call return an error, standing in for an unreachable database.
///
/// `set_stale_reads(true)` makes the existence checks (`count_by_email`,
/// `profile_exists`) miss rows that are already stored, as when a concurrent
/// request commits between a check and its insert.
#[derive(Default)]
pub struct MemoryStore {
    accounts: Mutex<HashMap<Uuid, Account>>,
    admins: Mutex<HashMap<Uuid, Admin>>,
    engineers: Mutex<HashMap<Uuid, Engineer>>,
    recruiters: Mutex<HashMap<Uuid, Recruiter>>,
    fail: AtomicBool,
    stale_reads: AtomicBool,
}

impl MemoryStore {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_stale_reads(&self, stale: bool) {
        self.stale_reads.store(stale, Ordering::SeqCst);
    }

    fn stale(&self) -> bool {
        self.stale_reads.load(Ordering::SeqCst)
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("store unavailable");
        }
        Ok(())
    }

    pub fn put_account(&self, account: Account) {
        self.accounts.lock().unwrap().insert(account.id, account);
    }

    pub fn put_admin(&self, admin: Admin) {
        self.admins.lock().unwrap().insert(admin.id, admin);
    }

    pub fn put_engineer(&self, engineer: Engineer) {
        self.engineers.lock().unwrap().insert(engineer.id, engineer);
    }

    pub fn put_recruiter(&self, recruiter: Recruiter) {
        self.recruiters.lock().unwrap().insert(recruiter.id, recruiter);
    }

    pub fn account(&self, id: Uuid) -> Option<Account> {
        self.accounts.lock().unwrap().get(&id).cloned()
    }

    pub fn recruiter(&self, id: Uuid) -> Option<Recruiter> {
        self.recruiters.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        self.check()?;
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Account>> {
        self.check()?;
        Ok(self.account(id))
    }

    async fn count_by_email(&self, email: &str) -> anyhow::Result<i64> {
        self.check()?;
        if self.stale() {
            return Ok(0);
        }
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.values().filter(|a| a.email == email).count() as i64)
    }

    async fn insert(&self, account: &Account) -> anyhow::Result<bool> {
        self.check()?;
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&account.id) || accounts.values().any(|a| a.email == account.email) {
            return Ok(false);
        }
        accounts.insert(account.id, account.clone());
        Ok(true)
    }

    async fn mark_verified(&self, id: Uuid) -> anyhow::Result<()> {
        self.check()?;
        if let Some(a) = self.accounts.lock().unwrap().get_mut(&id) {
            a.verified = true;
        }
        Ok(())
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Admin>> {
        self.check()?;
        Ok(self.admins.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Admin>> {
        self.check()?;
        let admins = self.admins.lock().unwrap();
        Ok(admins.values().find(|a| a.username == username).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<Admin>> {
        self.check()?;
        let mut admins: Vec<_> = self.admins.lock().unwrap().values().cloned().collect();
        admins.sort_by_key(|a| a.created_at);
        Ok(admins)
    }

    async fn insert(&self, admin: &Admin) -> anyhow::Result<bool> {
        self.check()?;
        let mut admins = self.admins.lock().unwrap();
        if admins.contains_key(&admin.id) || admins.values().any(|a| a.username == admin.username) {
            return Ok(false);
        }
        admins.insert(admin.id, admin.clone());
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        self.check()?;
        Ok(self.admins.lock().unwrap().remove(&id).is_some())
    }
}

fn apply<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *slot = v.clone();
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_engineer(&self, id: Uuid) -> anyhow::Result<Option<Engineer>> {
        self.check()?;
        Ok(self.engineers.lock().unwrap().get(&id).cloned())
    }

    async fn find_engineer_by_owner(&self, user_id: Uuid) -> anyhow::Result<Option<Engineer>> {
        self.check()?;
        let engineers = self.engineers.lock().unwrap();
        Ok(engineers.values().find(|e| e.user_id == user_id).cloned())
    }

    async fn list_engineers(&self, query: &EngineerQuery) -> anyhow::Result<Vec<Engineer>> {
        self.check()?;
        let f = &query.filter;
        let mut rows: Vec<_> = self
            .engineers
            .lock()
            .unwrap()
            .values()
            .filter(|e| f.country.as_ref().map_or(true, |c| &e.country == c))
            .filter(|e| f.search_status.as_ref().map_or(true, |s| &e.search_status == s))
            .filter(|e| f.role_level.as_ref().map_or(true, |l| e.role_level.contains(l)))
            .filter(|e| f.role_type.as_ref().map_or(true, |t| e.role_type.contains(t)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows
            .into_iter()
            .skip(query.offset().max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect())
    }

    async fn count_engineers(&self) -> anyhow::Result<i64> {
        self.check()?;
        Ok(self.engineers.lock().unwrap().len() as i64)
    }

    async fn insert_engineer(&self, engineer: &Engineer) -> anyhow::Result<bool> {
        self.check()?;
        let mut engineers = self.engineers.lock().unwrap();
        if engineers.contains_key(&engineer.id) {
            return Ok(false);
        }
        engineers.insert(engineer.id, engineer.clone());
        Ok(true)
    }

    async fn update_engineer(
        &self,
        id: Uuid,
        p: &EngineerPatch,
    ) -> anyhow::Result<Option<Engineer>> {
        self.check()?;
        let mut engineers = self.engineers.lock().unwrap();
        let Some(e) = engineers.get_mut(&id) else {
            return Ok(None);
        };
        apply(&mut e.first_name, &p.first_name);
        apply(&mut e.last_name, &p.last_name);
        apply(&mut e.tagline, &p.tagline);
        apply(&mut e.city, &p.city);
        if p.state.is_some() {
            e.state = p.state.clone();
        }
        apply(&mut e.country, &p.country);
        apply(&mut e.avatar, &p.avatar);
        apply(&mut e.bio, &p.bio);
        apply(&mut e.search_status, &p.search_status);
        apply(&mut e.role_type, &p.role_type);
        apply(&mut e.role_level, &p.role_level);
        if p.website.is_some() {
            e.website = p.website.clone();
        }
        if p.twitter.is_some() {
            e.twitter = p.twitter.clone();
        }
        if p.stackoverflow.is_some() {
            e.stackoverflow = p.stackoverflow.clone();
        }
        Ok(Some(e.clone()))
    }

    async fn find_recruiter(&self, id: Uuid) -> anyhow::Result<Option<Recruiter>> {
        self.check()?;
        Ok(self.recruiter(id))
    }

    async fn find_recruiter_by_owner(&self, user_id: Uuid) -> anyhow::Result<Option<Recruiter>> {
        self.check()?;
        let recruiters = self.recruiters.lock().unwrap();
        Ok(recruiters.values().find(|r| r.user_id == user_id).cloned())
    }

    async fn list_recruiters(
        &self,
        status: Option<RecruiterStatus>,
        page: i64,
        limit: i64,
    ) -> anyhow::Result<(Vec<Recruiter>, i64)> {
        self.check()?;
        let mut rows: Vec<_> = self
            .recruiters
            .lock()
            .unwrap()
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.created_at);
        let total = rows.len() as i64;
        let page = rows
            .into_iter()
            .skip(page_offset(page, limit).unwrap_or(i64::MAX).max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn insert_recruiter(&self, recruiter: &Recruiter) -> anyhow::Result<bool> {
        self.check()?;
        let mut recruiters = self.recruiters.lock().unwrap();
        if recruiters.contains_key(&recruiter.id) {
            return Ok(false);
        }
        recruiters.insert(recruiter.id, recruiter.clone());
        Ok(true)
    }

    async fn update_recruiter(
        &self,
        id: Uuid,
        p: &RecruiterPatch,
    ) -> anyhow::Result<Option<Recruiter>> {
        self.check()?;
        let mut recruiters = self.recruiters.lock().unwrap();
        let Some(r) = recruiters.get_mut(&id) else {
            return Ok(None);
        };
        apply(&mut r.first_name, &p.first_name);
        apply(&mut r.last_name, &p.last_name);
        apply(&mut r.company, &p.company);
        apply(&mut r.bio, &p.bio);
        apply(&mut r.logo, &p.logo);
        apply(&mut r.role, &p.role);
        if p.website.is_some() {
            r.website = p.website.clone();
        }
        Ok(Some(r.clone()))
    }

    async fn decide_recruiter(
        &self,
        id: Uuid,
        d: &RecruiterDecision,
    ) -> anyhow::Result<Option<Recruiter>> {
        self.check()?;
        let mut recruiters = self.recruiters.lock().unwrap();
        let Some(r) = recruiters.get_mut(&id) else {
            return Ok(None);
        };
        r.status = d.status;
        r.is_member = d.is_member();
        r.rejection_reason = d.rejection_reason.clone();
        r.approved_by = d.approved_by();
        r.approval_date = d.approval_date();
        Ok(Some(r.clone()))
    }

    async fn profile_exists(&self, id: Uuid) -> anyhow::Result<Option<ProfileKind>> {
        self.check()?;
        if self.stale() {
            return Ok(None);
        }
        if self.engineers.lock().unwrap().contains_key(&id) {
            return Ok(Some(ProfileKind::Engineer));
        }
        Ok(self
            .recruiters
            .lock()
            .unwrap()
            .contains_key(&id)
            .then_some(ProfileKind::Recruiter))
    }
}

/// Keeps the names of every event it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<&'static str>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &Event) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event.name());
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "talentboard-test".into(),
            audience: "talentboard-test-api".into(),
            user_ttl_minutes: 60,
            admin_ttl_minutes: 60 * 24,
        },
        frontend_url: "http://front.test".into(),
        public_base_url: "http://api.test".into(),
        slack_webhook_url: None,
    }
}

pub fn test_state(store: Arc<MemoryStore>, notifier: Arc<RecordingNotifier>) -> AppState {
    AppState::from_parts(
        Arc::new(test_config()),
        store.clone(),
        store.clone(),
        store,
        notifier,
    )
}

pub fn sample_engineer(user_id: Uuid) -> Engineer {
    Engineer {
        id: profile_id(user_id),
        user_id,
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        tagline: "Analytical engines".into(),
        city: "London".into(),
        state: None,
        country: "GB".into(),
        avatar: "https://img.test/ada.png".into(),
        bio: "First programmer".into(),
        search_status: "open".into(),
        role_type: vec!["employee_full_time".into()],
        role_level: vec!["senior".into()],
        website: None,
        github: "https://github.com/ada".into(),
        twitter: None,
        linkedin: "https://linkedin.com/in/ada".into(),
        stackoverflow: None,
        created_at: OffsetDateTime::now_utc(),
    }
}

/// A pending, non-member recruiter.
pub fn sample_recruiter(user_id: Uuid) -> Recruiter {
    Recruiter {
        id: profile_id(user_id),
        user_id,
        first_name: "Grace".into(),
        last_name: "Hopper".into(),
        company: "Navy".into(),
        role: "Talent lead".into(),
        logo: "https://img.test/navy.png".into(),
        bio: "Hiring compilers people".into(),
        linkedin: "https://linkedin.com/in/grace".into(),
        website: None,
        is_member: false,
        status: RecruiterStatus::Pending,
        rejection_reason: None,
        approved_by: None,
        approval_date: None,
        created_at: OffsetDateTime::now_utc(),
    }
}

pub fn sample_admin(username: &str, password: &str, is_super: bool) -> Admin {
    let now = OffsetDateTime::now_utc();
    Admin {
        id: Uuid::new_v4(),
        username: username.into(),
        password_hash: hash_password(password).unwrap(),
        email: format!("{username}@admin.test"),
        first_name: "Root".into(),
        last_name: "Admin".into(),
        is_super,
        created_at: now,
        updated_at: now,
    }
}
