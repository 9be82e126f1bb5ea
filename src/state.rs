use std::sync::Arc;
use std::time::Instant;

use crate::auth::jwt::TokenCodec;
use crate::auth::repo::{AccountStore, AdminStore};
use crate::config::AppConfig;
use crate::db::PgStore;
use crate::notify::{LogNotifier, Notifier, SlackNotifier};
use crate::profiles::repo::ProfileStore;

/// Process-wide, read-only after startup. Cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenCodec,
    pub accounts: Arc<dyn AccountStore>,
    pub admins: Arc<dyn AdminStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub notifier: Arc<dyn Notifier>,
    pub started_at: Instant,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = PgStore::connect(&config).await?;
        store.migrate().await?;
        let store = Arc::new(store);

        let notifier = match &config.slack_webhook_url {
            Some(url) => Arc::new(SlackNotifier::new(url.clone())) as Arc<dyn Notifier>,
            None => {
                tracing::warn!("SLACK_WEBHOOK_URL not set; notifications are only logged");
                Arc::new(LogNotifier) as Arc<dyn Notifier>
            }
        };

        Ok(Self::from_parts(
            config,
            store.clone(),
            store.clone(),
            store,
            notifier,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        accounts: Arc<dyn AccountStore>,
        admins: Arc<dyn AdminStore>,
        profiles: Arc<dyn ProfileStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let tokens = TokenCodec::new(&config.jwt);
        Self {
            config,
            tokens,
            accounts,
            admins,
            profiles,
            notifier,
            started_at: Instant::now(),
        }
    }
}
