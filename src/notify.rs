use std::sync::Arc;

use async_trait::async_trait;
use anyhow::Context;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

/// Things worth telling someone about. Delivery is best effort.
#[derive(Debug, Clone)]
pub enum Event {
    UserSignedUp {
        user_id: Uuid,
        email: String,
        verify_url: String,
    },
    EngineerCreated {
        engineer_id: Uuid,
        user_id: Uuid,
    },
    RecruiterCreated {
        recruiter_id: Uuid,
        company: String,
    },
    RecruiterApproved {
        recruiter_id: Uuid,
        name: String,
        company: String,
        email: String,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::UserSignedUp { .. } => "user_signed_up",
            Event::EngineerCreated { .. } => "engineer_created",
            Event::RecruiterCreated { .. } => "recruiter_created",
            Event::RecruiterApproved { .. } => "recruiter_approved",
        }
    }

    fn summary(&self) -> String {
        match self {
            Event::UserSignedUp { user_id, .. } => format!("New sign-up: user {user_id}"),
            Event::EngineerCreated {
                engineer_id,
                user_id,
            } => format!("New engineer profile {engineer_id} for user {user_id}"),
            Event::RecruiterCreated {
                recruiter_id,
                company,
            } => format!("New recruiter {recruiter_id} from {company} awaiting review"),
            Event::RecruiterApproved {
                recruiter_id,
                name,
                company,
                ..
            } => format!("Recruiter {name} ({company}, {recruiter_id}) approved"),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &Event) -> anyhow::Result<()>;
}

/// Sends `event` on a detached task. Failures are logged and never reach the caller.
pub fn dispatch(notifier: Arc<dyn Notifier>, event: Event) {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&event).await {
            warn!(event = event.name(), error = %e, "notification failed");
        }
    });
}

/// Writes events to the log only.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &Event) -> anyhow::Result<()> {
        info!(event = event.name(), summary = %event.summary(), "notification");
        // Mail delivery is external; record what would have been sent.
        match event {
            Event::UserSignedUp {
                email, verify_url, ..
            } => info!(
                to = %email,
                link = %redact_code(verify_url),
                "verification email pending"
            ),
            Event::RecruiterApproved { email, .. } => {
                info!(to = %email, "approval email pending")
            }
            _ => {}
        }
        Ok(())
    }
}

/// Masks the trailing verification code of a link so logs cannot be replayed.
fn redact_code(link: &str) -> String {
    match link.rsplit_once('/') {
        Some((head, _)) => format!("{head}/<code>"),
        None => "<code>".to_string(),
    }
}

/// Posts events to a Slack incoming webhook.
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, event: &Event) -> anyhow::Result<()> {
        self.client
            .post(&self.webhook_url)
            .json(&json!({ "text": event.summary() }))
            .send()
            .await
            .context("slack webhook request")?
            .error_for_status()
            .context("slack webhook status")?;
        info!(event = event.name(), "slack notification sent");
        Ok(())
    }
}
