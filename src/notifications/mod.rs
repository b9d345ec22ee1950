use uuid::Uuid;

/// Outbound notifications the host platform normally handles: account
/// lifecycle events and delivery of generated passwords. Kept behind a trait
/// so deployments can wire a real mailer or event bus.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn user_created(&self, user_id: i64, username: &str);
    async fn user_updated(&self, user_id: i64);
    async fn new_password(&self, user_id: i64, email: &str, password: &str);
}

pub struct LogNotifier;

fn event_id() -> Uuid {
    Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext))
}

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn user_created(&self, user_id: i64, username: &str) {
        log::info!("event {}: user_created id={} username={}", event_id(), user_id, username);
    }

    async fn user_updated(&self, user_id: i64) {
        log::info!("event {}: user_updated id={}", event_id(), user_id);
    }

    async fn new_password(&self, user_id: i64, email: &str, _password: &str) {
        // The password itself never reaches the log.
        log::info!("event {}: new password queued for user {} ({})", event_id(), user_id, email);
    }
}
