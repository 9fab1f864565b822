//! Login notifications
//!
//! A successful login emits a [`LoginEvent`] to a notifier. Delivery runs on
//! its own task: the login response never waits for it and never sees its
//! errors.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::task::JoinHandle;

use crate::config::NotifyConfig;
use crate::error::NotifyError;
use crate::models::LoginEvent;

/// Receiver of successful login events
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginNotifier: Send + Sync {
    /// Deliver one login event
    async fn notify_login(&self, event: &LoginEvent) -> Result<(), NotifyError>;
}

/// Writes login events to the log only
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl LoginNotifier for LogNotifier {
    async fn notify_login(&self, event: &LoginEvent) -> Result<(), NotifyError> {
        tracing::info!(
            email = %event.email,
            role = %event.role,
            ip = event.ip.as_deref().unwrap_or("-"),
            at = %event.at.to_rfc3339(),
            "Admin login"
        );
        Ok(())
    }
}

/// POSTs login events as JSON to a webhook
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    /// Create a webhook notifier with a request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        Ok(Self::with_client(client, url))
    }

    /// Create a webhook notifier with a custom reqwest Client
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Target URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LoginNotifier for WebhookNotifier {
    async fn notify_login(&self, event: &LoginEvent) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }

        tracing::debug!(email = %event.email, url = %self.url, "Login event delivered");
        Ok(())
    }
}

/// Build the notifier described by configuration
///
/// Falls back to [`LogNotifier`] when no webhook is configured or the HTTP
/// client cannot be built.
pub fn notifier_from_config(config: &NotifyConfig) -> Arc<dyn LoginNotifier> {
    let Some(url) = config.webhook_url.as_deref().filter(|u| !u.is_empty()) else {
        return Arc::new(LogNotifier);
    };

    match WebhookNotifier::new(url, Duration::from_secs(config.timeout_secs)) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build webhook notifier, logging logins instead");
            Arc::new(LogNotifier)
        }
    }
}

/// Deliver a login event on a background task
///
/// Failures are logged and dropped.
pub fn notify_in_background(notifier: Arc<dyn LoginNotifier>, event: LoginEvent) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify_login(&event).await {
            tracing::warn!(error = %e, email = %event.email, "Login notification failed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> LoginEvent {
        LoginEvent::new("owner@example.com", Role::Owner).with_ip("203.0.113.7")
    }

    // Test 1: LogNotifier always succeeds
    #[tokio::test]
    async fn test_log_notifier() {
        assert!(LogNotifier.notify_login(&event()).await.is_ok());
    }

    // Test 2: Webhook receives the event as JSON
    #[tokio::test]
    async fn test_webhook_posts_event() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(serde_json::json!({
                "email": "owner@example.com",
                "role": "owner",
                "ip": "203.0.113.7"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            WebhookNotifier::new(format!("{}/login", server.uri()), Duration::from_secs(5))
                .unwrap();

        assert!(notifier.notify_login(&event()).await.is_ok());
    }

    // Test 3: Non-success status is reported as rejected
    #[tokio::test]
    async fn test_webhook_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(server.uri(), Duration::from_secs(5)).unwrap();

        let result = notifier.notify_login(&event()).await;
        assert_eq!(result, Err(NotifyError::Rejected(503)));
    }

    // Test 4: Unreachable webhook is a delivery error
    #[tokio::test]
    async fn test_webhook_unreachable() {
        let notifier =
            WebhookNotifier::new("http://127.0.0.1:9/login", Duration::from_millis(500)).unwrap();

        let result = notifier.notify_login(&event()).await;
        assert!(matches!(result, Err(NotifyError::Delivery(_))));
    }

    // Test 5: Background delivery swallows failures
    #[tokio::test]
    async fn test_notify_in_background_swallows_errors() {
        let mut mock = MockLoginNotifier::new();
        mock.expect_notify_login()
            .times(1)
            .returning(|_| Err(NotifyError::Rejected(500)));

        let handle = notify_in_background(Arc::new(mock), event());
        assert!(handle.await.is_ok());
    }

    // Test 6: Configuration selects the notifier
    #[test]
    fn test_notifier_from_config() {
        let config = NotifyConfig::default();
        let _log = notifier_from_config(&config);

        let config = NotifyConfig {
            webhook_url: Some("http://hooks.example.com/login".to_string()),
            timeout_secs: 1,
        };
        let _webhook = notifier_from_config(&config);
    }
}
