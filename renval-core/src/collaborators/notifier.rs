//! Outbound participant notifications

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::CollaboratorError;

/// One templated message to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipient address (phone number)
    pub recipient: String,
    pub template: String,
    pub variables: BTreeMap<String, String>,
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), CollaboratorError>;
}

/// Posts notifications to a messaging gateway as
/// `{"phone", "template", "templateData"}`
pub struct HttpDispatcher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDispatcher {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl NotificationDispatcher for HttpDispatcher {
    async fn send(&self, notification: &Notification) -> Result<(), CollaboratorError> {
        let payload = json!({
            "phone": notification.recipient,
            "template": notification.template,
            "templateData": notification.variables,
        });

        let response = self.client.post(&self.endpoint).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(endpoint = %self.endpoint, template = %notification.template, "Notification sent");
        Ok(())
    }
}

/// Dispatcher that records messages instead of sending them
#[derive(Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher whose every send fails
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send(&self, notification: &Notification) -> Result<(), CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Dispatch("gateway unavailable".into()));
        }
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invitation() -> Notification {
        Notification {
            recipient: "6281234567892".into(),
            template: "fitAndProper".into(),
            variables: BTreeMap::from([("name".to_string(), "Rois".to_string())]),
        }
    }

    #[tokio::test]
    async fn recording_dispatcher_keeps_messages() {
        let dispatcher = RecordingDispatcher::new();
        dispatcher.send(&invitation()).await.unwrap();
        assert_eq!(dispatcher.sent().await, vec![invitation()]);
    }

    #[tokio::test]
    async fn failing_dispatcher_records_nothing() {
        let dispatcher = RecordingDispatcher::failing();
        assert!(dispatcher.send(&invitation()).await.is_err());
        assert!(dispatcher.sent().await.is_empty());
    }

    #[tokio::test]
    async fn http_dispatcher_reports_unreachable_gateway() {
        // Nothing listens on the discard port
        let dispatcher = HttpDispatcher::new("http://127.0.0.1:9/api/messages/send");
        assert!(matches!(
            dispatcher.send(&invitation()).await,
            Err(CollaboratorError::Dispatch(_))
        ));
    }
}
