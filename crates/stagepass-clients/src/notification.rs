//! Notification fan-out adapter used by the outbox dispatcher.

use async_trait::async_trait;

use stagepass_core::clients::NotificationClient;
use stagepass_core::correlation::CORRELATION_ID_HEADER;
use stagepass_core::error::ClientError;
use stagepass_core::model::OutboxRecord;

use crate::http::{transport_error, trimmed_base};

const SERVICE: &str = "notification";

/// HTTP adapter for the notification service. A delivery only counts when
/// the service answers 2xx; everything else leaves the record queued.
#[derive(Debug, Clone)]
pub struct HttpNotificationClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNotificationClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trimmed_base(base_url),
        }
    }
}

#[async_trait]
impl NotificationClient for HttpNotificationClient {
    async fn send_event(&self, record: &OutboxRecord) -> Result<(), ClientError> {
        let url = format!("{}/api/v1/notifications", self.base_url);
        let response = self
            .client
            .post(url)
            .header(CORRELATION_ID_HEADER, record.correlation_id.as_str())
            .json(record)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;
        if !response.status().is_success() {
            return Err(ClientError::UnexpectedStatus {
                service: SERVICE,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
