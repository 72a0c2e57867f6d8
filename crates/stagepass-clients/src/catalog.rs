//! Catalog service adapter.

use async_trait::async_trait;
use reqwest::StatusCode;

use stagepass_core::clients::{CatalogClient, EventInfo};
use stagepass_core::correlation::{RequestContext, CORRELATION_ID_HEADER};
use stagepass_core::error::ClientError;

use crate::http::{decode_error, transport_error, trimmed_base};

const SERVICE: &str = "catalog";

/// HTTP adapter for the event catalog.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trimmed_base(base_url),
        }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn get_event(
        &self,
        ctx: &RequestContext,
        event_id: i64,
    ) -> Result<Option<EventInfo>, ClientError> {
        let url = format!("{}/api/v1/events/{event_id}", self.base_url);
        let response = self
            .client
            .get(url)
            .header(CORRELATION_ID_HEADER, ctx.correlation_id())
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ClientError::UnexpectedStatus {
                service: SERVICE,
                status: response.status().as_u16(),
            });
        }

        let event = response
            .json::<EventInfo>()
            .await
            .map_err(|e| decode_error(SERVICE, &e))?;
        Ok(Some(event))
    }
}
