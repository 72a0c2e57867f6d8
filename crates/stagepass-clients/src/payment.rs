//! Payment service adapter.

use async_trait::async_trait;

use stagepass_core::clients::{
    ChargeOutcome, ChargeRequest, PaymentClient, RefundOutcome, RefundRequest,
};
use stagepass_core::correlation::{RequestContext, CORRELATION_ID_HEADER};
use stagepass_core::error::ClientError;

use crate::http::{decode_error, transport_error, trimmed_base};

const SERVICE: &str = "payment";

/// HTTP adapter for the payment service.
#[derive(Debug, Clone)]
pub struct HttpPaymentClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trimmed_base(base_url),
        }
    }
}

#[async_trait]
impl PaymentClient for HttpPaymentClient {
    async fn charge(
        &self,
        ctx: &RequestContext,
        request: &ChargeRequest,
    ) -> Result<ChargeOutcome, ClientError> {
        let url = format!("{}/api/v1/charges", self.base_url);
        let response = self
            .client
            .post(url)
            .header(CORRELATION_ID_HEADER, ctx.correlation_id())
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;
        if !response.status().is_success() {
            return Err(ClientError::UnexpectedStatus {
                service: SERVICE,
                status: response.status().as_u16(),
            });
        }
        response
            .json::<ChargeOutcome>()
            .await
            .map_err(|e| decode_error(SERVICE, &e))
    }

    async fn refund(
        &self,
        ctx: &RequestContext,
        request: &RefundRequest,
    ) -> Result<RefundOutcome, ClientError> {
        let url = format!("{}/api/v1/refunds", self.base_url);
        let response = self
            .client
            .post(url)
            .header(CORRELATION_ID_HEADER, ctx.correlation_id())
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;
        if !response.status().is_success() {
            return Err(ClientError::UnexpectedStatus {
                service: SERVICE,
                status: response.status().as_u16(),
            });
        }
        response
            .json::<RefundOutcome>()
            .await
            .map_err(|e| decode_error(SERVICE, &e))
    }
}
