use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{config::GatewayConfig, http::HttpClient};

/// Charge pushed to the mobile-money provider.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeRequest {
    pub tx_ref: String,
    pub amount: i64,
    pub currency: String,
    pub phone_number: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    pub accepted: bool,
    pub provider_tx_id: Option<String>,
    pub message: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initiate_charge(&self, charge: &ChargeRequest) -> anyhow::Result<ChargeOutcome>;
}

/// Flutterwave mobile-money relay. The charge type (country network) and
/// currency come from configuration.
pub struct FlutterwaveGateway {
    http: HttpClient,
    config: GatewayConfig,
}

impl FlutterwaveGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: HttpClient::new(),
            config,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    status: String,
    message: Option<String>,
    data: Option<GatewayChargeData>,
}

#[derive(Debug, Deserialize)]
struct GatewayChargeData {
    id: Option<i64>,
}

#[async_trait]
impl PaymentGateway for FlutterwaveGateway {
    async fn initiate_charge(&self, charge: &ChargeRequest) -> anyhow::Result<ChargeOutcome> {
        let url = format!(
            "{}/charges?type={}",
            self.config.base_url, self.config.charge_type
        );
        let request = self
            .http
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .json(charge);
        let resp = self.http.send_with_retry(request).await?;
        let http_status = resp.status();
        let body: GatewayResponse = resp.json().await.context("decode gateway response")?;
        debug!(tx_ref = %charge.tx_ref, %http_status, status = %body.status, "charge response");

        let accepted = http_status.is_success() && body.status == "success";
        let message = body.message.unwrap_or_else(|| body.status.clone());
        Ok(ChargeOutcome {
            accepted,
            provider_tx_id: body.data.and_then(|d| d.id).map(|id| id.to_string()),
            message,
        })
    }
}

/// Merchant transaction reference sent to the gateway and echoed back by
/// the webhook.
pub fn new_tx_ref() -> String {
    format!("OFSH-{:016x}", rand::random::<u64>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_ref_has_prefix_and_hex_tail() {
        let tx_ref = new_tx_ref();
        assert!(tx_ref.starts_with("OFSH-"));
        assert_eq!(tx_ref.len(), "OFSH-".len() + 16);
        assert!(tx_ref["OFSH-".len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tx_refs_do_not_repeat() {
        assert_ne!(new_tx_ref(), new_tx_ref());
    }

    #[test]
    fn charge_request_serializes_gateway_field_names() {
        let charge = ChargeRequest {
            tx_ref: "OFSH-abc".into(),
            amount: 170_000,
            currency: "UGX".into(),
            phone_number: "+256700000001".into(),
            email: "user@example.com".into(),
        };
        let json = serde_json::to_string(&charge).unwrap();
        assert!(json.contains("\"tx_ref\":\"OFSH-abc\""));
        assert!(json.contains("\"phone_number\""));
    }
}
