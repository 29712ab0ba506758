use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::payments::repo::{Payment, PaymentStatus};

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub request_id: Uuid,
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub request_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub phone: String,
    pub tx_ref: String,
    pub provider_tx_id: Option<String>,
    pub status: PaymentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            request_id: p.request_id,
            amount: p.amount,
            currency: p.currency,
            phone: p.phone,
            tx_ref: p.tx_ref,
            provider_tx_id: p.provider_tx_id,
            status: p.status,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Gateway callback body. Only `charge.completed` events are acted on.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    pub data: Option<WebhookData>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub tx_ref: String,
    pub status: Option<String>,
    pub id: Option<i64>,
}

pub fn webhook_status(provider_status: &str) -> PaymentStatus {
    if provider_status.eq_ignore_ascii_case("successful") {
        PaymentStatus::Successful
    } else {
        PaymentStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_status_maps_to_payment_status() {
        assert_eq!(webhook_status("successful"), PaymentStatus::Successful);
        assert_eq!(webhook_status("SUCCESSFUL"), PaymentStatus::Successful);
        assert_eq!(webhook_status("failed"), PaymentStatus::Failed);
        assert_eq!(webhook_status("voided"), PaymentStatus::Failed);
        assert_eq!(webhook_status(""), PaymentStatus::Failed);
    }

    #[test]
    fn webhook_payload_tolerates_missing_data() {
        let payload: WebhookPayload =
            serde_json::from_str(r#"{"event":"charge.completed"}"#).unwrap();
        assert!(payload.data.is_none());

        let payload: WebhookPayload = serde_json::from_str(
            r#"{"event":"charge.completed","data":{"tx_ref":"OFSH-1","status":"successful","id":42}}"#,
        )
        .unwrap();
        let data = payload.data.unwrap();
        assert_eq!(data.tx_ref, "OFSH-1");
        assert_eq!(data.id, Some(42));
    }
}
