use crate::dto::ConfirmPaymentRequest;
use crate::error::{SettlementError, SettlementResult};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{info, warn};

/// External card/payment processor confirming a recharge before it commits.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn confirm(
        &self,
        payment_key: &str,
        order_id: &str,
        amount_in_local: Decimal,
    ) -> SettlementResult<()>;
}

pub struct HttpPaymentGateway {
    client: reqwest::Client,
    confirm_url: String,
    secret_key: String,
}

impl HttpPaymentGateway {
    pub fn new(client: reqwest::Client, confirm_url: String, secret_key: String) -> Self {
        HttpPaymentGateway {
            client,
            confirm_url,
            secret_key,
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn confirm(
        &self,
        payment_key: &str,
        order_id: &str,
        amount_in_local: Decimal,
    ) -> SettlementResult<()> {
        let request = ConfirmPaymentRequest::new(
            payment_key.to_owned(),
            order_id.to_owned(),
            amount_in_local.normalize().to_string(),
        );
        let result = self
            .client
            .post(&self.confirm_url)
            .basic_auth(&self.secret_key, Some(""))
            .json(&request)
            .header("User-Agent", "SoM Settlement")
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!("Payment {} confirmed for order {}", payment_key, order_id);
                Ok(())
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let error_message = format!("Code: {}. Gateway error: {}", status, body);
                warn!("{}", error_message);
                Err(SettlementError::PaymentConfirmationFailed(error_message))
            }
            Err(error) => {
                let error_message = format!("Gateway request error: {}", error);
                warn!("{}", error_message);
                Err(SettlementError::PaymentConfirmationFailed(error_message))
            }
        }
    }
}
