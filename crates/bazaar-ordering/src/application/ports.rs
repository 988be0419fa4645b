//! Collaborator contracts consumed by the Ordering & Fulfillment context.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// What the payment collaborator needs to start a card payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    /// The order being paid.
    pub order_id: Uuid,
    /// Amount to charge.
    pub amount: Decimal,
    /// ISO currency code.
    pub currency: String,
    /// Buyer's email, for the gateway receipt.
    pub buyer_email: String,
    /// Statement description.
    pub description: String,
}

/// Where to send the buyer to complete payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRedirect {
    /// Gateway page URL.
    pub redirect_url: String,
}

/// Failure reported by the payment collaborator.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The gateway refused the request.
    #[error("payment gateway rejected the request: {0}")]
    Rejected(String),

    /// The gateway could not be reached.
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// Starts card payments. Protocol details belong to the collaborator.
#[async_trait]
pub trait PaymentInitiator: Send + Sync {
    /// Requests a payment session and returns the buyer redirect.
    async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentRedirect, PaymentError>;
}

/// A payment initiator that builds a redirect to a hosted payment page
/// without calling out. Used until a gateway adapter is configured.
#[derive(Debug, Clone)]
pub struct HostedPagePaymentInitiator {
    base_url: String,
}

impl HostedPagePaymentInitiator {
    /// Creates an initiator redirecting to `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PaymentInitiator for HostedPagePaymentInitiator {
    async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentRedirect, PaymentError> {
        if request.amount <= Decimal::ZERO {
            return Err(PaymentError::Rejected(format!(
                "amount must be positive, got {}",
                request.amount
            )));
        }
        Ok(PaymentRedirect {
            redirect_url: format!(
                "{}/checkout/{}?amount={}&currency={}",
                self.base_url.trim_end_matches('/'),
                request.order_id,
                request.amount,
                request.currency
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount: &str) -> PaymentRequest {
        PaymentRequest {
            order_id: Uuid::nil(),
            amount: amount.parse().unwrap(),
            currency: "RON".into(),
            buyer_email: "ioana@example.ro".into(),
            description: "Bazaar order".into(),
        }
    }

    #[tokio::test]
    async fn test_hosted_page_redirect_embeds_order_and_amount() {
        let initiator = HostedPagePaymentInitiator::new("https://pay.example.test/");

        let redirect = initiator.initiate_payment(&request("130.00")).await.unwrap();

        assert_eq!(
            redirect.redirect_url,
            "https://pay.example.test/checkout/00000000-0000-0000-0000-000000000000?amount=130.00&currency=RON"
        );
    }

    #[tokio::test]
    async fn test_hosted_page_rejects_zero_amount() {
        let initiator = HostedPagePaymentInitiator::new("https://pay.example.test");

        let result = initiator.initiate_payment(&request("0")).await;

        assert!(matches!(result, Err(PaymentError::Rejected(_))));
    }
}
