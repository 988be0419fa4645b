//! Payment initiator mocks.

use std::sync::Mutex;

use async_trait::async_trait;
use bazaar_ordering::application::ports::{
    PaymentError, PaymentInitiator, PaymentRedirect, PaymentRequest,
};

/// A payment initiator that records requests and redirects to a fixed page.
#[derive(Debug, Default)]
pub struct RecordingPaymentInitiator {
    requests: Mutex<Vec<PaymentRequest>>,
}

impl RecordingPaymentInitiator {
    /// Creates an initiator with no recorded requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every request received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentInitiator for RecordingPaymentInitiator {
    async fn initiate_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentRedirect, PaymentError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(PaymentRedirect {
            redirect_url: format!("https://pay.example.test/session/{}", request.order_id),
        })
    }
}

/// A payment initiator whose gateway is always down.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePaymentInitiator;

#[async_trait]
impl PaymentInitiator for UnavailablePaymentInitiator {
    async fn initiate_payment(
        &self,
        _request: &PaymentRequest,
    ) -> Result<PaymentRedirect, PaymentError> {
        Err(PaymentError::Unavailable("gateway timed out".to_owned()))
    }
}
