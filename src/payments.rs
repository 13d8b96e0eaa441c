//! Payment-processor collaborator.
//!
//! The real platform talks to an external processor; this crate only
//! depends on the narrow interface below. The demo implementation mints
//! invoice ids locally and records the charge in the log.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::Identity;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeReceipt {
    pub invoice_id: String,
    pub amount_cents: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync + 'static {
    async fn create_charge(
        &self,
        identity: &Identity,
        amount_cents: i64,
        currency: &str,
    ) -> Result<ChargeReceipt, AppError>;
}

/// Demo processor: accepts every charge and mints a local invoice id
#[derive(Default)]
pub struct DemoPaymentProcessor;

#[async_trait]
impl PaymentProcessor for DemoPaymentProcessor {
    async fn create_charge(
        &self,
        identity: &Identity,
        amount_cents: i64,
        currency: &str,
    ) -> Result<ChargeReceipt, AppError> {
        if amount_cents <= 0 {
            return Err(AppError::Validation(
                "amount must be positive".to_string(),
            ));
        }

        let receipt = ChargeReceipt {
            invoice_id: format!("inv_{}", Uuid::new_v4().simple()),
            amount_cents,
            currency: currency.to_string(),
        };

        tracing::info!(
            user_id = %identity.id,
            invoice_id = %receipt.invoice_id,
            amount_cents,
            currency,
            "Charge created"
        );
        Ok(receipt)
    }
}
