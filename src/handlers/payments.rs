use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::context::PaymentsContext;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::payments::{ChargeReceipt, PaymentProcessor};

fn default_currency() -> String {
    "usd".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChargeRequest {
    pub amount_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// POST /payments/charge (role-gated at the router)
pub async fn create_charge(
    State(ctx): State<Arc<PaymentsContext>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateChargeRequest>,
) -> AppResult<Json<ChargeReceipt>> {
    let receipt = ctx
        .payments
        .create_charge(&user, request.amount_cents, &request.currency)
        .await?;
    Ok(Json(receipt))
}
