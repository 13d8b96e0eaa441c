use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use crate::context::NotificationsContext;
use crate::error::AppResult;
use crate::notifications::Mailer;
use crate::extractors::CurrentUser;
use crate::wire::EmailNotification;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// POST /notifications/email
///
/// Direct-send frontend; bulk traffic goes through the queue worker.
pub async fn send_email(
    State(ctx): State<Arc<NotificationsContext>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SendEmailRequest>,
) -> AppResult<impl IntoResponse> {
    let notification = EmailNotification {
        to: request.to,
        subject: request.subject,
        body: request.body,
    };

    ctx.mailer
        .send(&notification)
        .await
        .map_err(crate::error::AppError::Internal)?;

    tracing::debug!(requested_by = %user.id, "Email sent on request");
    Ok(StatusCode::ACCEPTED)
}
