use std::sync::Arc;

use crate::auth_client::AuthClient;
use crate::authority::AuthorityCore;
use crate::config::Config;
use crate::notifications::{Mailer, NotificationQueue};
use crate::payments::PaymentProcessor;
use crate::stores::ReservationStore;

/// Guard dependencies shared by every protected service
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub auth_client: Arc<AuthClient>,
}

impl AppContext {
    pub fn new(config: Arc<Config>, auth_client: Arc<AuthClient>) -> Self {
        Self {
            config,
            auth_client,
        }
    }
}

/// Reservations-service context
#[derive(Clone)]
pub struct ReservationsContext {
    pub app: Arc<AppContext>,
    pub reservations: Arc<dyn ReservationStore>,
    pub payments: Arc<dyn PaymentProcessor>,
    /// Best-effort email queue; reservations still succeed when absent
    pub notifications: Option<NotificationQueue>,
}

/// Payments-service context
#[derive(Clone)]
pub struct PaymentsContext {
    pub app: Arc<AppContext>,
    pub payments: Arc<dyn PaymentProcessor>,
}

/// Notifications-service context
#[derive(Clone)]
pub struct NotificationsContext {
    pub app: Arc<AppContext>,
    pub mailer: Arc<dyn Mailer>,
}

/// Auth-service context (the authority does not guard itself)
#[derive(Clone)]
pub struct AuthorityContext {
    pub config: Arc<Config>,
    pub core: Arc<AuthorityCore>,
}
