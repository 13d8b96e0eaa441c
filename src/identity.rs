use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stores::User;

/// A verified user, as seen by every service except the authority.
///
/// Never contains the password hash; that stays on the authority-side
/// `User` record. An `Identity` only ever reaches a request context after
/// both authentication and authorization succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    /// Unordered set of role names; empty means no elevated roles
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Identity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            roles: user.roles.iter().cloned().collect(),
        }
    }
}
