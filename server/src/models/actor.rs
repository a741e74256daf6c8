use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is calling. Authentication happens upstream; the engine only
/// authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Actor {
    Guest { guest_id: Uuid },
    Admin,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin)
    }

    /// Administrators may act on any reservation, guests only on their own.
    pub fn may_act_for(&self, guest_id: Uuid) -> bool {
        match self {
            Actor::Admin => true,
            Actor::Guest { guest_id: own } => *own == guest_id,
        }
    }
}
