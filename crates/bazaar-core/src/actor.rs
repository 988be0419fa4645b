//! The party issuing a command.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is performing an operation. Identity is asserted by the upstream
/// authentication collaborator; this crate only checks roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Actor {
    /// A signed-in buyer.
    Buyer(Uuid),
    /// A seller acting on their own shipments.
    Vendor(Uuid),
    /// Marketplace staff or a trusted system collaborator.
    Admin,
    /// An anonymous shopper.
    Guest,
}

impl Actor {
    /// Returns the buyer id when the actor is a signed-in buyer.
    #[must_use]
    pub fn buyer_id(&self) -> Option<Uuid> {
        match self {
            Self::Buyer(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns `true` if the actor is marketplace staff.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buyer(id) => write!(f, "buyer:{id}"),
            Self::Vendor(id) => write!(f, "vendor:{id}"),
            Self::Admin => f.write_str("admin"),
            Self::Guest => f.write_str("guest"),
        }
    }
}
