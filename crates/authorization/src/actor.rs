//! Actors - role-bearing identities that act on transfers

use corebank_core::{Amount, UserId};
use serde::{Deserialize, Serialize};

/// Bank user roles.
///
/// Resolution priority when one user carries several profiles is the
/// declaration order here: Person, then Manager, then Accountant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Retail customer; authorizes own transfers with PIN+OTP, no limit
    Person,
    /// Bank officer; may approve transfers up to an optional per-transfer limit
    Manager,
    /// Back-office accountant; may create and view but never authorize
    Accountant,
}

impl Role {
    /// Roles in directory-resolution priority order
    pub const PRIORITY: [Role; 3] = [Role::Person, Role::Manager, Role::Accountant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Person => "Person",
            Role::Manager => "Manager",
            Role::Accountant => "Accountant",
        }
    }
}

/// A role-bearing identity.
///
/// `transfer_limit` is expressed in the reference currency (BGN) and only
/// ever set on managers. `pin` is present on persons and managers; the
/// credential submitted to authorize a transfer is `pin ‖ otp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,

    /// Per-transfer approval ceiling in BGN; None means unlimited
    pub transfer_limit: Option<Amount>,

    /// Authorization secret; None for roles that cannot authorize
    pub pin: Option<String>,

    /// SMS destination for OTP delivery
    pub mobile_phone: Option<String>,
}

impl Actor {
    /// A retail customer
    pub fn person(
        user_id: impl Into<UserId>,
        pin: impl Into<String>,
        mobile_phone: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Person,
            transfer_limit: None,
            pin: Some(pin.into()),
            mobile_phone: Some(mobile_phone.into()),
        }
    }

    /// A bank officer with an optional per-transfer limit in BGN
    pub fn manager(
        user_id: impl Into<UserId>,
        pin: impl Into<String>,
        transfer_limit: Option<Amount>,
        mobile_phone: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Manager,
            transfer_limit,
            pin: Some(pin.into()),
            mobile_phone: Some(mobile_phone.into()),
        }
    }

    /// A back-office accountant (create/view only)
    pub fn accountant(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Accountant,
            transfer_limit: None,
            pin: None,
            mobile_phone: None,
        }
    }
}
