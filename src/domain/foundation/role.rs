//! User roles and their capabilities.
//!
//! Role is a closed tagged variant; every role-gated operation asks a
//! capability method here instead of comparing strings at the call site.

use serde::{Deserialize, Serialize};

/// Role assigned to a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Seller,
    Buyer,
    Moderator,
}

impl UserRole {
    /// True for the admin role only.
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Seller-gated operations. Admin automatically satisfies the gate.
    pub fn can_sell(&self) -> bool {
        matches!(self, UserRole::Seller | UserRole::Admin)
    }

    /// Moderation surface (report handling). Admin satisfies the gate.
    pub fn can_moderate(&self) -> bool {
        matches!(self, UserRole::Moderator | UserRole::Admin)
    }

    /// Stable wire representation, matching the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Seller => "seller",
            UserRole::Buyer => "buyer",
            UserRole::Moderator => "moderator",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Buyer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_satisfies_every_gate() {
        assert!(UserRole::Admin.is_admin());
        assert!(UserRole::Admin.can_sell());
        assert!(UserRole::Admin.can_moderate());
    }

    #[test]
    fn seller_can_sell_but_not_administrate() {
        assert!(UserRole::Seller.can_sell());
        assert!(!UserRole::Seller.is_admin());
        assert!(!UserRole::Seller.can_moderate());
    }

    #[test]
    fn buyer_has_no_elevated_capabilities() {
        assert!(!UserRole::Buyer.can_sell());
        assert!(!UserRole::Buyer.can_moderate());
        assert!(!UserRole::Buyer.is_admin());
    }

    #[test]
    fn moderator_moderates_without_selling() {
        assert!(UserRole::Moderator.can_moderate());
        assert!(!UserRole::Moderator.can_sell());
    }

    #[test]
    fn default_role_is_buyer() {
        assert_eq!(UserRole::default(), UserRole::Buyer);
    }
}
