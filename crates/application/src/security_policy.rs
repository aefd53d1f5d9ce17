use warden_domain::{AccessDecision, AccessLevel};

/// Policy applied to the empty session context.
///
/// The empty context never reaches persistence. With security enabled it is
/// always denied; with security disabled it holds `disabled_access_level` for
/// every scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityPolicy {
    /// Whether authentication is required.
    pub security_enabled: bool,
    /// Level granted to the empty context while security is disabled.
    pub disabled_access_level: AccessLevel,
}

impl SecurityPolicy {
    /// Policy with security enforced.
    #[must_use]
    pub fn enforced() -> Self {
        Self {
            security_enabled: true,
            disabled_access_level: AccessLevel::None,
        }
    }

    /// Policy with security disabled, granting `access_level` to the empty context.
    #[must_use]
    pub fn disabled(access_level: AccessLevel) -> Self {
        Self {
            security_enabled: false,
            disabled_access_level: access_level,
        }
    }

    pub(crate) fn empty_session_decision(&self, required_level: AccessLevel) -> AccessDecision {
        if self.security_enabled {
            return AccessDecision::deny(AccessLevel::None);
        }

        let granted = self.disabled_access_level;
        if granted.satisfies(required_level) {
            AccessDecision::allow(granted, Default::default())
        } else {
            AccessDecision::deny(granted)
        }
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self::enforced()
    }
}
