//! Role elevation policies evaluated at registration time.
//!
//! The shared-secret policy mirrors a deploy-time admin code: there is no audit
//! trail and the secret can only be rotated by redeploying. Stronger workflows
//! plug in through [`ElevationApprover`] without touching the session state
//! machine.

use std::fmt;
use std::sync::Arc;

use subtle::ConstantTimeEq;

use crate::model::Role;

/// Decides whether a registration's privilege claim grants `admin`.
pub trait ElevationApprover: Send + Sync {
    /// Return `true` to register `identity` as an admin.
    fn approve(&self, identity: &str, claim: &str) -> bool;
}

/// Strategy used to pick the role of a new account.
#[derive(Clone, Default)]
pub enum ElevationPolicy {
    /// Every account is a `user`.
    #[default]
    NoElevation,
    /// A claim equal to the server-held secret grants `admin`.
    SharedSecret(String),
    /// An external approver decides.
    Approval(Arc<dyn ElevationApprover>),
}

impl ElevationPolicy {
    /// Build a shared-secret policy, or [`Self::NoElevation`] when the secret is blank.
    #[must_use]
    pub fn shared_secret(secret: Option<String>) -> Self {
        secret
            .filter(|value| !value.trim().is_empty())
            .map_or(Self::NoElevation, Self::SharedSecret)
    }

    /// Resolve the role granted to `identity` for the supplied claim.
    #[must_use]
    pub fn resolve_role(&self, identity: &str, claim: Option<&str>) -> Role {
        let Some(claim) = claim.filter(|value| !value.is_empty()) else {
            return Role::User;
        };
        let approved = match self {
            Self::NoElevation => false,
            Self::SharedSecret(secret) => {
                !secret.is_empty() && bool::from(secret.as_bytes().ct_eq(claim.as_bytes()))
            }
            Self::Approval(approver) => approver.approve(identity, claim),
        };
        if approved { Role::Admin } else { Role::User }
    }
}

impl fmt::Debug for ElevationPolicy {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoElevation => formatter.write_str("NoElevation"),
            Self::SharedSecret(_) => formatter.write_str("SharedSecret(<redacted>)"),
            Self::Approval(_) => formatter.write_str("Approval(..)"),
        }
    }
}
