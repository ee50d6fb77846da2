//! Authorization decisions for cart operations
use std::str::FromStr;

use crate::error::CartError;
use crate::request::Operation;

pub const DEFAULT_PRIVILEGED_IDENTITY: &str = "developer";

/// Who is calling. `Anonymous` when the transport could not resolve an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Identity(String),
}

impl Caller {
    pub fn identity(name: impl Into<String>) -> Self {
        Caller::Identity(name.into())
    }

    fn is(&self, name: &str) -> bool {
        matches!(self, Caller::Identity(id) if id == name)
    }
}

impl From<Option<&str>> for Caller {
    fn from(value: Option<&str>) -> Self {
        match value {
            Some(id) if !id.is_empty() => Caller::Identity(id.to_string()),
            _ => Caller::Anonymous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// `setState` is reserved for the privileged identity under both variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PolicyVariant {
    /// Deny everything except `setState` by the privileged identity.
    Strict,
    /// Allow every other operation for any caller.
    #[default]
    Permissive,
}

impl FromStr for PolicyVariant {
    type Err = CartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(PolicyVariant::Strict),
            "permissive" => Ok(PolicyVariant::Permissive),
            other => Err(CartError::Config(format!("unknown policy variant {other:?}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    privileged: String,
    variant: PolicyVariant,
}

impl AccessPolicy {
    pub fn new(privileged: impl Into<String>, variant: PolicyVariant) -> Self {
        Self {
            privileged: privileged.into(),
            variant,
        }
    }

    pub fn variant(&self) -> PolicyVariant {
        self.variant
    }

    pub fn decide(&self, caller: &Caller, operation: Operation) -> Decision {
        let privileged = caller.is(&self.privileged);

        match (operation, self.variant) {
            (Operation::SetState, _) if privileged => Decision::Allow,
            (Operation::SetState, _) => Decision::Deny,
            (_, PolicyVariant::Permissive) => Decision::Allow,
            (_, PolicyVariant::Strict) => Decision::Deny,
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PRIVILEGED_IDENTITY, PolicyVariant::default())
    }
}
