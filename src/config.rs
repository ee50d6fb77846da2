//! Service configuration from defaults or environment variables.
use std::env;
use std::path::PathBuf;

use crate::error::CartError;
use crate::policy::{AccessPolicy, DEFAULT_PRIVILEGED_IDENTITY, PolicyVariant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Directory of the sled database
    pub db_path: PathBuf,

    /// The only identity allowed to call `setState`
    pub privileged_identity: String,

    /// Which authorization variant applies to the other operations
    pub policy: PolicyVariant,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("cart.db"),
            privileged_identity: DEFAULT_PRIVILEGED_IDENTITY.to_string(),
            policy: PolicyVariant::default(),
        }
    }
}

impl CartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CART_DB_PATH`: database directory (default: cart.db)
    /// - `CART_PRIVILEGED_IDENTITY`: identity allowed to set state (default: developer)
    /// - `CART_POLICY`: `strict` or `permissive` (default: permissive)
    pub fn from_env() -> Result<Self, CartError> {
        let defaults = Self::default();

        let privileged_identity = env::var("CART_PRIVILEGED_IDENTITY")
            .unwrap_or(defaults.privileged_identity);
        if privileged_identity.is_empty() {
            return Err(CartError::Config(
                "CART_PRIVILEGED_IDENTITY must not be empty".into(),
            ));
        }

        let policy = match env::var("CART_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.policy,
        };

        Ok(Self {
            db_path: env::var("CART_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            privileged_identity,
            policy,
        })
    }

    pub fn set_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }
    pub fn set_privileged_identity(mut self, identity: impl Into<String>) -> Self {
        self.privileged_identity = identity.into();
        self
    }
    pub fn set_policy(mut self, policy: PolicyVariant) -> Self {
        self.policy = policy;
        self
    }

    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy::new(self.privileged_identity.clone(), self.policy)
    }
}
