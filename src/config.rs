//! Runtime configuration.
//!
//! Names the collection and the managed fields the sync layer reads and
//! writes, plus the ownership policy for update/delete.

use std::str::FromStr;

use thiserror::Error;

use crate::collection::ItemSchema;

/// Environment variable overriding the collection name.
pub const ENV_COLLECTION: &str = "LIVESYNC_COLLECTION";
/// Environment variable overriding the owner field name.
pub const ENV_OWNER_FIELD: &str = "LIVESYNC_OWNER_FIELD";
/// Environment variable overriding the creation timestamp field name.
pub const ENV_CREATED_FIELD: &str = "LIVESYNC_CREATED_FIELD";
/// Environment variable overriding the update timestamp field name.
pub const ENV_UPDATED_FIELD: &str = "LIVESYNC_UPDATED_FIELD";
/// Environment variable selecting the ownership check (`store` or `local`).
pub const ENV_OWNERSHIP_CHECK: &str = "LIVESYNC_OWNERSHIP_CHECK";
/// Environment variable with the fallback log directive.
pub const ENV_LOG: &str = "LIVESYNC_LOG";

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A name was set to an empty string.
    #[error("configuration value '{key}' must not be empty")]
    EmptyValue { key: String },

    /// Two managed fields share a name.
    #[error("field name '{name}' is used for more than one managed field")]
    DuplicateField { name: String },

    /// Unknown ownership check mode.
    #[error("unknown ownership check '{value}' (expected 'store' or 'local')")]
    InvalidOwnershipCheck { value: String },
}

/// Who is responsible for refusing writes to items the user does not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnershipCheck {
    /// Writes go straight to the store; its security rules decide.
    #[default]
    Store,
    /// Update/delete are refused locally unless the item is in the
    /// current user's live view.
    Local,
}

impl FromStr for OwnershipCheck {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "store" => Ok(OwnershipCheck::Store),
            "local" => Ok(OwnershipCheck::Local),
            _ => Err(ConfigError::InvalidOwnershipCheck {
                value: s.to_string(),
            }),
        }
    }
}

/// Configuration for the session and collection layers.
///
/// Use the builder methods to customize.
///
/// # Example
///
/// ```ignore
/// use livesync::config::{OwnershipCheck, SyncConfig};
///
/// let config = SyncConfig::default()
///     .with_collection("notes")
///     .with_ownership_check(OwnershipCheck::Local);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Collection holding the items (default: `items`)
    pub collection: String,
    /// Field carrying the owning user id (default: `userId`)
    pub owner_field: String,
    /// Creation timestamp field, also the sort key (default: `createdAt`)
    pub created_field: String,
    /// Last-update timestamp field (default: `updatedAt`)
    pub updated_field: String,
    /// Ownership enforcement for update/delete (default: store rules)
    pub ownership_check: OwnershipCheck,
    /// Log directive used when `RUST_LOG` is unset (default: `livesync=info`)
    pub log_directive: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            collection: "items".to_string(),
            owner_field: "userId".to_string(),
            created_field: "createdAt".to_string(),
            updated_field: "updatedAt".to_string(),
            ownership_check: OwnershipCheck::Store,
            log_directive: "livesync=info".to_string(),
        }
    }
}

impl SyncConfig {
    /// Create a new SyncConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the collection name.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Set the owner field name.
    pub fn with_owner_field(mut self, field: impl Into<String>) -> Self {
        self.owner_field = field.into();
        self
    }

    /// Set the creation timestamp field name.
    pub fn with_created_field(mut self, field: impl Into<String>) -> Self {
        self.created_field = field.into();
        self
    }

    /// Set the update timestamp field name.
    pub fn with_updated_field(mut self, field: impl Into<String>) -> Self {
        self.updated_field = field.into();
        self
    }

    /// Set the ownership check mode.
    pub fn with_ownership_check(mut self, check: OwnershipCheck) -> Self {
        self.ownership_check = check;
        self
    }

    /// Set the fallback log directive.
    pub fn with_log_directive(mut self, directive: impl Into<String>) -> Self {
        self.log_directive = directive.into();
        self
    }

    /// Build config from `LIVESYNC_*` environment variables on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var(ENV_COLLECTION) {
            config.collection = value;
        }
        if let Ok(value) = std::env::var(ENV_OWNER_FIELD) {
            config.owner_field = value;
        }
        if let Ok(value) = std::env::var(ENV_CREATED_FIELD) {
            config.created_field = value;
        }
        if let Ok(value) = std::env::var(ENV_UPDATED_FIELD) {
            config.updated_field = value;
        }
        if let Ok(value) = std::env::var(ENV_OWNERSHIP_CHECK) {
            config.ownership_check = value.parse()?;
        }
        if let Ok(value) = std::env::var(ENV_LOG) {
            config.log_directive = value;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject empty names and managed fields that collide.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("collection", &self.collection),
            ("owner_field", &self.owner_field),
            ("created_field", &self.created_field),
            ("updated_field", &self.updated_field),
        ];
        for (key, value) in named {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyValue {
                    key: key.to_string(),
                });
            }
        }

        let fields = [&self.owner_field, &self.created_field, &self.updated_field];
        for (i, name) in fields.iter().enumerate() {
            if fields[i + 1..].contains(name) {
                return Err(ConfigError::DuplicateField {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Collection and field layout derived from this config.
    pub fn schema(&self) -> ItemSchema {
        ItemSchema {
            collection: self.collection.clone(),
            owner_field: self.owner_field.clone(),
            created_field: self.created_field.clone(),
            updated_field: self.updated_field.clone(),
        }
    }
}
