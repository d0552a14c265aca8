//! User-related types for the inventory engine
//!
//! Users own a monetary balance that only the engine mutates, and carry a
//! role that gates catalog administration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Authorization role of a user
///
/// A closed set: every authorization decision is an exhaustive `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer
    #[default]
    User,
    /// Catalog administrator
    Admin,
}

impl Role {
    /// Whether this role may create or delete catalog items
    pub fn can_manage_catalog(self) -> bool {
        match self {
            Role::Admin => true,
            Role::User => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role '{}'", other)),
        }
    }
}

/// Registered user row
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,

    /// Unique login name
    pub username: String,

    pub display_name: String,

    /// Opaque credential hash, produced and checked by the authentication layer
    pub credential_hash: String,

    /// Spendable balance
    ///
    /// Never negative. Only debited inside engine transactions.
    pub balance: Decimal,

    pub role: Role,
}

impl User {
    /// Create a user with the given balance and the default `user` role
    pub fn new(id: UserId, username: impl Into<String>, balance: Decimal) -> Self {
        let username = username.into();
        User {
            id,
            display_name: username.clone(),
            username,
            credential_hash: String::new(),
            balance,
            role: Role::User,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Input for registering a user through the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub credential_hash: String,
    pub balance: Decimal,
    pub role: Role,
}
