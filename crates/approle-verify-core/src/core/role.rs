// crates/approle-verify-core/src/core/role.rs
// ============================================================================
// Module: Role Definition
// Description: Realized role definition as reported by the secret service.
// Purpose: Provide the typed attribute set live assertions run against.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A role definition is the credential-issuance policy the module
//! provisions. The service reports realized values: durations and counters
//! collapse to zero when unset, and list attributes collapse to empty
//! lists. Name uniqueness within a backend path is enforced by the service,
//! not by this type.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Token Type
// ============================================================================

/// Token issuance mode attached to the role.
///
/// # Invariants
/// - Wire form is the lowercase variant name, matching the service API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Service-default token behavior.
    #[default]
    Default,
    /// Renewable service tokens.
    Service,
    /// Non-renewable batch tokens.
    Batch,
}

impl TokenType {
    /// Returns the stable wire string for the token type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Service => "service",
            Self::Batch => "batch",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Role Definition
// ============================================================================

/// Realized role definition attributes.
///
/// # Invariants
/// - Zero durations and counters mean "service default / unlimited"; the
///   distinction between unset and explicit zero is not recoverable here.
/// - Created by apply, destroyed by destroy; mutated only by re-apply with
///   changed variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Incremental time-to-live for issued tokens, in seconds.
    #[serde(default)]
    pub token_ttl: u64,
    /// Maximum time-to-live for issued tokens, in seconds.
    #[serde(default)]
    pub token_max_ttl: u64,
    /// Hard cap on token lifetime, in seconds.
    #[serde(default)]
    pub token_explicit_max_ttl: u64,
    /// Number of uses permitted per token (zero = unlimited).
    #[serde(default)]
    pub token_num_uses: u64,
    /// Period for periodic tokens, in seconds.
    #[serde(default)]
    pub token_period: u64,
    /// Policies attached to issued tokens.
    #[serde(default)]
    pub token_policies: Vec<String>,
    /// Token issuance mode.
    #[serde(default)]
    pub token_type: TokenType,
    /// CIDR blocks token use is restricted to.
    #[serde(default)]
    pub token_bound_cidrs: Vec<String>,
    /// Whether a secret identifier must be presented at login.
    #[serde(default)]
    pub bind_secret_id: bool,
    /// Time-to-live for issued secret identifiers, in seconds.
    #[serde(default)]
    pub secret_id_ttl: u64,
    /// Number of uses permitted per secret identifier (zero = unlimited).
    #[serde(default)]
    pub secret_id_num_uses: u64,
    /// CIDR blocks secret-identifier use is restricted to.
    #[serde(default)]
    pub secret_id_bound_cidrs: Vec<String>,
}
