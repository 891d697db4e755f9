// crates/approle-verify-core/src/core/variables.rs
// ============================================================================
// Module: Module Input Variables
// Description: Typed input-variable set accepted by the module under test.
// Purpose: Serialize variable overlays into the engine's vars-file format.
// Dependencies: serde, crate::core::role
// ============================================================================

//! ## Overview
//! `RoleVariables` is the full input surface of the module under test.
//! Every field except the component and deployment identifier is optional;
//! unset fields are omitted from the serialized vars file so the engine
//! and resource schema supply their own defaults. No validation happens
//! here: invalid combinations are rejected downstream by the resource
//! schema.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::role::TokenType;

// ============================================================================
// SECTION: Variables
// ============================================================================

/// Input variables for one plan or apply invocation.
///
/// # Invariants
/// - Immutable once merged for a given invocation; overlays produce a new
///   value rather than mutating a shared one.
/// - Serialization omits unset fields entirely (absent, not null).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleVariables {
    /// Component owning the role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Deployment identifier scoping the role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_identifier: Option<String>,
    /// Explicit role name override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    /// Prefix joined ahead of the derived role name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_name_prefix: Option<String>,
    /// Backend path the role is created under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Incremental token time-to-live, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_ttl: Option<u64>,
    /// Maximum token time-to-live, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_max_ttl: Option<u64>,
    /// Hard cap on token lifetime, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_explicit_max_ttl: Option<u64>,
    /// Number of uses permitted per token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_num_uses: Option<u64>,
    /// Period for periodic tokens, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_period: Option<u64>,
    /// Policies attached to issued tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_policies: Option<Vec<String>>,
    /// Token issuance mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<TokenType>,
    /// CIDR blocks token use is restricted to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_bound_cidrs: Option<Vec<String>>,
    /// Whether a secret identifier must be presented at login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_secret_id: Option<bool>,
    /// Time-to-live for issued secret identifiers, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_id_ttl: Option<u64>,
    /// Number of uses permitted per secret identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_id_num_uses: Option<u64>,
    /// CIDR blocks secret-identifier use is restricted to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_id_bound_cidrs: Option<Vec<String>>,
    /// CIDR list for the default secret identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_secret_id_cidr_list: Option<Vec<String>>,
}

impl RoleVariables {
    /// Overlays `other` on top of `self`, field by field.
    ///
    /// Set fields in `other` win; unset fields retain the receiver's value.
    #[must_use]
    pub fn overlaid(mut self, other: &Self) -> Self {
        overlay(&mut self.component, &other.component);
        overlay(&mut self.deployment_identifier, &other.deployment_identifier);
        overlay(&mut self.role_name, &other.role_name);
        overlay(&mut self.role_name_prefix, &other.role_name_prefix);
        overlay(&mut self.backend, &other.backend);
        overlay(&mut self.token_ttl, &other.token_ttl);
        overlay(&mut self.token_max_ttl, &other.token_max_ttl);
        overlay(&mut self.token_explicit_max_ttl, &other.token_explicit_max_ttl);
        overlay(&mut self.token_num_uses, &other.token_num_uses);
        overlay(&mut self.token_period, &other.token_period);
        overlay(&mut self.token_policies, &other.token_policies);
        overlay(&mut self.token_type, &other.token_type);
        overlay(&mut self.token_bound_cidrs, &other.token_bound_cidrs);
        overlay(&mut self.bind_secret_id, &other.bind_secret_id);
        overlay(&mut self.secret_id_ttl, &other.secret_id_ttl);
        overlay(&mut self.secret_id_num_uses, &other.secret_id_num_uses);
        overlay(&mut self.secret_id_bound_cidrs, &other.secret_id_bound_cidrs);
        overlay(&mut self.default_secret_id_cidr_list, &other.default_secret_id_cidr_list);
        self
    }
}

/// Replaces `base` with a clone of `over` when `over` is set.
fn overlay<T: Clone>(base: &mut Option<T>, over: &Option<T>) {
    if let Some(value) = over {
        *base = Some(value.clone());
    }
}
