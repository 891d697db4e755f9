// crates/approle-verify-core/src/core/secret_id.rs
// ============================================================================
// Module: Secret Identifier Model
// Description: Secret-identifier properties and structured metadata.
// Purpose: Type the default secret identifier the module creates per role.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every applied role carries exactly one default secret identifier. Its
//! metadata is modeled as a structured record with the three keys the
//! module always writes, plus a flattened extension map so unknown keys
//! round-trip through serialization unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Metadata
// ============================================================================

/// Metadata attached to a secret identifier.
///
/// # Invariants
/// - The default secret identifier always carries `component`,
///   `deployment_identifier`, and `label = "default"`.
/// - Unknown keys are preserved in `extra` and re-serialized verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretIdMetadata {
    /// Component owning the associated role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Deployment identifier scoping the associated role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_identifier: Option<String>,
    /// Free-form label; the module writes `default`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Extension keys carried through unchanged.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

// ============================================================================
// SECTION: Properties
// ============================================================================

/// Properties of a secret identifier as reported by the service.
///
/// # Invariants
/// - Each created secret identifier has exactly one accessor; accessor
///   bookkeeping lives with the service, not here.
/// - Looked up, never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretIdProperties {
    /// CIDR blocks the secret identifier may be used from.
    #[serde(default)]
    pub cidr_list: Vec<String>,
    /// Structured metadata attached at creation time.
    #[serde(default)]
    pub metadata: SecretIdMetadata,
}
