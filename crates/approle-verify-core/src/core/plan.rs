// crates/approle-verify-core/src/core/plan.rs
// ============================================================================
// Module: Plan and Output Model
// Description: Decoded dry-run plans and realized output sets.
// Purpose: Provide the structures assertion matchers evaluate against.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A plan is the ordered sequence of resource operations the provisioning
//! engine proposes in dry-run mode, each carrying a resource type tag and
//! the proposed attribute values. Attributes that are absent or null mean
//! "defaulted externally by the resource schema, not this module". An
//! output set holds realized output values, populated only after apply.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Change Actions
// ============================================================================

/// Action the engine proposes for one resource.
///
/// # Invariants
/// - Replacement operations decode as [`ChangeAction::Create`]; the plan
///   model does not distinguish replace from create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeAction {
    /// Resource will be created.
    Create,
    /// Resource will be updated in place.
    Update,
    /// Resource will be destroyed.
    Delete,
    /// Resource will be read.
    Read,
    /// No change proposed.
    NoOp,
}

// ============================================================================
// SECTION: Plan Result
// ============================================================================

/// One proposed resource operation.
///
/// # Invariants
/// - `attributes` holds the proposed post-change values; `Value::Null`
///   entries and missing keys both mean "externally defaulted".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceChange {
    /// Engine address of the resource instance.
    pub address: String,
    /// Resource type tag.
    pub resource_type: String,
    /// Proposed action.
    pub action: ChangeAction,
    /// Proposed attribute values after the change.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

/// Decoded dry-run plan.
///
/// # Invariants
/// - `changes` preserves the engine's proposal order.
/// - `planned_outputs` maps output names to proposed values; values not
///   known until apply decode as `Value::Null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// Ordered proposed resource operations.
    pub changes: Vec<ResourceChange>,
    /// Outputs the plan proposes to create or update.
    #[serde(default)]
    pub planned_outputs: BTreeMap<String, Value>,
}

impl PlanResult {
    /// Returns the proposed creations of the given resource type, in order.
    #[must_use]
    pub fn creations_of_type(&self, resource_type: &str) -> Vec<&ResourceChange> {
        self.changes
            .iter()
            .filter(|change| {
                change.action == ChangeAction::Create && change.resource_type == resource_type
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Output Set
// ============================================================================

/// Realized output values recorded after a successful apply.
///
/// # Invariants
/// - Keyed by output name; populated only after apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputSet(BTreeMap<String, Value>);

impl OutputSet {
    /// Creates an output set from realized values.
    #[must_use]
    pub const fn new(values: BTreeMap<String, Value>) -> Self {
        Self(values)
    }

    /// Returns the realized value for an output name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns the realized value as a string slice, when it is a string.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Returns true when no outputs were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over output names and realized values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}
