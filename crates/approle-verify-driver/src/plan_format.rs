// crates/approle-verify-driver/src/plan_format.rs
// ============================================================================
// Module: Engine Output Decoding
// Description: Decoders for the engine's plan and output JSON documents.
// Purpose: Translate engine wire documents into the core plan model.
// Dependencies: approle-verify-core, serde, serde_json, crate::driver
// ============================================================================

//! ## Overview
//! The engine emits two structured documents this crate consumes: the
//! rendered plan (`show -json` over a saved plan file) and the realized
//! outputs (`output -json`). Both are decoded strictly — undecodable
//! bodies and unrecognized action combinations are malformed output, not
//! silently skipped — but unknown sibling fields are ignored, since the
//! engine documents carry far more than the harness asserts on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use approle_verify_core::ChangeAction;
use approle_verify_core::OutputSet;
use approle_verify_core::PlanResult;
use approle_verify_core::ResourceChange;
use serde::Deserialize;
use serde_json::Value;

use crate::driver::DriverError;

// ============================================================================
// SECTION: Wire Model
// ============================================================================

/// Rendered plan document.
#[derive(Debug, Deserialize)]
struct PlanDocument {
    /// Proposed resource operations, in engine order.
    #[serde(default)]
    resource_changes: Vec<ResourceChangeRecord>,
    /// Proposed output changes keyed by output name.
    #[serde(default)]
    output_changes: BTreeMap<String, OutputChangeRecord>,
}

/// One proposed resource operation on the wire.
#[derive(Debug, Deserialize)]
struct ResourceChangeRecord {
    /// Engine address of the resource instance.
    #[serde(default)]
    address: String,
    /// Resource type tag.
    #[serde(rename = "type")]
    resource_type: String,
    /// Proposed change detail.
    change: ChangeRecord,
}

/// Proposed change detail on the wire.
#[derive(Debug, Deserialize)]
struct ChangeRecord {
    /// Action combination proposed by the engine.
    actions: Vec<String>,
    /// Proposed post-change values.
    #[serde(default)]
    after: Option<Value>,
}

/// One proposed output change on the wire.
#[derive(Debug, Deserialize)]
struct OutputChangeRecord {
    /// Action combination proposed by the engine.
    #[serde(default)]
    actions: Vec<String>,
    /// Proposed output value, absent when unknown until apply.
    #[serde(default)]
    after: Option<Value>,
}

/// One realized output on the wire.
#[derive(Debug, Deserialize)]
struct OutputRecord {
    /// Realized output value.
    value: Value,
}

// ============================================================================
// SECTION: Decoders
// ============================================================================

/// Decodes a rendered plan document into the core plan model.
///
/// # Errors
///
/// Returns [`DriverError::MalformedOutput`] when the document cannot be
/// parsed or an action combination is unrecognized.
pub fn decode_plan(bytes: &[u8]) -> Result<PlanResult, DriverError> {
    let document: PlanDocument = serde_json::from_slice(bytes)
        .map_err(|err| DriverError::MalformedOutput(format!("plan document: {err}")))?;
    let mut changes = Vec::with_capacity(document.resource_changes.len());
    for record in document.resource_changes {
        let action = decode_action(&record.change.actions)?;
        changes.push(ResourceChange {
            address: record.address,
            resource_type: record.resource_type,
            action,
            attributes: decode_attributes(record.change.after)?,
        });
    }
    let mut planned_outputs = BTreeMap::new();
    for (name, record) in document.output_changes {
        if record.actions.iter().any(|action| action == "create" || action == "update") {
            planned_outputs.insert(name, record.after.unwrap_or(Value::Null));
        }
    }
    Ok(PlanResult {
        changes,
        planned_outputs,
    })
}

/// Decodes a realized-outputs document into an output set.
///
/// # Errors
///
/// Returns [`DriverError::MalformedOutput`] when the document cannot be
/// parsed.
pub fn decode_outputs(bytes: &[u8]) -> Result<OutputSet, DriverError> {
    let records: BTreeMap<String, OutputRecord> = serde_json::from_slice(bytes)
        .map_err(|err| DriverError::MalformedOutput(format!("output document: {err}")))?;
    let values =
        records.into_iter().map(|(name, record)| (name, record.value)).collect::<BTreeMap<_, _>>();
    Ok(OutputSet::new(values))
}

/// Maps an engine action combination onto the core change action.
fn decode_action(actions: &[String]) -> Result<ChangeAction, DriverError> {
    let labels: Vec<&str> = actions.iter().map(String::as_str).collect();
    match labels.as_slice() {
        ["no-op"] => Ok(ChangeAction::NoOp),
        ["read"] => Ok(ChangeAction::Read),
        ["create"] => Ok(ChangeAction::Create),
        ["update"] => Ok(ChangeAction::Update),
        ["delete"] => Ok(ChangeAction::Delete),
        // Replacement proposes delete-then-create (or the reverse); the
        // harness counts either ordering as a creation.
        ["delete", "create"] | ["create", "delete"] => Ok(ChangeAction::Create),
        other => Err(DriverError::MalformedOutput(format!(
            "unrecognized action combination {other:?}"
        ))),
    }
}

/// Decodes proposed post-change values into an attribute map.
fn decode_attributes(after: Option<Value>) -> Result<BTreeMap<String, Value>, DriverError> {
    match after {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(map)) => Ok(map.into_iter().collect()),
        Some(other) => Err(DriverError::MalformedOutput(format!(
            "proposed values must be an object, got {other}"
        ))),
    }
}
