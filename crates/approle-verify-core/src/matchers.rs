// crates/approle-verify-core/src/matchers.rs
// ============================================================================
// Module: Assertion Matchers
// Description: Predicates over decoded plans and live resource data.
// Purpose: Express expected outcomes with descriptive mismatch reporting.
// Dependencies: crate::core::plan, serde_json
// ============================================================================

//! ## Overview
//! Matchers compose predicates over a decoded [`PlanResult`] or over live
//! role and secret-identifier data: "exactly N creations of type T exist",
//! "attribute A of the matched resource equals or contains V", "the plan
//! proposes output K". Matchers fail fast with a descriptive mismatch,
//! perform no mutation, and evaluate synchronously against already-fetched
//! data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::core::plan::PlanResult;
use crate::core::plan::ResourceChange;

// ============================================================================
// SECTION: Mismatch Error
// ============================================================================

/// Descriptive assertion mismatch.
///
/// # Invariants
/// - The message names the matched target and the first failing expectation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("assertion mismatch: {message}")]
pub struct MatchError {
    /// Human-readable mismatch description.
    message: String,
}

impl MatchError {
    /// Creates a mismatch with the given description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the mismatch description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ============================================================================
// SECTION: Attribute Expectations
// ============================================================================

/// Expectation evaluated against one proposed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeExpectation {
    /// The attribute equals the given value.
    Equals(Value),
    /// The attribute is absent or null (externally defaulted).
    AbsentOrNull,
    /// The attribute is a list containing exactly these elements, order
    /// insensitive.
    ContainsExactly(Vec<Value>),
    /// The attribute is a string containing the given fragment.
    StringContains(String),
}

impl AttributeExpectation {
    /// Evaluates the expectation against an attribute value.
    ///
    /// # Errors
    ///
    /// Returns a mismatch reason when the value does not satisfy the
    /// expectation.
    fn evaluate(&self, actual: Option<&Value>) -> Result<(), String> {
        match self {
            Self::Equals(expected) => match actual {
                Some(value) if value == expected => Ok(()),
                Some(value) => Err(format!("expected {expected}, got {value}")),
                None => Err(format!("expected {expected}, attribute absent")),
            },
            Self::AbsentOrNull => match actual {
                None | Some(Value::Null) => Ok(()),
                Some(value) => Err(format!("expected absent or null, got {value}")),
            },
            Self::ContainsExactly(expected) => match actual {
                Some(Value::Array(values)) => {
                    if multiset_equal(values, expected) {
                        Ok(())
                    } else {
                        Err(format!(
                            "expected exactly {} (any order), got {}",
                            Value::Array(expected.clone()),
                            Value::Array(values.clone()),
                        ))
                    }
                }
                Some(value) => Err(format!("expected a list, got {value}")),
                None => Err("expected a list, attribute absent".to_string()),
            },
            Self::StringContains(fragment) => match actual {
                Some(Value::String(value)) if value.contains(fragment) => Ok(()),
                Some(value) => Err(format!("expected a string containing {fragment:?}, got {value}")),
                None => Err(format!("expected a string containing {fragment:?}, attribute absent")),
            },
        }
    }
}

/// Compares two value lists as multisets, order insensitive.
fn multiset_equal(left: &[Value], right: &[Value]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut left_keys: Vec<String> = left.iter().map(Value::to_string).collect();
    let mut right_keys: Vec<String> = right.iter().map(Value::to_string).collect();
    left_keys.sort_unstable();
    right_keys.sort_unstable();
    left_keys == right_keys
}

// ============================================================================
// SECTION: Resource Creation Matcher
// ============================================================================

/// Matches proposed resource creations of one type within a plan.
///
/// # Invariants
/// - Attribute expectations must all hold on a single creation; the matcher
///   does not combine attributes across different resources.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceCreationMatcher {
    /// Resource type tag to match.
    resource_type: String,
    /// Expected number of creations, when constrained.
    expected_count: Option<usize>,
    /// Attribute expectations, all required on one creation.
    attributes: Vec<(String, AttributeExpectation)>,
}

impl ResourceCreationMatcher {
    /// Creates a matcher for creations of the given resource type.
    #[must_use]
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            expected_count: None,
            attributes: Vec::new(),
        }
    }

    /// Requires exactly one creation of the resource type.
    #[must_use]
    pub const fn once(self) -> Self {
        self.count(1)
    }

    /// Requires exactly `count` creations of the resource type.
    #[must_use]
    pub const fn count(mut self, count: usize) -> Self {
        self.expected_count = Some(count);
        self
    }

    /// Adds an equality expectation on an attribute.
    #[must_use]
    pub fn with_attribute_value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_attribute(name, AttributeExpectation::Equals(value.into()))
    }

    /// Adds an arbitrary expectation on an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, expectation: AttributeExpectation) -> Self {
        self.attributes.push((name.into(), expectation));
        self
    }

    /// Evaluates the matcher against a decoded plan.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError`] when the creation count or any attribute
    /// expectation is not satisfied by the plan.
    pub fn check(&self, plan: &PlanResult) -> Result<(), MatchError> {
        let creations = plan.creations_of_type(&self.resource_type);
        if let Some(expected) = self.expected_count
            && creations.len() != expected
        {
            return Err(MatchError::new(format!(
                "expected {expected} creation(s) of {}, found {}",
                self.resource_type,
                creations.len(),
            )));
        }
        if self.attributes.is_empty() {
            if creations.is_empty() && self.expected_count.is_none() {
                return Err(MatchError::new(format!(
                    "expected a creation of {}, found none",
                    self.resource_type,
                )));
            }
            return Ok(());
        }
        let mut failures: Vec<String> = Vec::new();
        for creation in &creations {
            match self.evaluate_attributes(creation) {
                Ok(()) => return Ok(()),
                Err(reason) => failures.push(reason),
            }
        }
        if creations.is_empty() {
            return Err(MatchError::new(format!(
                "expected a creation of {}, found none",
                self.resource_type,
            )));
        }
        Err(MatchError::new(format!(
            "no creation of {} satisfies the expectations: {}",
            self.resource_type,
            failures.join("; "),
        )))
    }

    /// Evaluates all attribute expectations against one creation.
    fn evaluate_attributes(&self, creation: &ResourceChange) -> Result<(), String> {
        for (name, expectation) in &self.attributes {
            expectation
                .evaluate(creation.attributes.get(name))
                .map_err(|reason| format!("{} on {}: {reason}", name, creation.address))?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Output Creation Matcher
// ============================================================================

/// Matches proposed output creations within a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputCreationMatcher {
    /// Output name to match.
    name: String,
    /// Optional expectation on the proposed value.
    value: Option<AttributeExpectation>,
}

impl OutputCreationMatcher {
    /// Creates a matcher for the named planned output.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Adds an expectation on the proposed output value.
    #[must_use]
    pub fn with_value(mut self, expectation: AttributeExpectation) -> Self {
        self.value = Some(expectation);
        self
    }

    /// Evaluates the matcher against a decoded plan.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError`] when the output is not proposed or its value
    /// does not satisfy the expectation.
    pub fn check(&self, plan: &PlanResult) -> Result<(), MatchError> {
        let Some(value) = plan.planned_outputs.get(&self.name) else {
            return Err(MatchError::new(format!(
                "expected planned output {:?}, found none",
                self.name,
            )));
        };
        if let Some(expectation) = &self.value {
            expectation
                .evaluate(Some(value))
                .map_err(|reason| MatchError::new(format!("output {:?}: {reason}", self.name)))?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Live Data Helpers
// ============================================================================

/// Asserts that a live string list contains exactly the expected elements,
/// order insensitive.
///
/// # Errors
///
/// Returns [`MatchError`] listing both sides when the lists differ as
/// multisets.
pub fn contains_exactly(actual: &[String], expected: &[&str]) -> Result<(), MatchError> {
    let mut actual_sorted: Vec<&str> = actual.iter().map(String::as_str).collect();
    let mut expected_sorted: Vec<&str> = expected.to_vec();
    actual_sorted.sort_unstable();
    expected_sorted.sort_unstable();
    if actual_sorted == expected_sorted {
        Ok(())
    } else {
        Err(MatchError::new(format!(
            "expected exactly {expected:?} (any order), got {actual:?}"
        )))
    }
}
