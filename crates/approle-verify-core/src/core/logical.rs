// crates/approle-verify-core/src/core/logical.rs
// ============================================================================
// Module: Logical Deployment Roles
// Description: Harness-side deployment scopes for the module under test.
// Purpose: Name the configurations the suites plan, apply, and destroy.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A logical role is a named scope in the test harness (for example `root`
//! or `full`), distinct from the role definitions the secret-management
//! service stores. Each logical role owns an independent configuration
//! directory, state file, and variable set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Logical Role
// ============================================================================

/// Logical deployment role addressed by the harness.
///
/// # Invariants
/// - Wire form is the lowercase variant name, stable for configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalRole {
    /// Default module wrapper exercised by plan-mode suites.
    Root,
    /// Shared infrastructure provisioned once per test run.
    Prerequisites,
    /// Fully-overridden module wrapper exercised by live suites.
    Full,
}

impl LogicalRole {
    /// Returns the canonical configuration key for the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Prerequisites => "prerequisites",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for LogicalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
