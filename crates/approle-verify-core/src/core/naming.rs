// crates/approle-verify-core/src/core/naming.rs
// ============================================================================
// Module: Role Naming
// Description: Derivation of the provisioned role name from module inputs.
// Purpose: Provide the pure naming precedence shared by suites and fixtures.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The module under test derives its role name from three inputs evaluated
//! in precedence order: an explicit name wins outright, a prefix is joined
//! with the component and deployment identifier, and otherwise the
//! component and deployment identifier alone form the name.

// ============================================================================
// SECTION: Naming Inputs
// ============================================================================

/// Inputs feeding the role-name derivation.
///
/// # Invariants
/// - `component` and `deployment_identifier` are always present; the module
///   under test requires both.
/// - Precedence: `explicit_name` > `prefix` + derived > derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleNameParts<'a> {
    /// Explicit role name override, taking full precedence.
    pub explicit_name: Option<&'a str>,
    /// Prefix joined ahead of the derived name.
    pub prefix: Option<&'a str>,
    /// Component owning the role.
    pub component: &'a str,
    /// Deployment identifier scoping the role.
    pub deployment_identifier: &'a str,
}

impl RoleNameParts<'_> {
    /// Resolves the effective role name under the naming precedence.
    #[must_use]
    pub fn resolve(&self) -> String {
        if let Some(name) = self.explicit_name {
            return name.to_string();
        }
        let derived = format!("{}-{}", self.component, self.deployment_identifier);
        match self.prefix {
            Some(prefix) => format!("{prefix}-{derived}"),
            None => derived,
        }
    }
}
