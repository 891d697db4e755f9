// crates/approle-verify-config/src/resolver.rs
// ============================================================================
// Module: Variable Resolver
// Description: Overlay merge of base variables, environment, and overrides.
// Purpose: Produce the finalized variable set for one plan or apply call.
// Dependencies: approle-verify-core, crate::{env, load}
// ============================================================================

//! ## Overview
//! Resolution is a pure merge, applied in order: the role's base variables
//! from the harness file, the environment overlay (component and deployment
//! identifier overrides), the namespace seed suffix, and finally the
//! caller-supplied override closure. Keys not present in later layers
//! retain earlier values. No validation happens here; invalid combinations
//! are rejected by the downstream resource schema.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use approle_verify_core::LogicalRole;
use approle_verify_core::RoleVariables;

use crate::env::SeedSetting;
use crate::load::ConfigError;
use crate::load::HarnessConfig;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolves finalized variable sets for logical roles.
///
/// # Invariants
/// - Resolution is side-effect free; each call produces a fresh value.
/// - The seed suffix is applied to the deployment identifier exactly once
///   per resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableResolver {
    /// Base variables per logical role, from the harness file.
    base: BTreeMap<String, RoleVariables>,
    /// Environment overlay applied after base variables.
    env_overlay: RoleVariables,
    /// Namespace seed suffixed onto the deployment identifier.
    seed: String,
}

impl VariableResolver {
    /// Builds a resolver from loaded harness configuration.
    #[must_use]
    pub fn new(config: &HarnessConfig) -> Self {
        let mut base = BTreeMap::new();
        for role in [LogicalRole::Root, LogicalRole::Prerequisites, LogicalRole::Full] {
            if let Ok(section) = config.role(role) {
                base.insert(role.as_str().to_string(), section.vars.clone());
            }
        }
        let env_overlay = RoleVariables {
            component: config.env.component.clone(),
            deployment_identifier: config.env.deployment_identifier.clone(),
            ..RoleVariables::default()
        };
        let seed = match &config.env.seed {
            SeedSetting::Pinned(seed) | SeedSetting::Generated(seed) => seed.clone(),
        };
        Self {
            base,
            env_overlay,
            seed,
        }
    }

    /// Resolves the finalized variables for a role with no overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownRole`] when the role has no base
    /// variables.
    pub fn resolve(&self, role: LogicalRole) -> Result<RoleVariables, ConfigError> {
        self.resolve_with(role, |_| {})
    }

    /// Resolves the finalized variables for a role, applying overrides
    /// after defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownRole`] when the role has no base
    /// variables.
    pub fn resolve_with<F>(&self, role: LogicalRole, overrides: F) -> Result<RoleVariables, ConfigError>
    where
        F: FnOnce(&mut RoleVariables),
    {
        let base = self
            .base
            .get(role.as_str())
            .cloned()
            .ok_or(ConfigError::UnknownRole(role))?;
        let mut merged = base.overlaid(&self.env_overlay);
        if let Some(identifier) = merged.deployment_identifier.take() {
            merged.deployment_identifier = Some(format!("{identifier}-{}", self.seed));
        }
        overrides(&mut merged);
        Ok(merged)
    }

    /// Returns the resolved component for a role.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVariable`] when the component is unset
    /// after resolution.
    pub fn component(&self, role: LogicalRole) -> Result<String, ConfigError> {
        self.resolve(role)?.component.ok_or(ConfigError::MissingVariable {
            role,
            name: "component",
        })
    }

    /// Returns the resolved deployment identifier for a role, seed suffix
    /// included.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVariable`] when the deployment
    /// identifier is unset after resolution.
    pub fn deployment_identifier(&self, role: LogicalRole) -> Result<String, ConfigError> {
        self.resolve(role)?.deployment_identifier.ok_or(ConfigError::MissingVariable {
            role,
            name: "deployment_identifier",
        })
    }
}
