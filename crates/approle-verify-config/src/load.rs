// crates/approle-verify-config/src/load.rs
// ============================================================================
// Module: Harness Configuration Loading
// Description: TOML role mapping with fail-closed input guards.
// Purpose: Map logical roles to configuration directories and base variables.
// Dependencies: approle-verify-core, serde, toml, crate::env
// ============================================================================

//! ## Overview
//! The harness file (`harness.toml`) maps each logical role to the
//! configuration directory the provisioning engine runs in, an optional
//! state file, and the role's base variables. Loading is strict:
//! over-long paths, oversized files, invalid UTF-8, and unknown keys are
//! all rejected rather than ignored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use approle_verify_core::LogicalRole;
use approle_verify_core::RoleVariables;
use serde::Deserialize;
use thiserror::Error;

use crate::env::EnvSettings;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum accepted configuration path length, in bytes.
const MAX_CONFIG_PATH_BYTES: usize = 4096;

/// Maximum accepted length of a single path component, in bytes.
const MAX_CONFIG_PATH_COMPONENT_BYTES: usize = 255;

/// Maximum accepted configuration file size, in bytes.
const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576;

/// Default harness configuration file name.
const DEFAULT_CONFIG_FILE: &str = "harness.toml";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Harness configuration errors.
///
/// # Invariants
/// - Variants are stable for test assertions on loading guards.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration path exceeds the accepted length.
    #[error("config path exceeds max length ({actual} > {limit})")]
    PathTooLong {
        /// Actual path length in bytes.
        actual: usize,
        /// Maximum accepted length in bytes.
        limit: usize,
    },
    /// A configuration path component exceeds the accepted length.
    #[error("config path component too long")]
    PathComponentTooLong,
    /// Configuration file could not be read.
    #[error("config file read failed: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration file exceeds the accepted size.
    #[error("config file exceeds size limit ({actual} > {limit})")]
    FileTooLarge {
        /// Actual file size in bytes.
        actual: u64,
        /// Maximum accepted size in bytes.
        limit: u64,
    },
    /// Configuration file is not valid UTF-8.
    #[error("config file must be utf-8")]
    NotUtf8,
    /// Configuration file could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),
    /// A logical role has no entry in the harness file.
    #[error("no configuration for logical role {0}")]
    UnknownRole(LogicalRole),
    /// A required variable is unset after resolution.
    #[error("logical role {role} is missing required variable {name}")]
    MissingVariable {
        /// Logical role the variable was resolved for.
        role: LogicalRole,
        /// Variable name.
        name: &'static str,
    },
    /// An environment value failed validation.
    #[error("{name} {reason}")]
    Env {
        /// Environment variable name.
        name: String,
        /// Validation failure description.
        reason: String,
    },
}

// ============================================================================
// SECTION: File Model
// ============================================================================

/// Provisioning engine settings from the harness file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Engine binary; overridden by the environment when set there.
    #[serde(default)]
    pub binary: Option<PathBuf>,
}

/// Per-role section of the harness file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleSection {
    /// Configuration directory the engine runs in, relative to the file.
    pub configuration_directory: PathBuf,
    /// State file path, relative to the file; scratch-local when unset.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
    /// Base variables for the role.
    #[serde(default)]
    pub vars: RoleVariables,
}

/// Parsed harness file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct HarnessFile {
    /// Engine settings.
    #[serde(default)]
    engine: EngineSection,
    /// Logical role sections keyed by role name.
    #[serde(default)]
    roles: BTreeMap<String, RoleSection>,
}

// ============================================================================
// SECTION: Harness Config
// ============================================================================

/// Loaded harness configuration: file contents plus environment overlay.
///
/// # Invariants
/// - `base_dir` anchors every relative path in the file.
/// - `env` is loaded once alongside the file; seed and teardown policy are
///   re-read from the environment at teardown time, not from this value.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    /// Environment overlay.
    pub env: EnvSettings,
    /// Engine settings from the file.
    engine: EngineSection,
    /// Role sections keyed by role name.
    roles: BTreeMap<String, RoleSection>,
    /// Directory the harness file was loaded from.
    base_dir: PathBuf,
}

impl HarnessConfig {
    /// Loads the harness configuration.
    ///
    /// The path is taken from the argument, else the environment override,
    /// else `harness.toml` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the path violates length guards, the
    /// file is oversized, not UTF-8, or fails to parse, or when the
    /// environment overlay fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env = EnvSettings::load()?;
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env.config_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        validate_config_path(&path)?;
        let metadata = fs::metadata(&path)?;
        if metadata.len() > MAX_CONFIG_FILE_BYTES {
            return Err(ConfigError::FileTooLarge {
                actual: metadata.len(),
                limit: MAX_CONFIG_FILE_BYTES,
            });
        }
        let bytes = fs::read(&path)?;
        let contents = String::from_utf8(bytes).map_err(|_| ConfigError::NotUtf8)?;
        let file: HarnessFile =
            toml::from_str(&contents).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let base_dir = path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(Self {
            env,
            engine: file.engine,
            roles: file.roles,
            base_dir,
        })
    }

    /// Returns the section for a logical role.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownRole`] when the file has no section
    /// for the role.
    pub fn role(&self, role: LogicalRole) -> Result<&RoleSection, ConfigError> {
        self.roles.get(role.as_str()).ok_or(ConfigError::UnknownRole(role))
    }

    /// Returns the effective engine binary (environment wins over file).
    #[must_use]
    pub fn engine_binary(&self) -> PathBuf {
        if std::env::var_os(crate::env::HarnessEnv::Binary.as_str()).is_some() {
            return self.env.binary.clone();
        }
        self.engine.binary.clone().unwrap_or_else(|| self.env.binary.clone())
    }

    /// Resolves a path from the harness file against its directory.
    #[must_use]
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() { path.to_path_buf() } else { self.base_dir.join(path) }
    }

    /// Returns the directory the harness file was loaded from.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

// ============================================================================
// SECTION: Guards
// ============================================================================

/// Validates configuration path length guards.
fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    let raw = path.as_os_str();
    if raw.len() > MAX_CONFIG_PATH_BYTES {
        return Err(ConfigError::PathTooLong {
            actual: raw.len(),
            limit: MAX_CONFIG_PATH_BYTES,
        });
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_CONFIG_PATH_COMPONENT_BYTES {
            return Err(ConfigError::PathComponentTooLong);
        }
    }
    Ok(())
}
