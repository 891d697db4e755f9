// crates/approle-verify-config/src/env.rs
// ============================================================================
// Module: Harness Environment
// Description: Environment-backed configuration for the verification harness.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: rand, crate::load
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid
//! silent misconfiguration. Invalid UTF-8 fails closed. The namespace seed
//! is pinned from the environment when present and generated per process
//! otherwise; teardown policy distinguishes the two.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::load::ConfigError;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for harness configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessEnv {
    /// Secret-service base address.
    VaultAddr,
    /// Secret-service bearer token.
    VaultToken,
    /// Provisioning engine binary override.
    Binary,
    /// Component name override.
    Component,
    /// Deployment identifier override.
    DeploymentIdentifier,
    /// Pinned namespace seed.
    Seed,
    /// Force teardown even under a pinned seed (`true`/`false` or `1`/`0`).
    ForceDestroy,
    /// Harness configuration file override.
    ConfigPath,
    /// Optional timeout override in seconds (positive integer).
    TimeoutSeconds,
    /// Optional artifact run root override.
    RunRoot,
}

impl HarnessEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VaultAddr => "APPROLE_VERIFY_VAULT_ADDR",
            Self::VaultToken => "APPROLE_VERIFY_VAULT_TOKEN",
            Self::Binary => "APPROLE_VERIFY_BINARY",
            Self::Component => "APPROLE_VERIFY_COMPONENT",
            Self::DeploymentIdentifier => "APPROLE_VERIFY_DEPLOYMENT_IDENTIFIER",
            Self::Seed => "APPROLE_VERIFY_SEED",
            Self::ForceDestroy => "APPROLE_VERIFY_FORCE_DESTROY",
            Self::ConfigPath => "APPROLE_VERIFY_CONFIG",
            Self::TimeoutSeconds => "APPROLE_VERIFY_TIMEOUT_SEC",
            Self::RunRoot => "APPROLE_VERIFY_RUN_ROOT",
        }
    }
}

/// Default secret-service address used by the local dev server.
const DEFAULT_VAULT_ADDR: &str = "http://127.0.0.1:8200";

/// Default bearer token used by the local dev server.
const DEFAULT_VAULT_TOKEN: &str = "supersecret";

/// Default provisioning engine binary resolved from `PATH`.
const DEFAULT_BINARY: &str = "terraform";

// ============================================================================
// SECTION: Seed Setting
// ============================================================================

/// Namespace seed scoping one harness process.
///
/// # Invariants
/// - A pinned seed comes from the environment and survives across runs; a
///   generated seed is fresh per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSetting {
    /// Seed pinned via the environment.
    Pinned(String),
    /// Seed generated for this process.
    Generated(String),
}

impl SeedSetting {
    /// Returns the seed value regardless of origin.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Pinned(seed) | Self::Generated(seed) => seed,
        }
    }

    /// Returns true when the seed was pinned via the environment.
    #[must_use]
    pub const fn is_pinned(&self) -> bool {
        matches!(self, Self::Pinned(_))
    }
}

/// Generates a fresh 8-hex-character seed.
fn generate_seed() -> String {
    let raw: u32 = rand::random();
    format!("{raw:08x}")
}

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Typed harness settings derived from environment variables.
///
/// # Invariants
/// - `vault_addr`, `vault_token`, and `binary` always hold usable values;
///   defaults cover the local dev-server setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSettings {
    /// Secret-service base address.
    pub vault_addr: String,
    /// Secret-service bearer token.
    pub vault_token: String,
    /// Provisioning engine binary.
    pub binary: PathBuf,
    /// Component name override.
    pub component: Option<String>,
    /// Deployment identifier override.
    pub deployment_identifier: Option<String>,
    /// Namespace seed for this process.
    pub seed: SeedSetting,
    /// Force teardown even under a pinned seed.
    pub force_destroy: bool,
    /// Harness configuration file override.
    pub config_path: Option<PathBuf>,
    /// Optional timeout override.
    pub timeout: Option<Duration>,
    /// Optional artifact run root override.
    pub run_root: Option<PathBuf>,
}

impl EnvSettings {
    /// Loads settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an environment value is not valid
    /// UTF-8, is empty, or fails validation (for example, an invalid
    /// timeout or boolean value).
    pub fn load() -> Result<Self, ConfigError> {
        let vault_addr = read_env_nonempty(HarnessEnv::VaultAddr.as_str())?
            .unwrap_or_else(|| DEFAULT_VAULT_ADDR.to_string());
        let vault_token = read_env_nonempty(HarnessEnv::VaultToken.as_str())?
            .unwrap_or_else(|| DEFAULT_VAULT_TOKEN.to_string());
        let binary = read_env_nonempty(HarnessEnv::Binary.as_str())?
            .map_or_else(|| PathBuf::from(DEFAULT_BINARY), PathBuf::from);
        let component = read_env_nonempty(HarnessEnv::Component.as_str())?;
        let deployment_identifier = read_env_nonempty(HarnessEnv::DeploymentIdentifier.as_str())?;
        let seed = read_env_nonempty(HarnessEnv::Seed.as_str())?
            .map_or_else(|| SeedSetting::Generated(generate_seed()), SeedSetting::Pinned);
        let force_destroy = parse_bool_env(
            HarnessEnv::ForceDestroy.as_str(),
            read_env_nonempty(HarnessEnv::ForceDestroy.as_str())?,
        )?;
        let config_path = read_env_nonempty(HarnessEnv::ConfigPath.as_str())?.map(PathBuf::from);
        let timeout = read_env_nonempty(HarnessEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(HarnessEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        let run_root = read_env_nonempty(HarnessEnv::RunRoot.as_str())?.map(PathBuf::from);
        Ok(Self {
            vault_addr,
            vault_token,
            binary,
            component,
            deployment_identifier,
            seed,
            force_destroy,
            config_path,
            timeout,
            run_root,
        })
    }
}

// ============================================================================
// SECTION: Teardown Policy
// ============================================================================

/// Returns true when teardown should be skipped for debugging.
///
/// Evaluated at teardown time: a pinned seed preserves state unless the
/// force-destroy flag is set.
///
/// # Errors
///
/// Returns [`ConfigError`] when the seed or force-destroy environment
/// values fail validation.
pub fn teardown_suppressed() -> Result<bool, ConfigError> {
    let pinned = read_env_nonempty(HarnessEnv::Seed.as_str())?.is_some();
    let force = parse_bool_env(
        HarnessEnv::ForceDestroy.as_str(),
        read_env_nonempty(HarnessEnv::ForceDestroy.as_str())?,
    )?;
    Ok(pinned && !force)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns [`ConfigError`] when the environment variable contains invalid
/// UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, ConfigError> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| ConfigError::Env {
            name: name.to_string(),
            reason: "must be valid UTF-8".to_string(),
        })
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns [`ConfigError`] when the variable is set but empty or
/// whitespace.
fn read_env_nonempty(name: &str) -> Result<Option<String>, ConfigError> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(ConfigError::Env {
            name: name.to_string(),
            reason: "must not be empty".to_string(),
        }),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns [`ConfigError`] when the value is non-numeric or zero.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::Env {
        name: name.to_string(),
        reason: "must be a positive integer number of seconds".to_string(),
    };
    let secs: u64 = raw.trim().parse().map_err(|_| invalid())?;
    if secs == 0 {
        return Err(invalid());
    }
    Ok(Duration::from_secs(secs))
}

/// Parses a boolean environment variable with permissive defaults.
///
/// # Errors
///
/// Returns [`ConfigError`] when the value is not a recognized boolean
/// literal.
fn parse_bool_env(name: &str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = raw else {
        return Ok(false);
    };
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        return Ok(false);
    }
    Err(ConfigError::Env {
        name: name.to_string(),
        reason: "must be 1, 0, true, or false".to_string(),
    })
}
