// crates/approle-verify-driver/src/engine.rs
// ============================================================================
// Module: Engine Invocation
// Description: Subprocess invocation of the provisioning engine binary.
// Purpose: Run one engine command and capture its structured output.
// Dependencies: std::process, crate::driver
// ============================================================================

//! ## Overview
//! One engine invocation is one blocking subprocess run: working directory,
//! arguments, and an environment carrying the secret-service address and
//! token for the engine's provider. Non-zero exits surface as execution
//! errors with bounded stderr excerpts; hung processes block indefinitely
//! (bounded only by the surrounding CI timeout).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use crate::driver::DriverError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum stderr excerpt carried in execution errors, in bytes.
const MAX_STDERR_EXCERPT_BYTES: usize = 8_192;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Engine binary and process environment for invocations.
///
/// # Invariants
/// - `env` entries are appended to the inherited environment; the token
///   entry is never logged or echoed by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Engine binary path or name resolved from `PATH`.
    pub binary: PathBuf,
    /// Additional environment variables for each invocation.
    pub env: Vec<(String, String)>,
}

// ============================================================================
// SECTION: Invocation
// ============================================================================

/// Runs one engine command in the given working directory.
///
/// # Errors
///
/// Returns [`DriverError::Io`] when the process cannot be spawned and
/// [`DriverError::Execution`] when it exits non-zero.
pub(crate) fn run(
    settings: &EngineSettings,
    working_directory: &Path,
    args: &[OsString],
) -> Result<Output, DriverError> {
    let output = Command::new(&settings.binary)
        .args(args)
        .current_dir(working_directory)
        .envs(settings.env.iter().map(|(key, value)| (key.as_str(), value.as_str())))
        .output()
        .map_err(DriverError::Io)?;
    if output.status.success() {
        return Ok(output);
    }
    Err(DriverError::Execution {
        program: settings.binary.display().to_string(),
        args: render_args(args),
        status: output.status.code(),
        stderr: stderr_excerpt(&output.stderr),
    })
}

/// Renders arguments for error messages.
fn render_args(args: &[OsString]) -> String {
    args.iter().map(|arg| arg.to_string_lossy().into_owned()).collect::<Vec<_>>().join(" ")
}

/// Returns a bounded, lossily-decoded stderr excerpt.
fn stderr_excerpt(stderr: &[u8]) -> String {
    let end = stderr.len().min(MAX_STDERR_EXCERPT_BYTES);
    String::from_utf8_lossy(&stderr[..end]).into_owned()
}
