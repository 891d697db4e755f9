// system-tests/src/probes.rs
// ============================================================================
// Module: Availability Probes
// Description: Probes for the provisioning engine and container runtime.
// Purpose: Let suites skip cleanly when external tooling is absent.
// Dependencies: std::process
// ============================================================================

//! ## Overview
//! System-test suites depend on two external tools: the provisioning
//! engine binary and (absent an externally-provided service address) a
//! container runtime for the secret-service fixture. These probes report
//! availability so suites can record a skip instead of failing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::process::Command;

// ============================================================================
// SECTION: Probes
// ============================================================================

/// Returns true when the provisioning engine binary answers `version`.
#[must_use]
pub fn engine_available(binary: &Path) -> bool {
    Command::new(binary)
        .arg("version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Checks that the container runtime is reachable.
///
/// # Errors
///
/// Returns a description of the probe failure when `docker info` cannot be
/// run or exits non-zero.
pub fn ensure_docker_available() -> Result<(), String> {
    let output = Command::new("docker")
        .arg("info")
        .output()
        .map_err(|err| format!("docker info failed: {err}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("docker info failed: {stderr}"));
    }
    Ok(())
}
