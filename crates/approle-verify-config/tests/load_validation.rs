//! Config load validation tests for approle-verify-config.
// crates/approle-verify-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate harness-file loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use approle_verify_config::ConfigError;
use approle_verify_config::HarnessConfig;
use approle_verify_core::LogicalRole;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

fn assert_invalid(result: Result<HarnessConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

fn write_config(contents: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(contents.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

const MINIMAL_CONFIG: &str = r#"
[roles.root]
configuration_directory = "infra/root"

[roles.root.vars]
component = "svc"
deployment_identifier = "dep1"
"#;

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(HarnessConfig::load(Some(path)), "config path exceeds max length")?;
    Ok(())
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(HarnessConfig::load(Some(path)), "config path component too long")?;
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'a'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(HarnessConfig::load(Some(file.path())), "config file exceeds size limit")?;
    Ok(())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(HarnessConfig::load(Some(file.path())), "config file must be utf-8")?;
    Ok(())
}

#[test]
fn load_rejects_unknown_keys() -> TestResult {
    let file = write_config("[no_such_section]\nvalue = 1\n")?;
    assert_invalid(HarnessConfig::load(Some(file.path())), "config parse failed")?;
    Ok(())
}

#[test]
fn load_rejects_unknown_role_variables() -> TestResult {
    let file = write_config(
        "[roles.root]\nconfiguration_directory = \"infra/root\"\n[roles.root.vars]\nbogus = 1\n",
    )?;
    assert_invalid(HarnessConfig::load(Some(file.path())), "config parse failed")?;
    Ok(())
}

#[test]
fn load_accepts_minimal_config() -> TestResult {
    let file = write_config(MINIMAL_CONFIG)?;
    let config = HarnessConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    let section = config.role(LogicalRole::Root).map_err(|err| err.to_string())?;
    if section.configuration_directory != Path::new("infra/root") {
        return Err(format!(
            "unexpected configuration directory {:?}",
            section.configuration_directory
        ));
    }
    if section.vars.component.as_deref() != Some("svc") {
        return Err(format!("unexpected component {:?}", section.vars.component));
    }
    Ok(())
}

#[test]
fn missing_role_section_is_a_distinct_error() -> TestResult {
    let file = write_config(MINIMAL_CONFIG)?;
    let config = HarnessConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    match config.role(LogicalRole::Full) {
        Err(ConfigError::UnknownRole(LogicalRole::Full)) => Ok(()),
        Err(error) => Err(format!("unexpected error {error}")),
        Ok(_) => Err("expected missing role section".to_string()),
    }
}

#[test]
fn relative_paths_resolve_against_the_config_directory() -> TestResult {
    let file = write_config(MINIMAL_CONFIG)?;
    let config = HarnessConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    let parent = file.path().parent().ok_or("temp file has no parent")?;
    let resolved = config.resolve_path(Path::new("infra/root"));
    if resolved != parent.join("infra/root") {
        return Err(format!("unexpected resolved path {}", resolved.display()));
    }
    Ok(())
}
