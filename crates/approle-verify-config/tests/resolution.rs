//! Variable resolution tests for approle-verify-config.
// crates/approle-verify-config/tests/resolution.rs
// =============================================================================
// Module: Variable Resolution Tests
// Description: Validate the base/overlay/override merge and seed scoping.
// Purpose: Ensure overrides win, defaults survive, and seeds scope names.
// =============================================================================

use std::io::Write;

use approle_verify_config::HarnessConfig;
use approle_verify_config::VariableResolver;
use approle_verify_core::LogicalRole;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

const CONFIG: &str = r#"
[roles.root]
configuration_directory = "infra/root"

[roles.root.vars]
component = "svc"
deployment_identifier = "dep1"
token_ttl = 60

[roles.prerequisites]
configuration_directory = "infra/prerequisites"

[roles.prerequisites.vars]
component = "svc"
deployment_identifier = "dep1"
"#;

fn resolver() -> Result<VariableResolver, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(CONFIG.as_bytes()).map_err(|err| err.to_string())?;
    let config = HarnessConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    Ok(VariableResolver::new(&config))
}

#[test]
fn base_variables_survive_resolution() -> TestResult {
    let resolver = resolver()?;
    let vars = resolver.resolve(LogicalRole::Root).map_err(|err| err.to_string())?;
    if vars.component.as_deref() != Some("svc") {
        return Err(format!("unexpected component {:?}", vars.component));
    }
    if vars.token_ttl != Some(60) {
        return Err(format!("unexpected token ttl {:?}", vars.token_ttl));
    }
    Ok(())
}

#[test]
fn deployment_identifier_is_seed_scoped() -> TestResult {
    let resolver = resolver()?;
    let identifier =
        resolver.deployment_identifier(LogicalRole::Root).map_err(|err| err.to_string())?;
    let Some(suffix) = identifier.strip_prefix("dep1-") else {
        return Err(format!("identifier {identifier} is not seed scoped"));
    };
    if std::env::var_os(approle_verify_config::HarnessEnv::Seed.as_str()).is_none()
        && (suffix.len() != 8 || !suffix.chars().all(|c| c.is_ascii_hexdigit()))
    {
        return Err(format!("unexpected seed suffix {suffix}"));
    }
    Ok(())
}

#[test]
fn seed_suffix_is_stable_within_a_process() -> TestResult {
    let resolver = resolver()?;
    let first =
        resolver.deployment_identifier(LogicalRole::Root).map_err(|err| err.to_string())?;
    let second = resolver
        .deployment_identifier(LogicalRole::Prerequisites)
        .map_err(|err| err.to_string())?;
    if first != second {
        return Err(format!("seed differs across roles: {first} vs {second}"));
    }
    Ok(())
}

#[test]
fn overrides_apply_after_defaults() -> TestResult {
    let resolver = resolver()?;
    let vars = resolver
        .resolve_with(LogicalRole::Root, |vars| {
            vars.token_ttl = Some(300);
            vars.role_name = Some("some-role".to_string());
        })
        .map_err(|err| err.to_string())?;
    if vars.token_ttl != Some(300) {
        return Err(format!("override lost: {:?}", vars.token_ttl));
    }
    if vars.role_name.as_deref() != Some("some-role") {
        return Err(format!("override lost: {:?}", vars.role_name));
    }
    if vars.component.as_deref() != Some("svc") {
        return Err(format!("default lost: {:?}", vars.component));
    }
    Ok(())
}

#[test]
fn resolution_is_pure_between_calls() -> TestResult {
    let resolver = resolver()?;
    let _overridden = resolver
        .resolve_with(LogicalRole::Root, |vars| {
            vars.token_ttl = Some(900);
        })
        .map_err(|err| err.to_string())?;
    let vars = resolver.resolve(LogicalRole::Root).map_err(|err| err.to_string())?;
    if vars.token_ttl != Some(60) {
        return Err(format!("override leaked into defaults: {:?}", vars.token_ttl));
    }
    Ok(())
}

#[test]
fn unknown_role_resolution_fails() -> TestResult {
    let resolver = resolver()?;
    match resolver.resolve(LogicalRole::Full) {
        Err(error) if error.to_string().contains("no configuration") => Ok(()),
        Err(error) => Err(format!("unexpected error {error}")),
        Ok(_) => Err("expected unknown role failure".to_string()),
    }
}
