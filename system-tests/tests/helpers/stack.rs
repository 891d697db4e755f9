// system-tests/tests/helpers/stack.rs
// ============================================================================
// Module: Harness Stack
// Description: Process-wide harness stack for system-tests.
// Purpose: Share one fixture, driver, and resolver across a test binary.
// Dependencies: system-tests, approle-verify-config, approle-verify-driver
// ============================================================================

//! ## Overview
//! Each test binary owns one stack: the loaded harness configuration, the
//! secret-service fixture, the engine driver (behind a mutex, since the
//! test runner may use multiple threads), and the variable resolver. The
//! `prerequisites` role is provisioned at most once per binary, mirroring
//! a before-suite hook.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::OnceLock;

use approle_verify_config::HarnessConfig;
use approle_verify_config::HarnessEnv;
use approle_verify_config::VariableResolver;
use approle_verify_config::read_env_strict;
use approle_verify_core::LogicalRole;
use approle_verify_driver::DestroyGuard;
use approle_verify_driver::DestroyOutcome;
use approle_verify_driver::Driver;
use approle_verify_driver::DriverConfig;
use approle_verify_vault::VaultClient;
use approle_verify_vault::VaultClientConfig;
use system_tests::probes::engine_available;
use system_tests::probes::ensure_docker_available;

use super::vault_fixture::VaultFixture;

/// Process-wide harness stack.
pub struct TestStack {
    /// Loaded harness configuration.
    pub config: HarnessConfig,
    /// Variable resolver over the harness configuration.
    pub resolver: VariableResolver,
    /// Engine driver, serialized across test threads.
    pub driver: Mutex<Driver>,
    /// Assertion client bound to the fixture.
    pub client: VaultClient,
    /// Secret-service fixture kept alive for the process.
    pub fixture: VaultFixture,
}

/// Returns the workspace harness file path.
fn harness_file() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("harness.toml")
}

/// Returns the shared stack, or `None` when external tooling is absent.
pub fn stack_or_skip() -> Result<Option<&'static TestStack>, String> {
    static STACK: OnceLock<Result<Option<TestStack>, String>> = OnceLock::new();
    match STACK.get_or_init(build_stack) {
        Ok(stack) => Ok(stack.as_ref()),
        Err(err) => Err(err.clone()),
    }
}

/// Builds the process-wide stack.
fn build_stack() -> Result<Option<TestStack>, String> {
    let config = HarnessConfig::load(Some(&harness_file())).map_err(|err| err.to_string())?;
    if !engine_available(&config.engine_binary()) {
        return Ok(None);
    }
    let external_address =
        read_env_strict(HarnessEnv::VaultAddr.as_str()).map_err(|err| err.to_string())?;
    if external_address.is_none() && ensure_docker_available().is_err() {
        return Ok(None);
    }
    let fixture = VaultFixture::start()?;
    let mut driver_config = DriverConfig::from_harness(&config);
    driver_config.engine.env = vec![
        ("VAULT_ADDR".to_string(), fixture.address.clone()),
        ("VAULT_TOKEN".to_string(), fixture.token.clone()),
    ];
    let driver = Driver::new(driver_config).map_err(|err| err.to_string())?;
    let mut client_config = VaultClientConfig::new(&fixture.address, &fixture.token);
    if let Some(timeout) = config.env.timeout {
        client_config.timeout = timeout;
    }
    let client = VaultClient::new(client_config).map_err(|err| err.to_string())?;
    let resolver = VariableResolver::new(&config);
    Ok(Some(TestStack {
        config,
        resolver,
        driver: Mutex::new(driver),
        client,
        fixture,
    }))
}

/// Locks the shared driver.
pub fn lock_driver(stack: &TestStack) -> Result<MutexGuard<'_, Driver>, String> {
    stack.driver.lock().map_err(|_| "driver mutex poisoned".to_string())
}

/// Provisions the `prerequisites` role once per test binary.
pub fn ensure_prerequisites(stack: &'static TestStack) -> Result<(), String> {
    static PREREQUISITES: OnceLock<Result<(), String>> = OnceLock::new();
    PREREQUISITES
        .get_or_init(|| {
            let vars =
                stack.resolver.resolve(LogicalRole::Prerequisites).map_err(|err| err.to_string())?;
            let mut driver = lock_driver(stack)?;
            driver
                .apply(LogicalRole::Prerequisites, &vars)
                .map(|_| ())
                .map_err(|err| err.to_string())
        })
        .clone()
}

/// Tears down the `prerequisites` role, honoring the teardown guard.
pub fn teardown_prerequisites(stack: &TestStack) -> Result<DestroyOutcome, String> {
    let mut driver = lock_driver(stack)?;
    driver
        .destroy(LogicalRole::Prerequisites, DestroyGuard::DestroyUnlessEnvFlagSet)
        .map_err(|err| err.to_string())
}
