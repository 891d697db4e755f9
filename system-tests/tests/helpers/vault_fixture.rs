// system-tests/tests/helpers/vault_fixture.rs
// ============================================================================
// Module: Vault Fixture
// Description: Secret-service fixture for system-tests.
// Purpose: Provide an isolated dev-mode service instance per test process.
// Dependencies: testcontainers, approle-verify-vault, approle-verify-config
// ============================================================================

//! ## Overview
//! Secret-service fixture for system-tests.
//! Purpose: Provide an isolated dev-mode service instance per test process.
//! An externally-provided address and token (via the harness environment)
//! take precedence over the containerized instance.

use std::thread;
use std::time::Duration;
use std::time::Instant;

use approle_verify_config::HarnessEnv;
use approle_verify_config::read_env_strict;
use approle_verify_vault::ClientError;
use approle_verify_vault::VaultClient;
use approle_verify_vault::VaultClientConfig;
use testcontainers::Container;
use testcontainers::GenericImage;
use testcontainers::ImageExt;
use testcontainers::core::IntoContainerPort;
use testcontainers::runners::SyncRunner;

/// Dev-server root token used when no external token is provided.
const DEV_TOKEN: &str = "supersecret";

/// Container image for the secret service.
const VAULT_IMAGE: &str = "hashicorp/vault";

/// Container image tag for the secret service.
const VAULT_TAG: &str = "1.15";

/// Deadline for the service to start answering requests.
const READINESS_TIMEOUT: Duration = Duration::from_secs(60);

/// Running secret-service instance for one test process.
pub struct VaultFixture {
    /// Base address of the service.
    pub address: String,
    /// Bearer token for the service.
    pub token: String,
    _container: Option<Container<GenericImage>>,
}

impl VaultFixture {
    /// Starts the fixture, preferring an externally-provided service.
    pub fn start() -> Result<Self, String> {
        if let Some(address) =
            read_env_strict(HarnessEnv::VaultAddr.as_str()).map_err(|err| err.to_string())?
        {
            let token = read_env_strict(HarnessEnv::VaultToken.as_str())
                .map_err(|err| err.to_string())?
                .unwrap_or_else(|| DEV_TOKEN.to_string());
            let fixture = Self {
                address,
                token,
                _container: None,
            };
            fixture.wait_ready()?;
            return Ok(fixture);
        }
        let container = GenericImage::new(VAULT_IMAGE, VAULT_TAG)
            .with_exposed_port(8200.tcp())
            .with_env_var("VAULT_DEV_ROOT_TOKEN_ID", DEV_TOKEN)
            .with_env_var("VAULT_DEV_LISTEN_ADDRESS", "0.0.0.0:8200")
            .start()
            .map_err(|err| format!("failed to start vault container: {err}"))?;
        let port = container
            .get_host_port_ipv4(8200.tcp())
            .map_err(|err| format!("failed to resolve vault port: {err}"))?;
        let fixture = Self {
            address: format!("http://127.0.0.1:{port}"),
            token: DEV_TOKEN.to_string(),
            _container: Some(container),
        };
        fixture.wait_ready()?;
        Ok(fixture)
    }

    /// Builds an assertion client for the fixture.
    pub fn client(&self) -> Result<VaultClient, String> {
        VaultClient::new(VaultClientConfig::new(&self.address, &self.token))
            .map_err(|err| err.to_string())
    }

    /// Polls the service until it answers requests or the deadline passes.
    fn wait_ready(&self) -> Result<(), String> {
        let client = self.client()?;
        let deadline = Instant::now() + READINESS_TIMEOUT;
        loop {
            match client.list_roles("approle") {
                // Any routed response means the service is up; the backend
                // may legitimately not exist yet.
                Ok(_) | Err(ClientError::NotFound { .. } | ClientError::Service { .. }) => {
                    return Ok(());
                }
                Err(err) => {
                    if Instant::now() >= deadline {
                        return Err(format!("vault did not become ready: {err}"));
                    }
                    thread::sleep(Duration::from_millis(250));
                }
            }
        }
    }
}
