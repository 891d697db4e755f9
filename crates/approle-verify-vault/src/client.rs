// crates/approle-verify-vault/src/client.rs
// ============================================================================
// Module: Vault Assertion Client
// Description: Blocking HTTP client for AppRole role and secret-ID reads.
// Purpose: Fetch live state for post-apply assertions with strict limits.
// Dependencies: approle-verify-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! The client issues bounded, bearer-authenticated requests against the
//! AppRole auth method endpoints: role listing and reads under a backend
//! mount path, secret-identifier lookup, and accessor listing. Redirects
//! are never followed and response bodies are size-capped. A 404 maps to
//! the distinguished [`ClientError::NotFound`]; every other non-success
//! status propagates as [`ClientError::Service`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::io::Read;
use std::time::Duration;

use approle_verify_core::RoleDefinition;
use approle_verify_core::SecretIdProperties;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Vault client configuration.
///
/// # Invariants
/// - `address` must parse as an absolute URL.
/// - `max_response_bytes` is a hard upper bound on response bodies.
/// - The token is carried on every request and redacted from `Debug`.
#[derive(Clone)]
pub struct VaultClientConfig {
    /// Service base address.
    pub address: String,
    /// Bearer token presented via the service token header.
    pub token: String,
    /// Request timeout for the full request lifecycle.
    pub timeout: Duration,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
}

impl VaultClientConfig {
    /// Creates a configuration with default timeout and size limits.
    #[must_use]
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: token.into(),
            timeout: Duration::from_secs(10),
            max_response_bytes: 1024 * 1024,
        }
    }
}

impl fmt::Debug for VaultClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultClientConfig")
            .field("address", &self.address)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Vault client errors.
///
/// # Invariants
/// - Variants are stable for suite assertions; negative-path tests match on
///   [`ClientError::NotFound`] specifically.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Client configuration error.
    #[error("vault client config error: {0}")]
    Config(String),
    /// The service returned a not-found status for a backend or role path.
    #[error("vault path not found: {path}")]
    NotFound {
        /// Request path that was not found.
        path: String,
    },
    /// The service returned a non-success, non-404 status.
    #[error("vault service error (status {status}): {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Bounded response excerpt.
        message: String,
    },
    /// Connection-level failure.
    #[error("vault transport error: {0}")]
    Transport(String),
    /// The response body could not be decoded.
    #[error("vault response decode error: {0}")]
    Decode(String),
    /// Response size exceeds limits.
    #[error("vault response exceeds size limit ({actual} > {limit})")]
    ResponseTooLarge {
        /// Actual size in bytes.
        actual: usize,
        /// Maximum size in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Wire Envelopes
// ============================================================================

/// Standard response envelope wrapping a `data` payload.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    /// Payload under the `data` key.
    data: T,
}

/// Key listing payload.
#[derive(Debug, Deserialize)]
struct KeysData {
    /// Listed key names.
    keys: Vec<String>,
}

/// Role identifier payload.
#[derive(Debug, Deserialize)]
struct RoleIdData {
    /// Opaque role identifier.
    role_id: String,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Blocking assertion client for the AppRole auth method.
///
/// # Invariants
/// - Requests never follow redirects.
/// - No retries; each call maps to exactly one request.
#[derive(Debug)]
pub struct VaultClient {
    /// Client configuration, including limits.
    config: VaultClientConfig,
    /// Base URL the service is addressed at.
    base: Url,
    /// HTTP client used for requests.
    client: Client,
}

impl VaultClient {
    /// Creates a client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the address does not parse or
    /// the HTTP client cannot be built.
    pub fn new(config: VaultClientConfig) -> Result<Self, ClientError> {
        let mut base = Url::parse(&config.address)
            .map_err(|err| ClientError::Config(format!("invalid address: {err}")))?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(Policy::none())
            .user_agent("approle-verify/0.1")
            .build()
            .map_err(|err| ClientError::Config(format!("http client build failed: {err}")))?;
        Ok(Self {
            config,
            base,
            client,
        })
    }

    /// Lists role names under a backend mount path.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] when the backend has no roles or
    /// does not exist, and other [`ClientError`] variants on failure.
    pub fn list_roles(&self, backend: &str) -> Result<Vec<String>, ClientError> {
        let url = self.endpoint(&format!("v1/auth/{backend}/role"), true)?;
        let envelope: DataEnvelope<KeysData> = self.get_json(url)?;
        Ok(envelope.data.keys)
    }

    /// Fetches a role's full attribute set by name.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] when the role does not exist, and
    /// other [`ClientError`] variants on failure.
    pub fn read_role(&self, backend: &str, name: &str) -> Result<RoleDefinition, ClientError> {
        let url = self.endpoint(&format!("v1/auth/{backend}/role/{name}"), false)?;
        let envelope: DataEnvelope<RoleDefinition> = self.get_json(url)?;
        Ok(envelope.data)
    }

    /// Fetches a role's opaque role identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] when the role does not exist, and
    /// other [`ClientError`] variants on failure.
    pub fn read_role_id(&self, backend: &str, name: &str) -> Result<String, ClientError> {
        let url = self.endpoint(&format!("v1/auth/{backend}/role/{name}/role-id"), false)?;
        let envelope: DataEnvelope<RoleIdData> = self.get_json(url)?;
        Ok(envelope.data.role_id)
    }

    /// Looks up a secret identifier's properties by role name and value.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] when the role or identifier does
    /// not exist, and other [`ClientError`] variants on failure.
    pub fn read_secret_id(
        &self,
        backend: &str,
        name: &str,
        secret_id: &str,
    ) -> Result<SecretIdProperties, ClientError> {
        let url =
            self.endpoint(&format!("v1/auth/{backend}/role/{name}/secret-id/lookup"), false)?;
        let body = serde_json::json!({ "secret_id": secret_id }).to_string();
        let response = self
            .client
            .post(url.clone())
            .header("X-Vault-Token", &self.config.token)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        let envelope: DataEnvelope<SecretIdProperties> = self.decode(url, response)?;
        Ok(envelope.data)
    }

    /// Lists secret-identifier accessors for a role.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] when the role has no identifiers
    /// or does not exist, and other [`ClientError`] variants on failure.
    pub fn list_secret_id_accessors(
        &self,
        backend: &str,
        name: &str,
    ) -> Result<Vec<String>, ClientError> {
        let url = self.endpoint(&format!("v1/auth/{backend}/role/{name}/secret-id"), true)?;
        let envelope: DataEnvelope<KeysData> = self.get_json(url)?;
        Ok(envelope.data.keys)
    }

    /// Builds an endpoint URL, optionally in list mode.
    fn endpoint(&self, path: &str, list: bool) -> Result<Url, ClientError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|err| ClientError::Config(format!("invalid endpoint path: {err}")))?;
        if list {
            url.set_query(Some("list=true"));
        }
        Ok(url)
    }

    /// Issues a GET request and decodes the enveloped JSON response.
    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        let response = self
            .client
            .get(url.clone())
            .header("X-Vault-Token", &self.config.token)
            .send()
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        self.decode(url, response)
    }

    /// Maps the response status and decodes the body.
    fn decode<T: DeserializeOwned>(
        &self,
        url: Url,
        mut response: Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let body = read_response_limited(&mut response, self.config.max_response_bytes)?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound {
                path: url.path().to_string(),
            });
        }
        if !status.is_success() {
            return Err(ClientError::Service {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        serde_json::from_slice(&body).map_err(|err| ClientError::Decode(err.to_string()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(
    response: &mut Response,
    max_bytes: usize,
) -> Result<Vec<u8>, ClientError> {
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| ClientError::Decode("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = response.content_length()
        && expected > max_bytes_u64
    {
        return Err(ClientError::ResponseTooLarge {
            actual: usize::try_from(expected).unwrap_or(usize::MAX),
            limit: max_bytes,
        });
    }
    let mut buf = Vec::new();
    let limit = max_bytes_u64.saturating_add(1);
    let mut handle = response.take(limit);
    handle
        .read_to_end(&mut buf)
        .map_err(|err| ClientError::Transport(format!("failed to read response: {err}")))?;
    if buf.len() > max_bytes {
        return Err(ClientError::ResponseTooLarge {
            actual: buf.len(),
            limit: max_bytes,
        });
    }
    Ok(buf)
}
