// crates/approle-verify-vault/src/lib.rs
// ============================================================================
// Module: AppRole Verify Vault Client Library
// Description: Assertion client for the secret-management service.
// Purpose: Expose role and secret-identifier reads for post-apply checks.
// Dependencies: crate::client
// ============================================================================

//! ## Overview
//! A thin blocking facade over the secret-management service's AppRole
//! HTTP API, used by integration suites to fetch role definitions,
//! secret-identifier properties, and accessor listings for assertions.
//! Not-found responses are distinguished from other failures because a
//! backend path may not exist before first apply. No retries: assertions
//! run once, and transient failures are test failures.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::ClientError;
pub use client::VaultClient;
pub use client::VaultClientConfig;
