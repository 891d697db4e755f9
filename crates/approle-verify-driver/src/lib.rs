// crates/approle-verify-driver/src/lib.rs
// ============================================================================
// Module: AppRole Verify Driver Library
// Description: Plan/apply/destroy orchestration for the provisioning engine.
// Purpose: Expose the driver, engine invocation, and plan decoding.
// Dependencies: crate::{driver, engine, plan_format}
// ============================================================================

//! ## Overview
//! The driver wraps the external provisioning engine behind a small
//! synchronous API: dry-run plans, live applies publishing realized
//! outputs, and guarded destroys. The engine is invoked as a subprocess
//! with a working directory, a vars file, and a mode; its structured
//! stdout is decoded into the core plan and output models. The calling
//! thread blocks for the duration of each invocation; there is no
//! cancellation and no retry.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod driver;
pub mod engine;
pub mod plan_format;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use driver::DestroyGuard;
pub use driver::DestroyOutcome;
pub use driver::Driver;
pub use driver::DriverConfig;
pub use driver::DriverError;
pub use driver::RolePhase;
pub use driver::RoleWorkspace;
pub use engine::EngineSettings;
