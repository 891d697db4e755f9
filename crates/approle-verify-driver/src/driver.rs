// crates/approle-verify-driver/src/driver.rs
// ============================================================================
// Module: Plan/Apply/Destroy Driver
// Description: Per-role orchestration of the provisioning engine.
// Purpose: Drive dry-run plans, live applies, and guarded destroys.
// Dependencies: approle-verify-config, approle-verify-core, tempfile,
// crate::{engine, plan_format}
// ============================================================================

//! ## Overview
//! Each logical role owns a configuration directory, a state file, and a
//! phase machine `Unapplied -> Planned -> Applied -> Destroyed`, where
//! `Planned` is a side-effect-free peek. Applies publish realized outputs
//! into a process-local cache the Output Resolver reads from. Destroys are
//! idempotent and may be suppressed by a guard evaluated at teardown time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use approle_verify_config::ConfigError;
use approle_verify_config::HarnessConfig;
use approle_verify_config::teardown_suppressed;
use approle_verify_core::LogicalRole;
use approle_verify_core::OutputSet;
use approle_verify_core::PlanResult;
use approle_verify_core::RoleVariables;
use serde_json::Value;
use tempfile::TempDir;
use thiserror::Error;

use crate::engine;
use crate::engine::EngineSettings;
use crate::plan_format;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Driver errors.
///
/// # Invariants
/// - Variants are stable for suite assertions; execution errors carry the
///   program, arguments, exit status, and a bounded stderr excerpt.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The driver has no workspace for the logical role.
    #[error("no workspace for logical role {0}")]
    UnknownRole(LogicalRole),
    /// Subprocess or file I/O failure.
    #[error("driver io error: {0}")]
    Io(#[from] std::io::Error),
    /// The engine exited non-zero.
    #[error("engine execution failed: {program} {args} (status {status:?}): {stderr}")]
    Execution {
        /// Engine program invoked.
        program: String,
        /// Rendered argument list.
        args: String,
        /// Exit status code, when the process exited normally.
        status: Option<i32>,
        /// Bounded stderr excerpt.
        stderr: String,
    },
    /// The engine produced undecodable structured output.
    #[error("engine produced malformed output: {0}")]
    MalformedOutput(String),
    /// Outputs were requested before a successful apply.
    #[error("logical role {0} has no realized outputs (never applied)")]
    NeverApplied(LogicalRole),
    /// A named output is absent from the realized output set.
    #[error("logical role {role} has no output named {name:?}")]
    OutputNotFound {
        /// Logical role the output was requested for.
        role: LogicalRole,
        /// Requested output name.
        name: String,
    },
    /// Harness configuration failed while evaluating teardown policy.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

// ============================================================================
// SECTION: Guards and Phases
// ============================================================================

/// Teardown policy evaluated when destroy is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyGuard {
    /// Destroy unconditionally.
    AlwaysDestroy,
    /// Skip destroy when the environment pins a seed without forcing
    /// teardown, preserving state for debugging.
    DestroyUnlessEnvFlagSet,
}

/// Result of a destroy request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    /// Resources were torn down.
    Destroyed,
    /// The guard suppressed teardown.
    SkippedByGuard,
    /// Nothing existed to tear down.
    AlreadyAbsent,
}

/// Phase of one logical role's infrastructure.
///
/// # Invariants
/// - `Planned` is a peek; it never transitions real infrastructure state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RolePhase {
    /// No engine invocation has run for the role.
    #[default]
    Unapplied,
    /// A dry-run plan has been produced.
    Planned,
    /// Resources are live and outputs are published.
    Applied,
    /// Resources have been torn down.
    Destroyed,
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Workspace for one logical role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleWorkspace {
    /// Configuration directory the engine runs in.
    pub configuration_directory: PathBuf,
    /// State file path; scratch-local when unset.
    pub state_file: Option<PathBuf>,
}

/// Driver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Engine binary and invocation environment.
    pub engine: EngineSettings,
    /// Role workspaces keyed by logical role.
    pub roles: BTreeMap<LogicalRole, RoleWorkspace>,
}

impl DriverConfig {
    /// Builds a driver configuration from loaded harness configuration.
    ///
    /// Relative paths resolve against the harness file's directory; the
    /// engine environment carries the secret-service address and token for
    /// the engine's provider.
    #[must_use]
    pub fn from_harness(config: &HarnessConfig) -> Self {
        let mut roles = BTreeMap::new();
        for role in [LogicalRole::Root, LogicalRole::Prerequisites, LogicalRole::Full] {
            if let Ok(section) = config.role(role) {
                roles.insert(
                    role,
                    RoleWorkspace {
                        configuration_directory: config
                            .resolve_path(&section.configuration_directory),
                        state_file: section
                            .state_file
                            .as_deref()
                            .map(|path| config.resolve_path(path)),
                    },
                );
            }
        }
        Self {
            engine: EngineSettings {
                binary: config.engine_binary(),
                env: vec![
                    ("VAULT_ADDR".to_string(), config.env.vault_addr.clone()),
                    ("VAULT_TOKEN".to_string(), config.env.vault_token.clone()),
                ],
            },
            roles,
        }
    }
}

// ============================================================================
// SECTION: Driver
// ============================================================================

/// Per-role bookkeeping.
#[derive(Debug, Default)]
struct RoleState {
    /// Current phase.
    phase: RolePhase,
    /// True once the role workspace has been initialized.
    initialized: bool,
    /// Vars file used by the most recent plan or apply.
    last_vars_file: Option<PathBuf>,
    /// Realized outputs from the most recent successful apply.
    outputs: Option<OutputSet>,
}

/// Resolved per-invocation paths.
struct RolePaths {
    /// Configuration directory the engine runs in.
    configuration_directory: PathBuf,
    /// Effective state file path.
    state_file: PathBuf,
}

/// Synchronous driver for the provisioning engine.
///
/// # Invariants
/// - One invocation runs at a time; the calling thread blocks until the
///   engine exits.
/// - Vars files and scratch state live in a per-driver temporary directory
///   removed on drop.
#[derive(Debug)]
pub struct Driver {
    /// Driver configuration.
    config: DriverConfig,
    /// Scratch directory for vars files, plan files, and default state.
    scratch: TempDir,
    /// Per-role bookkeeping.
    states: BTreeMap<LogicalRole, RoleState>,
    /// Monotonic counter for scratch file names.
    invocation: u64,
}

impl Driver {
    /// Creates a driver with a fresh scratch directory.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Io`] when the scratch directory cannot be
    /// created.
    pub fn new(config: DriverConfig) -> Result<Self, DriverError> {
        let scratch = TempDir::new()?;
        Ok(Self {
            config,
            scratch,
            states: BTreeMap::new(),
            invocation: 0,
        })
    }

    /// Returns the current phase for a role.
    #[must_use]
    pub fn phase(&self, role: LogicalRole) -> RolePhase {
        self.states.get(&role).map_or(RolePhase::Unapplied, |state| state.phase)
    }

    /// Produces a dry-run plan for a role with the given variables.
    ///
    /// Planning never mutates external state.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] when the engine fails or its plan document
    /// is malformed.
    pub fn plan(
        &mut self,
        role: LogicalRole,
        vars: &RoleVariables,
    ) -> Result<PlanResult, DriverError> {
        let paths = self.paths(role)?;
        self.ensure_init(role, &paths)?;
        let vars_file = self.write_vars_file(role, vars)?;
        let plan_file = self.scratch_file(role, "tfplan");
        let mut args = base_args("plan");
        args.push(flag_path("-out=", &plan_file));
        args.push(flag_path("-state=", &paths.state_file));
        args.push(flag_path("-var-file=", &vars_file));
        engine::run(&self.config.engine, &paths.configuration_directory, &args)?;
        let show_args =
            vec![OsString::from("show"), OsString::from("-json"), plan_file.into_os_string()];
        let output =
            engine::run(&self.config.engine, &paths.configuration_directory, &show_args)?;
        let plan = plan_format::decode_plan(&output.stdout)?;
        let state = self.state_mut(role);
        state.last_vars_file = Some(vars_file);
        if state.phase != RolePhase::Applied {
            state.phase = RolePhase::Planned;
        }
        Ok(plan)
    }

    /// Applies a role with the given variables and publishes outputs.
    ///
    /// Re-applying with unchanged variables is idempotent; the engine
    /// detects the absence of drift.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] when the engine fails or its output
    /// document is malformed.
    pub fn apply(
        &mut self,
        role: LogicalRole,
        vars: &RoleVariables,
    ) -> Result<OutputSet, DriverError> {
        let paths = self.paths(role)?;
        self.ensure_init(role, &paths)?;
        let vars_file = self.write_vars_file(role, vars)?;
        let mut args = base_args("apply");
        args.push(OsString::from("-auto-approve"));
        args.push(flag_path("-state=", &paths.state_file));
        args.push(flag_path("-var-file=", &vars_file));
        engine::run(&self.config.engine, &paths.configuration_directory, &args)?;
        let output_args = vec![
            OsString::from("output"),
            OsString::from("-json"),
            flag_path("-state=", &paths.state_file),
        ];
        let output =
            engine::run(&self.config.engine, &paths.configuration_directory, &output_args)?;
        let outputs = plan_format::decode_outputs(&output.stdout)?;
        let state = self.state_mut(role);
        state.last_vars_file = Some(vars_file);
        state.phase = RolePhase::Applied;
        state.outputs = Some(outputs.clone());
        Ok(outputs)
    }

    /// Tears down a role's resources, subject to the guard.
    ///
    /// Destroy is idempotent: tearing down an absent role reports
    /// [`DestroyOutcome::AlreadyAbsent`] without invoking the engine.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] when the engine fails or the guard's
    /// environment policy cannot be evaluated.
    pub fn destroy(
        &mut self,
        role: LogicalRole,
        guard: DestroyGuard,
    ) -> Result<DestroyOutcome, DriverError> {
        let paths = self.paths(role)?;
        if guard == DestroyGuard::DestroyUnlessEnvFlagSet && teardown_suppressed()? {
            return Ok(DestroyOutcome::SkippedByGuard);
        }
        let absent = {
            let state = self.state_mut(role);
            state.phase == RolePhase::Destroyed || !paths.state_file.exists()
        };
        if absent {
            let state = self.state_mut(role);
            state.phase = RolePhase::Destroyed;
            state.outputs = None;
            return Ok(DestroyOutcome::AlreadyAbsent);
        }
        self.ensure_init(role, &paths)?;
        let mut args = base_args("destroy");
        args.push(OsString::from("-auto-approve"));
        args.push(flag_path("-state=", &paths.state_file));
        let last_vars = self.state_mut(role).last_vars_file.clone();
        if let Some(vars_file) = last_vars {
            args.push(flag_path("-var-file=", &vars_file));
        }
        engine::run(&self.config.engine, &paths.configuration_directory, &args)?;
        let state = self.state_mut(role);
        state.phase = RolePhase::Destroyed;
        state.outputs = None;
        Ok(DestroyOutcome::Destroyed)
    }

    /// Returns the realized output set for a role.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NeverApplied`] when no successful apply has
    /// published outputs for the role.
    pub fn outputs(&self, role: LogicalRole) -> Result<&OutputSet, DriverError> {
        self.states
            .get(&role)
            .and_then(|state| state.outputs.as_ref())
            .ok_or(DriverError::NeverApplied(role))
    }

    /// Returns one realized output value for a role.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NeverApplied`] when the role has no outputs
    /// and [`DriverError::OutputNotFound`] when the name is absent.
    pub fn output(&self, role: LogicalRole, name: &str) -> Result<Value, DriverError> {
        self.outputs(role)?.get(name).cloned().ok_or_else(|| DriverError::OutputNotFound {
            role,
            name: name.to_string(),
        })
    }

    /// Returns one realized output as a string.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::OutputNotFound`] when the name is absent or
    /// the value is not a string, and [`DriverError::NeverApplied`] when
    /// the role has no outputs.
    pub fn output_string(&self, role: LogicalRole, name: &str) -> Result<String, DriverError> {
        match self.output(role, name)? {
            Value::String(value) => Ok(value),
            _ => Err(DriverError::OutputNotFound {
                role,
                name: name.to_string(),
            }),
        }
    }

    /// Resolves the per-invocation paths for a role.
    fn paths(&self, role: LogicalRole) -> Result<RolePaths, DriverError> {
        let workspace = self.config.roles.get(&role).ok_or(DriverError::UnknownRole(role))?;
        let state_file = workspace.state_file.clone().unwrap_or_else(|| {
            self.scratch.path().join(format!("{role}.tfstate"))
        });
        Ok(RolePaths {
            configuration_directory: workspace.configuration_directory.clone(),
            state_file,
        })
    }

    /// Initializes a role workspace once per driver.
    fn ensure_init(&mut self, role: LogicalRole, paths: &RolePaths) -> Result<(), DriverError> {
        if self.state_mut(role).initialized {
            return Ok(());
        }
        if let Some(parent) = paths.state_file.parent() {
            fs::create_dir_all(parent)?;
        }
        let args = base_args("init");
        engine::run(&self.config.engine, &paths.configuration_directory, &args)?;
        self.state_mut(role).initialized = true;
        Ok(())
    }

    /// Writes a vars file for one invocation and returns its path.
    fn write_vars_file(
        &mut self,
        role: LogicalRole,
        vars: &RoleVariables,
    ) -> Result<PathBuf, DriverError> {
        let path = self.scratch_file(role, "tfvars.json");
        let body = serde_json::to_vec_pretty(vars)
            .map_err(|err| DriverError::MalformedOutput(format!("vars encoding: {err}")))?;
        fs::write(&path, body)?;
        Ok(path)
    }

    /// Allocates a unique scratch file path.
    fn scratch_file(&mut self, role: LogicalRole, extension: &str) -> PathBuf {
        self.invocation += 1;
        self.scratch.path().join(format!("{role}-{}.{extension}", self.invocation))
    }

    /// Returns the mutable bookkeeping entry for a role.
    fn state_mut(&mut self, role: LogicalRole) -> &mut RoleState {
        self.states.entry(role).or_default()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the common argument prefix for an engine mode.
fn base_args(mode: &str) -> Vec<OsString> {
    vec![OsString::from(mode), OsString::from("-input=false"), OsString::from("-no-color")]
}

/// Renders a `-flag=<path>` argument.
fn flag_path(flag: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push(path.as_os_str());
    arg
}
