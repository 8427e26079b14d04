//! VM creation: validate input, make the VM directory, then run an ordered
//! list of tool steps.
//!
//! Creation is not transactional. Registration failing stops everything,
//! but later steps are configuration of an already registered VM and nothing
//! is rolled back. Whether a failed configuration step stops the remaining
//! ones is the [`CreationPolicy`]. `BestEffort` (the default) can leave a VM
//! registered with no disk attached.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use crate::backend::{ALREADY_EXISTS, CommandResult, Executor, argv};
use crate::error::VboxError;
use crate::interrupt::InterruptGuard;
use crate::paths;
use crate::prompt::Prompt;
use crate::session::Session;
use crate::validate::{self, ValidationError};

/// Storage controller every new VM gets; the disk is attached to it.
pub const CONTROLLER: &str = "SATA";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreationPolicy {
    /// Attempt every configuration step, reporting each failure.
    #[default]
    BestEffort,
    /// Stop at the first failed configuration step.
    AbortOnFailure,
}

impl FromStr for CreationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best-effort" => Ok(Self::BestEffort),
            "abort-on-failure" => Ok(Self::AbortOnFailure),
            other => Err(format!(
                "unknown policy '{other}' (use 'best-effort' or 'abort-on-failure')"
            )),
        }
    }
}

/// Validated input for one creation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmCreationRequest {
    pub name: String,
    pub os_type: String,
    pub memory_mb: u32,
    pub disk_mb: u32,
}

impl VmCreationRequest {
    pub fn from_input(
        name: &str,
        os_type: &str,
        memory: &str,
        disk: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            name: validate::validate_name(name)?,
            os_type: os_type.to_string(),
            memory_mb: validate::validate_memory(memory)?,
            disk_mb: validate::validate_disk(disk)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Register,
    SetMemory,
    AddController,
    CreateDisk,
    AttachDisk,
}

impl StepKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::SetMemory => "set memory",
            Self::AddController => "add storage controller",
            Self::CreateDisk => "create disk",
            Self::AttachDisk => "attach disk",
        }
    }

    fn message(self, vm: &str, result: &CommandResult) -> String {
        if result.success {
            return match self {
                Self::Register => format!("VM '{vm}' created successfully."),
                Self::SetMemory => format!("Memory size set successfully for VM '{vm}'."),
                Self::AddController => format!("{CONTROLLER} controller added to VM '{vm}'."),
                Self::CreateDisk => format!("Virtual disk created successfully for VM '{vm}'."),
                Self::AttachDisk => format!("Virtual disk attached successfully to VM '{vm}'."),
            };
        }

        match self {
            Self::Register if result.stderr_contains(ALREADY_EXISTS) => format!(
                "Error: Failed to create VM '{vm}' - VM with the same name already exists."
            ),
            Self::Register => format!(
                "Error: Command returned non-zero exit status {}",
                result.code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
            ),
            Self::SetMemory => format!("Error: Failed to set memory size for VM '{vm}'."),
            Self::AddController => {
                format!("Error: Failed to add {CONTROLLER} controller to VM '{vm}'.")
            }
            Self::CreateDisk => format!("Error: Failed to create virtual disk for VM '{vm}'."),
            Self::AttachDisk => format!("Error: Failed to attach virtual disk for VM '{vm}'."),
        }
    }
}

/// One tool invocation of the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationStep {
    pub kind: StepKind,
    pub args: Vec<String>,
}

/// The tool calls for `request`, in the order they must run.
pub fn plan(request: &VmCreationRequest, base_dir: &Path) -> Vec<CreationStep> {
    let name = request.name.as_str();
    let disk = paths::disk_path(base_dir, name).display().to_string();
    let memory = request.memory_mb.to_string();
    let size = request.disk_mb.to_string();

    vec![
        CreationStep {
            kind: StepKind::Register,
            args: argv([
                "createvm",
                "--name",
                name,
                "--ostype",
                request.os_type.as_str(),
                "--register",
            ]),
        },
        CreationStep {
            kind: StepKind::SetMemory,
            args: argv(["modifyvm", name, "--memory", memory.as_str()]),
        },
        CreationStep {
            kind: StepKind::AddController,
            args: argv(["storagectl", name, "--name", CONTROLLER, "--add", "sata"]),
        },
        CreationStep {
            kind: StepKind::CreateDisk,
            args: argv(["createhd", "--filename", disk.as_str(), "--size", size.as_str()]),
        },
        CreationStep {
            kind: StepKind::AttachDisk,
            args: argv([
                "storageattach",
                name,
                "--storagectl",
                CONTROLLER,
                "--port",
                "0",
                "--device",
                "0",
                "--type",
                "hdd",
                "--medium",
                disk.as_str(),
            ]),
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    /// `code` is `None` when the process was killed or never produced one.
    Failed { code: Option<i32> },
    /// Running when Ctrl+C arrived; the child was killed.
    Interrupted,
    /// Not attempted because the workflow had already stopped.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    Invalid(ValidationError),
    Interrupted,
    Directory,
    AlreadyExists,
    RegistrationFailed,
    ToolMissing,
    /// `AbortOnFailure` stopped at this step.
    StepFailed(StepKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub kind: StepKind,
    pub outcome: StepOutcome,
}

/// What a creation run did, step by step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationReport {
    pub request: Option<VmCreationRequest>,
    pub steps: Vec<StepReport>,
    pub aborted: Option<AbortReason>,
}

impl CreationReport {
    fn stopped(reason: AbortReason) -> Self {
        Self {
            aborted: Some(reason),
            ..Self::default()
        }
    }

    fn record(&mut self, kind: StepKind, outcome: StepOutcome) {
        self.steps.push(StepReport { kind, outcome });
    }

    pub fn outcome(&self, kind: StepKind) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.kind == kind).map(|s| &s.outcome)
    }

    /// Every step ran and succeeded.
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
            && !self.steps.is_empty()
            && self.steps.iter().all(|s| s.outcome == StepOutcome::Succeeded)
    }

    fn registered(&self) -> bool {
        self.outcome(StepKind::Register) == Some(&StepOutcome::Succeeded)
    }

    fn incomplete_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome != StepOutcome::Succeeded)
            .count()
    }
}

impl<E: Executor, P: Prompt, W: Write> Session<E, P, W> {
    /// Menu entry point: ask for the VM parameters, then provision.
    ///
    /// Ctrl+C anywhere in here (at a prompt or while a step runs) stops the
    /// workflow and returns to the menu. Only `InputClosed` escapes; every
    /// other failure is printed and reflected in the report.
    pub async fn create_vm(&mut self) -> Result<CreationReport, VboxError> {
        let mut guard = self.interrupts.guard();
        let request = match self.collect_request(&mut guard).await {
            Ok(request) => request,
            Err(VboxError::Interrupted) => {
                self.say("Operation interrupted.");
                return Ok(CreationReport::stopped(AbortReason::Interrupted));
            }
            Err(VboxError::Validation(e)) => {
                self.say(format!("Error: {e}"));
                return Ok(CreationReport::stopped(AbortReason::Invalid(e)));
            }
            Err(e) => return Err(e),
        };

        Ok(self.run_steps(&request, &mut guard).await)
    }

    async fn collect_request(
        &mut self,
        guard: &mut InterruptGuard,
    ) -> Result<VmCreationRequest, VboxError> {
        let name = self.ask_interruptible(guard, "Enter the name for the new VM: ").await?;
        let os_type = self
            .ask_interruptible(guard, "Enter the OS type (e.g., 'Linux', 'Windows'): ")
            .await?;
        let memory = self.ask_interruptible(guard, "Enter the memory size in MB: ").await?;
        let disk = self.ask_interruptible(guard, "Enter the disk size in MB: ").await?;

        Ok(VmCreationRequest::from_input(&name, &os_type, &memory, &disk)?)
    }

    async fn ask_interruptible(
        &mut self,
        guard: &mut InterruptGuard,
        message: &str,
    ) -> Result<String, VboxError> {
        tokio::select! {
            answer = self.ask(message) => answer,
            () = guard.interrupted() => {
                // The user's ^C left the cursor after the prompt.
                self.say("");
                Err(VboxError::Interrupted)
            }
        }
    }

    /// Create the VM directory and run the planned steps under `self.policy`.
    pub async fn provision(&mut self, request: &VmCreationRequest) -> CreationReport {
        let mut guard = self.interrupts.guard();
        self.run_steps(request, &mut guard).await
    }

    async fn run_steps(
        &mut self,
        request: &VmCreationRequest,
        guard: &mut InterruptGuard,
    ) -> CreationReport {
        let mut report = CreationReport {
            request: Some(request.clone()),
            ..CreationReport::default()
        };
        let vm = request.name.as_str();

        let dir = paths::vm_dir(&self.base_dir, vm);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot create VM directory");
            self.say(format!(
                "Error: Failed to create directory '{}': {e}",
                dir.display()
            ));
            report.aborted = Some(AbortReason::Directory);
            return report;
        }

        for step in plan(request, &self.base_dir) {
            if report.aborted.is_some() {
                report.record(step.kind, StepOutcome::Skipped);
                continue;
            }

            let executed = tokio::select! {
                executed = self.executor.execute(&step.args) => executed,
                () = guard.interrupted() => {
                    // Dropping the execute future kills the child.
                    tracing::warn!(vm, step = step.kind.label(), "creation interrupted");
                    self.say("");
                    self.say("Operation interrupted.");
                    report.record(step.kind, StepOutcome::Interrupted);
                    report.aborted = Some(AbortReason::Interrupted);
                    continue;
                }
            };

            let result = match executed {
                Ok(result) => result,
                Err(VboxError::ToolNotFound { .. }) => {
                    self.say_tool_missing();
                    report.record(step.kind, StepOutcome::Failed { code: None });
                    report.aborted = Some(AbortReason::ToolMissing);
                    continue;
                }
                Err(e) => {
                    tracing::warn!(step = step.kind.label(), error = %e, "step could not run");
                    CommandResult {
                        success: false,
                        code: None,
                        stdout: String::new(),
                        stderr: e.to_string(),
                    }
                }
            };

            self.say(step.kind.message(vm, &result));

            if result.success {
                tracing::info!(vm, step = step.kind.label(), "creation step done");
                report.record(step.kind, StepOutcome::Succeeded);
                continue;
            }

            tracing::warn!(
                vm,
                step = step.kind.label(),
                code = ?result.code,
                "creation step failed"
            );
            report.record(step.kind, StepOutcome::Failed { code: result.code });

            if step.kind == StepKind::Register {
                report.aborted = Some(if result.stderr_contains(ALREADY_EXISTS) {
                    AbortReason::AlreadyExists
                } else {
                    AbortReason::RegistrationFailed
                });
            } else if self.policy == CreationPolicy::AbortOnFailure {
                self.say(format!("Skipping remaining steps for VM '{vm}'."));
                report.aborted = Some(AbortReason::StepFailed(step.kind));
            }
        }

        if report.registered() && !report.is_complete() {
            self.say(format!(
                "Warning: VM '{vm}' is registered but {} step(s) did not complete.",
                report.incomplete_steps()
            ));
        }

        report
    }
}
