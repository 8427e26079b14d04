pub mod vboxmanage;

#[cfg(test)]
pub mod fake;

use crate::error::VboxError;

/// Substring VBoxManage writes to stderr when registering a VM whose name is
/// already taken. There is no structured error channel, so this text is the
/// contract.
pub const ALREADY_EXISTS: &str = "already exists";

/// Captured outcome of one tool invocation that actually ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    #[cfg(test)]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    #[cfg(test)]
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn stderr_contains(&self, needle: &str) -> bool {
        self.stderr.contains(needle)
    }

    /// Turn a nonzero exit into `VboxError::Tool`.
    pub fn check(self, command: &str) -> Result<Self, VboxError> {
        if self.success {
            Ok(self)
        } else {
            Err(VboxError::Tool {
                command: command.to_string(),
                code: self.code,
                stderr: self.stderr,
            })
        }
    }
}

/// Runs the virtualization tool. Implementations spawn one child per call and
/// never go through a shell.
#[allow(async_fn_in_trait)] // trait is internal-only
pub trait Executor {
    /// Name of the tool, used in user-facing setup errors.
    fn tool_name(&self) -> &str;

    async fn execute(&self, args: &[String]) -> Result<CommandResult, VboxError>;
}

/// Build an argv from string-ish parts.
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}
