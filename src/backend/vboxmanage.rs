use std::path::PathBuf;

use crate::backend::{CommandResult, Executor};
use crate::error::VboxError;
use crate::progress::{self, OutputMode};

/// Executor backed by the real `VBoxManage` binary.
pub struct VBoxManage {
    program: PathBuf,
    mode: OutputMode,
}

impl VBoxManage {
    pub fn new(program: impl Into<PathBuf>, mode: OutputMode) -> Self {
        Self {
            program: program.into(),
            mode,
        }
    }
}

impl Executor for VBoxManage {
    fn tool_name(&self) -> &str {
        self.program
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("VBoxManage")
    }

    async fn execute(&self, args: &[String]) -> Result<CommandResult, VboxError> {
        let label = format!("{} {}", self.tool_name(), args.join(" "));
        tracing::debug!(program = %self.program.display(), ?args, "running tool");

        let spinner = progress::spinner(self.mode, &label);
        let output = tokio::process::Command::new(&self.program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;
        spinner.finish_and_clear();

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(program = %self.program.display(), "tool not found");
                return Err(VboxError::ToolNotFound {
                    tool: self.tool_name().to_string(),
                });
            }
            Err(e) => {
                return Err(VboxError::Io {
                    context: format!("running {}", self.program.display()),
                    source: e,
                });
            }
        };

        let result = CommandResult {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if result.success {
            tracing::debug!(command = %label, "tool succeeded");
        } else {
            tracing::info!(
                command = %label,
                code = ?result.code,
                stderr = %result.stderr.trim(),
                "tool failed"
            );
        }

        Ok(result)
    }
}
