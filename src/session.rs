use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;

use crate::backend::Executor;
use crate::create::CreationPolicy;
use crate::error::VboxError;
use crate::interrupt::Interrupts;
use crate::prompt::Prompt;

/// Message shown whenever the tool cannot be spawned at all.
pub fn tool_missing_message(tool: &str) -> String {
    format!(
        "Error: {tool} command not found. Make sure VirtualBox is installed and added to system PATH."
    )
}

/// One interactive session: the tool, the user, and where output goes.
///
/// The menu and every operation are methods on this type (see `menu`, `ops`,
/// `create`, `snapshot`).
pub struct Session<E, P, W> {
    pub(crate) executor: E,
    pub(crate) prompt: P,
    pub(crate) out: W,
    pub(crate) base_dir: PathBuf,
    pub(crate) policy: CreationPolicy,
    pub(crate) interrupts: Interrupts,
}

impl<E: Executor, P: Prompt, W: Write> Session<E, P, W> {
    pub fn new(executor: E, prompt: P, out: W) -> Self {
        Self {
            executor,
            prompt,
            out,
            base_dir: PathBuf::from("."),
            policy: CreationPolicy::BestEffort,
            interrupts: Interrupts::default(),
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_policy(mut self, policy: CreationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Ctrl+C source for operations that can be interrupted without
    /// ending the session.
    pub fn with_interrupts(mut self, interrupts: Interrupts) -> Self {
        self.interrupts = interrupts;
        self
    }

    #[cfg(test)]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    #[cfg(test)]
    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    /// Write one line of user-facing output. Output errors (closed stdout)
    /// are not worth aborting an operation over.
    pub(crate) fn say(&mut self, line: impl Display) {
        let _ = writeln!(self.out, "{line}");
    }

    /// Pass tool output through untouched, minus trailing whitespace.
    pub(crate) fn say_raw(&mut self, text: &str) {
        let text = text.trim_end();
        if !text.is_empty() {
            self.say(text);
        }
    }

    pub(crate) async fn ask(&mut self, message: &str) -> Result<String, VboxError> {
        let _ = self.out.flush();
        self.prompt.text(message).await
    }

    pub(crate) fn say_tool_missing(&mut self) {
        let message = tool_missing_message(self.executor.tool_name());
        self.say(message);
    }
}
