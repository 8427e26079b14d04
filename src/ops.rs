use std::io::Write;

use crate::backend::{CommandResult, Executor, argv};
use crate::error::VboxError;
use crate::prompt::Prompt;
use crate::session::Session;

impl<E: Executor, P: Prompt, W: Write> Session<E, P, W> {
    /// Run one tool call. On success the result is returned; otherwise
    /// `failure` (or the setup error, if the tool is missing) is printed.
    pub(crate) async fn run_checked(
        &mut self,
        args: Vec<String>,
        failure: impl FnOnce() -> String,
    ) -> Option<CommandResult> {
        let checked = self
            .executor
            .execute(&args)
            .await
            .and_then(|result| result.check(&args.join(" ")));

        match checked {
            Ok(result) => Some(result),
            Err(VboxError::ToolNotFound { .. }) => {
                self.say_tool_missing();
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "tool call did not succeed");
                self.say(failure());
                None
            }
        }
    }

    /// `VBoxManage list vms`, printed verbatim.
    pub async fn list_vms(&mut self) {
        self.say("Available VMs:");
        if let Some(result) = self
            .run_checked(argv(["list", "vms"]), || "Failed to list VMs.".into())
            .await
        {
            if result.stdout.trim().is_empty() {
                self.say("No VMs found.");
            } else {
                self.say_raw(&result.stdout);
            }
        }
    }

    pub async fn start_vm(&mut self, name: &str) {
        let result = self
            .run_checked(argv(["startvm", name]), || {
                format!("Failed to start VM '{name}'. VM does not exist or failed to start.")
            })
            .await;
        if let Some(result) = result {
            tracing::info!(vm = name, "started VM");
            self.say_raw(&result.stdout);
        }
    }

    pub async fn stop_vm(&mut self, name: &str) {
        let result = self
            .run_checked(argv(["controlvm", name, "poweroff"]), || {
                format!("Failed to stop VM '{name}'. VM is not started.")
            })
            .await;
        if let Some(result) = result {
            tracing::info!(vm = name, "powered off VM");
            self.say_raw(&result.stdout);
        }
    }

    /// Unregister and delete a VM after an explicit yes/y confirmation.
    pub async fn delete_vm(&mut self, name: &str) -> Result<(), VboxError> {
        let answer = self
            .ask(&format!("Are you sure you want to delete VM '{name}'? (yes/no): "))
            .await?;
        if !is_confirmation(&answer) {
            self.say("Deletion canceled.");
            return Ok(());
        }

        let deleted = self
            .run_checked(argv(["unregistervm", name, "--delete"]), || {
                format!("Failed to delete VM '{name}'. VM does not exist.")
            })
            .await;
        if deleted.is_some() {
            tracing::info!(vm = name, "deleted VM");
            self.say("VM deleted successfully!");
        }
        Ok(())
    }

    /// `VBoxManage showvminfo <name>`, printed verbatim.
    pub async fn vm_settings(&mut self, name: &str) {
        let result = self
            .run_checked(argv(["showvminfo", name]), || {
                format!("Failed to retrieve settings for VM '{name}'. VM does not exist.")
            })
            .await;
        if let Some(result) = result {
            self.say_raw(&result.stdout);
        }
    }
}

fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "y")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeExecutor;
    use crate::prompt::ScriptedPrompt;

    type TestSession = Session<FakeExecutor, ScriptedPrompt, Vec<u8>>;

    fn session(exec: FakeExecutor, answers: &[&str]) -> TestSession {
        Session::new(exec, ScriptedPrompt::new(answers.iter().copied()), Vec::new())
    }

    fn output<E: Executor, P: Prompt>(s: Session<E, P, Vec<u8>>) -> String {
        String::from_utf8(s.into_output()).unwrap()
    }

    #[tokio::test]
    async fn list_prints_raw_stdout() {
        let exec = FakeExecutor::new().on(
            "list",
            CommandResult::ok("\"web01\" {1111}\n\"db\" {2222}\n"),
        );
        let mut s = session(exec, &[]);
        s.list_vms().await;

        assert_eq!(s.executor().calls(), vec![argv(["list", "vms"])]);
        let out = output(s);
        assert!(out.contains("Available VMs:"));
        assert!(out.contains("\"web01\" {1111}\n\"db\" {2222}"));
    }

    #[tokio::test]
    async fn list_empty_says_no_vms() {
        let mut s = session(FakeExecutor::new(), &[]);
        s.list_vms().await;
        assert!(output(s).contains("No VMs found."));
    }

    #[tokio::test]
    async fn list_failure() {
        let exec = FakeExecutor::new().on("list", CommandResult::failed(1, "boom"));
        let mut s = session(exec, &[]);
        s.list_vms().await;
        assert!(output(s).contains("Failed to list VMs."));
    }

    #[tokio::test]
    async fn start_nonexistent_reports_failure() {
        let exec = FakeExecutor::new().on(
            "startvm",
            CommandResult::failed(1, "Could not find a registered machine named 'nonexistent'"),
        );
        let mut s = session(exec, &[]);
        s.start_vm("nonexistent").await;

        assert_eq!(s.executor().calls(), vec![argv(["startvm", "nonexistent"])]);
        assert!(output(s).contains(
            "Failed to start VM 'nonexistent'. VM does not exist or failed to start."
        ));
    }

    #[tokio::test]
    async fn stop_uses_poweroff() {
        let mut s = session(FakeExecutor::new(), &[]);
        s.stop_vm("web01").await;
        assert_eq!(
            s.executor().calls(),
            vec![argv(["controlvm", "web01", "poweroff"])]
        );
    }

    #[tokio::test]
    async fn stop_failure_names_vm() {
        let exec = FakeExecutor::new().on("controlvm", CommandResult::failed(1, "not running"));
        let mut s = session(exec, &[]);
        s.stop_vm("web01").await;
        assert!(output(s).contains("Failed to stop VM 'web01'. VM is not started."));
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        for answer in ["no", "n", "", "yess", "maybe"] {
            let mut s = session(FakeExecutor::new(), &[answer]);
            s.delete_vm("web01").await.unwrap();
            assert!(s.executor().calls().is_empty(), "answer {answer:?}");
            assert!(output(s).contains("Deletion canceled."));
        }
    }

    #[tokio::test]
    async fn delete_accepts_yes_case_insensitively() {
        for answer in ["yes", "y", "YES", "Y", "Yes", " y "] {
            let mut s = session(FakeExecutor::new(), &[answer]);
            s.delete_vm("web01").await.unwrap();
            assert_eq!(
                s.executor().calls(),
                vec![argv(["unregistervm", "web01", "--delete"])],
                "answer {answer:?}"
            );
            assert!(output(s).contains("VM deleted successfully!"));
        }
    }

    #[tokio::test]
    async fn delete_failure_message() {
        let exec = FakeExecutor::new().on("unregistervm", CommandResult::failed(1, "no such vm"));
        let mut s = session(exec, &["y"]);
        s.delete_vm("ghost").await.unwrap();
        assert!(output(s).contains("Failed to delete VM 'ghost'. VM does not exist."));
    }

    #[tokio::test]
    async fn delete_prompt_interrupt_propagates() {
        let exec = FakeExecutor::new();
        let mut s = Session::new(exec, ScriptedPrompt::default().then_interrupt(), Vec::new());
        let err = s.delete_vm("web01").await.unwrap_err();
        assert!(matches!(err, VboxError::Interrupted));
        assert!(s.executor().calls().is_empty());
    }

    #[tokio::test]
    async fn settings_prints_showvminfo() {
        let exec = FakeExecutor::new().on(
            "showvminfo",
            CommandResult::ok("Name: web01\nMemory size: 2048MB\n"),
        );
        let mut s = session(exec, &[]);
        s.vm_settings("web01").await;
        assert!(output(s).contains("Memory size: 2048MB"));
    }

    #[tokio::test]
    async fn settings_failure_names_vm() {
        let exec = FakeExecutor::new().on(
            "showvminfo",
            CommandResult::failed(1, "Could not find a registered machine named 'ghost'"),
        );
        let mut s = session(exec, &[]);
        s.vm_settings("ghost").await;

        assert_eq!(s.executor().calls(), vec![argv(["showvminfo", "ghost"])]);
        assert!(output(s).contains(
            "Failed to retrieve settings for VM 'ghost'. VM does not exist."
        ));
    }

    #[tokio::test]
    async fn stop_passes_tool_output_through() {
        let exec = FakeExecutor::new().on(
            "controlvm",
            CommandResult::ok("0%...10%...20%...100%\n\n"),
        );
        let mut s = session(exec, &[]);
        s.stop_vm("web01").await;

        let out = output(s);
        assert!(out.ends_with("0%...10%...20%...100%\n"));
        assert!(!out.contains("Failed to stop VM"));
    }

    #[tokio::test]
    async fn missing_tool_prints_setup_error() {
        let mut s = session(FakeExecutor::missing(), &[]);
        s.start_vm("web01").await;
        assert!(output(s).contains("Error: VBoxManage command not found."));
    }
}
