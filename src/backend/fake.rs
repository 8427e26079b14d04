use std::cell::RefCell;
use std::collections::HashMap;

use crate::backend::{CommandResult, Executor};
use crate::error::VboxError;
use crate::interrupt::Interrupts;

type Responder = Box<dyn Fn(&[String]) -> Option<Result<CommandResult, VboxError>>>;

/// Records every call and answers from per-subcommand rules. Calls with no
/// matching rule succeed with empty output.
#[derive(Default)]
pub struct FakeExecutor {
    calls: RefCell<Vec<Vec<String>>>,
    by_subcommand: HashMap<String, CommandResult>,
    responder: Option<Responder>,
    hang: Option<(String, Interrupts)>,
    missing: bool,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every invocation fails as if the tool were not installed.
    pub fn missing() -> Self {
        Self {
            missing: true,
            ..Self::default()
        }
    }

    /// Answer calls whose first argument is `subcommand` with `result`.
    pub fn on(mut self, subcommand: &str, result: CommandResult) -> Self {
        self.by_subcommand.insert(subcommand.to_string(), result);
        self
    }

    /// Full control over responses; returning `None` falls back to `on` rules.
    pub fn respond_with(
        mut self,
        f: impl Fn(&[String]) -> Option<Result<CommandResult, VboxError>> + 'static,
    ) -> Self {
        self.responder = Some(Box::new(f));
        self
    }

    /// Calls to `subcommand` never finish; instead they deliver one Ctrl+C
    /// to `interrupts`, like a user giving up on a slow step.
    pub fn interrupt_on(mut self, subcommand: &str, interrupts: Interrupts) -> Self {
        self.hang = Some((subcommand.to_string(), interrupts));
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// First argument of each call, in order.
    pub fn subcommands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| c.first().cloned())
            .collect()
    }
}

impl Executor for FakeExecutor {
    fn tool_name(&self) -> &str {
        "VBoxManage"
    }

    async fn execute(&self, args: &[String]) -> Result<CommandResult, VboxError> {
        self.calls.borrow_mut().push(args.to_vec());

        if self.missing {
            return Err(VboxError::ToolNotFound {
                tool: "VBoxManage".into(),
            });
        }
        if let Some((subcommand, interrupts)) = &self.hang
            && args.first() == Some(subcommand)
        {
            assert!(interrupts.trigger(), "interrupt delivered outside a guard");
            std::future::pending::<()>().await;
        }
        if let Some(answer) = self.responder.as_ref().and_then(|f| f(args)) {
            return answer;
        }
        let result = args
            .first()
            .and_then(|sub| self.by_subcommand.get(sub))
            .cloned()
            .unwrap_or_else(|| CommandResult::ok(""));
        Ok(result)
    }
}
