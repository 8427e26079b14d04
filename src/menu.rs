use std::io::Write;

use console::style;

use crate::backend::Executor;
use crate::error::VboxError;
use crate::prompt::Prompt;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainChoice {
    List,
    Start,
    Stop,
    Create,
    Delete,
    Settings,
    Snapshots,
    Exit,
}

impl MainChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::List),
            "2" => Some(Self::Start),
            "3" => Some(Self::Stop),
            "4" => Some(Self::Create),
            "5" => Some(Self::Delete),
            "6" => Some(Self::Settings),
            "7" => Some(Self::Snapshots),
            "8" => Some(Self::Exit),
            _ => None,
        }
    }

    /// Question asked for the target VM, for choices that act on one.
    fn vm_prompt(self) -> Option<&'static str> {
        match self {
            Self::Start => Some("Enter the name of the VM to start: "),
            Self::Stop => Some("Enter the name of the VM to stop: "),
            Self::Delete => Some("Enter the name of the VM to delete: "),
            Self::Settings => Some("Enter the name of the VM to view settings: "),
            Self::Snapshots => Some("Enter the name of the VM to manage snapshots: "),
            Self::List | Self::Create | Self::Exit => None,
        }
    }
}

const OPTIONS: &str = "\
1. List VMs
2. Start a VM
3. Stop a VM
4. Create a VM
5. Delete a VM
6. VM Settings
7. Manage VM Snapshots
8. Exit";

impl<E: Executor, P: Prompt, W: Write> Session<E, P, W> {
    /// Main loop. Returns `Ok` when the user picks Exit; `Interrupted` and
    /// `InputClosed` from a prompt end the loop as errors.
    pub async fn run(&mut self) -> Result<(), VboxError> {
        loop {
            self.say("");
            self.say(style("VirtualBox Manager").bold());
            self.say(OPTIONS);

            let input = self.ask("Enter your choice: ").await?;
            let Some(choice) = MainChoice::parse(&input) else {
                tracing::debug!(input = %input, "invalid menu choice");
                self.say("Invalid choice, please try again.");
                continue;
            };

            if choice == MainChoice::Exit {
                self.say("Exiting...");
                return Ok(());
            }

            let vm = match choice.vm_prompt() {
                Some(question) => self.ask(question).await?,
                None => String::new(),
            };

            self.dispatch(choice, &vm).await?;
        }
    }

    async fn dispatch(&mut self, choice: MainChoice, vm: &str) -> Result<(), VboxError> {
        match choice {
            MainChoice::List => self.list_vms().await,
            MainChoice::Start => self.start_vm(vm).await,
            MainChoice::Stop => self.stop_vm(vm).await,
            MainChoice::Create => {
                let report = self.create_vm().await?;
                tracing::debug!(?report, "creation finished");
            }
            MainChoice::Delete => self.delete_vm(vm).await?,
            MainChoice::Settings => self.vm_settings(vm).await,
            MainChoice::Snapshots => self.manage_snapshots(vm).await?,
            MainChoice::Exit => {}
        }
        Ok(())
    }
}
