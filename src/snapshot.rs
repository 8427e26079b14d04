use std::io::Write;

use crate::backend::{Executor, argv};
use crate::error::VboxError;
use crate::prompt::Prompt;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotChoice {
    Take,
    List,
    Restore,
    Delete,
    Back,
}

impl SnapshotChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Take),
            "2" => Some(Self::List),
            "3" => Some(Self::Restore),
            "4" => Some(Self::Delete),
            "5" => Some(Self::Back),
            _ => None,
        }
    }
}

const MENU: &str = "\
Manage Snapshots:
1. Take a snapshot
2. List snapshots
3. Restore a snapshot
4. Delete a snapshot
5. Go back";

/// Whether `vm` appears in `VBoxManage list vms` output, which prints one
/// `"name" {uuid}` line per VM. Either the quoted name or the braced UUID
/// counts; the rest of the text is not interpreted.
pub fn listing_mentions(listing: &str, vm: &str) -> bool {
    !vm.is_empty()
        && (listing.contains(&format!("\"{vm}\"")) || listing.contains(&format!("{{{vm}}}")))
}

impl<E: Executor, P: Prompt, W: Write> Session<E, P, W> {
    /// Snapshot sub-menu for one VM. Returns without looping if the tool does
    /// not know the VM.
    pub async fn manage_snapshots(&mut self, vm: &str) -> Result<(), VboxError> {
        let Some(listing) = self
            .run_checked(argv(["list", "vms"]), || "Error: Failed to manage snapshots.".into())
            .await
        else {
            return Ok(());
        };

        if !listing_mentions(&listing.stdout, vm) {
            self.say(format!("Error: VM '{vm}' does not exist."));
            return Ok(());
        }

        loop {
            self.say("");
            self.say(MENU);

            let input = self.ask("Enter your choice: ").await?;
            let Some(choice) = SnapshotChoice::parse(&input) else {
                self.say("Invalid choice, please try again.");
                continue;
            };

            match choice {
                SnapshotChoice::Take => self.take_snapshot(vm).await?,
                SnapshotChoice::List => self.list_snapshots(vm).await,
                SnapshotChoice::Restore => self.restore_snapshot(vm).await?,
                SnapshotChoice::Delete => self.delete_snapshot(vm).await?,
                SnapshotChoice::Back => return Ok(()),
            }
        }
    }

    async fn take_snapshot(&mut self, vm: &str) -> Result<(), VboxError> {
        let snap = self.ask("Enter the name for the snapshot: ").await?;
        let taken = self
            .run_checked(argv(["snapshot", vm, "take", snap.as_str()]), || {
                "Failed to take snapshot.".into()
            })
            .await;
        if taken.is_some() {
            tracing::info!(vm, snapshot = %snap, "took snapshot");
            self.say(format!("Snapshot '{snap}' taken successfully."));
        }
        Ok(())
    }

    async fn list_snapshots(&mut self, vm: &str) {
        let listed = self
            .run_checked(argv(["snapshot", vm, "list"]), || "No snapshots found.".into())
            .await;
        if let Some(result) = listed {
            self.say_raw(&result.stdout);
        }
    }

    async fn restore_snapshot(&mut self, vm: &str) -> Result<(), VboxError> {
        let snap = self.ask("Enter the name of the snapshot to restore: ").await?;
        let restored = self
            .run_checked(argv(["snapshot", vm, "restore", snap.as_str()]), || {
                format!("Failed to restore snapshot '{snap}'. Snapshot not found.")
            })
            .await;
        if restored.is_some() {
            tracing::info!(vm, snapshot = %snap, "restored snapshot");
            self.say(format!("Snapshot '{snap}' restored successfully."));
        }
        Ok(())
    }

    async fn delete_snapshot(&mut self, vm: &str) -> Result<(), VboxError> {
        let snap = self.ask("Enter the name of the snapshot to delete: ").await?;
        let deleted = self
            .run_checked(argv(["snapshot", vm, "delete", snap.as_str()]), || {
                format!("Failed to delete snapshot '{snap}'.")
            })
            .await;
        if deleted.is_some() {
            tracing::info!(vm, snapshot = %snap, "deleted snapshot");
            self.say(format!("Snapshot '{snap}' deleted successfully."));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CommandResult;
    use crate::backend::fake::FakeExecutor;
    use crate::prompt::ScriptedPrompt;

    const LISTING: &str = concat!(
        "\"web01\" {8c2a6b9e-0000-4000-8000-000000000001}\n",
        "\"db\" {8c2a6b9e-0000-4000-8000-000000000002}\n",
    );

    fn known_vms() -> FakeExecutor {
        FakeExecutor::new().on("list", CommandResult::ok(LISTING))
    }

    type TestSession = Session<FakeExecutor, ScriptedPrompt, Vec<u8>>;

    fn session(exec: FakeExecutor, answers: &[&str]) -> TestSession {
        Session::new(exec, ScriptedPrompt::new(answers.iter().copied()), Vec::new())
    }

    #[test]
    fn listing_match_is_by_quoted_name_or_uuid() {
        assert!(listing_mentions(LISTING, "web01"));
        assert!(listing_mentions(LISTING, "8c2a6b9e-0000-4000-8000-000000000002"));
        assert!(!listing_mentions(LISTING, "web"));
        assert!(!listing_mentions(LISTING, "ghost"));
        assert!(!listing_mentions(LISTING, ""));
    }

    #[test]
    fn choice_parsing() {
        assert_eq!(SnapshotChoice::parse("1"), Some(SnapshotChoice::Take));
        assert_eq!(SnapshotChoice::parse(" 5\t"), Some(SnapshotChoice::Back));
        assert_eq!(SnapshotChoice::parse("6"), None);
        assert_eq!(SnapshotChoice::parse("take"), None);
    }

    #[tokio::test]
    async fn unknown_vm_never_enters_loop() {
        let mut s = session(known_vms(), &["5"]);
        s.manage_snapshots("ghost").await.unwrap();

        assert_eq!(s.executor().calls(), vec![argv(["list", "vms"])]);
        assert!(s.prompt().asked().is_empty());
        assert_eq!(s.prompt().remaining(), 1);
        let out = String::from_utf8(s.into_output()).unwrap();
        assert!(out.contains("Error: VM 'ghost' does not exist."));
        assert!(!out.contains("Manage Snapshots:"));
    }

    #[tokio::test]
    async fn failed_listing_never_enters_loop() {
        let exec = FakeExecutor::new().on("list", CommandResult::failed(1, "no service"));
        let mut s = session(exec, &["5"]);
        s.manage_snapshots("web01").await.unwrap();

        assert!(s.prompt().asked().is_empty());
        let out = String::from_utf8(s.into_output()).unwrap();
        assert!(out.contains("Error: Failed to manage snapshots."));
    }

    #[tokio::test]
    async fn take_list_restore_delete_then_back() {
        let exec = known_vms().on("snapshot", CommandResult::ok("Name: clean (UUID: 1234) *\n"));
        let mut s = session(
            exec,
            &["1", "clean", "2", "3", "clean", "4", "clean", "5"],
        );
        s.manage_snapshots("web01").await.unwrap();

        assert_eq!(
            s.executor().calls(),
            vec![
                argv(["list", "vms"]),
                argv(["snapshot", "web01", "take", "clean"]),
                argv(["snapshot", "web01", "list"]),
                argv(["snapshot", "web01", "restore", "clean"]),
                argv(["snapshot", "web01", "delete", "clean"]),
            ]
        );
        assert_eq!(s.prompt().remaining(), 0);

        let out = String::from_utf8(s.into_output()).unwrap();
        assert!(out.contains("Snapshot 'clean' taken successfully."));
        assert!(out.contains("Name: clean (UUID: 1234) *"));
        assert!(out.contains("Snapshot 'clean' restored successfully."));
        assert!(out.contains("Snapshot 'clean' deleted successfully."));
    }

    #[tokio::test]
    async fn failures_are_reported_and_loop_continues() {
        let exec = known_vms().on("snapshot", CommandResult::failed(1, "nope"));
        let mut s = session(
            exec,
            &["1", "s1", "2", "3", "s1", "4", "s1", "5"],
        );
        s.manage_snapshots("web01").await.unwrap();

        let out = String::from_utf8(s.into_output()).unwrap();
        assert!(out.contains("Failed to take snapshot."));
        assert!(out.contains("No snapshots found."));
        assert!(out.contains("Failed to restore snapshot 's1'. Snapshot not found."));
        assert!(out.contains("Failed to delete snapshot 's1'."));
    }

    #[tokio::test]
    async fn invalid_choice_reprompts_without_calls() {
        let mut s = session(known_vms(), &["0", "9", "abc", "5"]);
        s.manage_snapshots("web01").await.unwrap();

        assert_eq!(s.executor().calls().len(), 1);
        let out = String::from_utf8(s.into_output()).unwrap();
        assert_eq!(out.matches("Invalid choice, please try again.").count(), 3);
        assert_eq!(out.matches("Manage Snapshots:").count(), 4);
    }
}
