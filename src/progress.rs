use std::time::Duration;

use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};

/// Controls how long-running tool calls are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Attended terminal: spinner on stderr while the tool runs.
    Interactive,
    /// No ANSI, no spinner (piped/non-TTY).
    Plain,
}

impl OutputMode {
    /// Interactive only when both stdin and stdout are attended terminals.
    pub fn detect() -> Self {
        use std::io::IsTerminal;

        if console::Term::stdout().features().is_attended() && std::io::stdin().is_terminal() {
            Self::Interactive
        } else {
            Self::Plain
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Spinner shown while a tool invocation is in flight. Hidden in plain mode,
/// so callers can always call `finish_and_clear` on the result. Dropping it
/// unfinished (an interrupted call) also clears the line.
pub fn spinner(mode: OutputMode, label: &str) -> ProgressBar {
    if mode == OutputMode::Plain {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new_spinner().with_finish(ProgressFinish::AndClear);
    bar.set_style(spinner_style());
    bar.set_message(label.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_spinner_is_hidden() {
        let bar = spinner(OutputMode::Plain, "VBoxManage list vms");
        assert!(bar.is_hidden());
        bar.finish_and_clear();
    }
}
