//! Line-oriented user input.
//!
//! Every question the menus ask goes through [`Prompt`], so the workflows can
//! run against a terminal (`inquire`), a pipe, or a scripted list of answers.

use std::collections::VecDeque;
use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::VboxError;

#[allow(async_fn_in_trait)] // trait is internal-only
pub trait Prompt {
    /// Show `message` and return the line the user typed, without the line
    /// terminator.
    ///
    /// Fails with `Interrupted` on Ctrl+C/Esc and `InputClosed` on EOF.
    async fn text(&mut self, message: &str) -> Result<String, VboxError>;
}

/// Terminal prompt rendered by `inquire`.
#[derive(Debug, Default)]
pub struct InquirePrompt;

impl Prompt for InquirePrompt {
    // inquire owns the terminal in raw mode, so Ctrl+C arrives as a key
    // and comes back as `OperationInterrupted` rather than a signal.
    async fn text(&mut self, message: &str) -> Result<String, VboxError> {
        inquire::Text::new(message.trim_end())
            .prompt()
            .map_err(map_inquire_err)
    }
}

fn map_inquire_err(e: inquire::InquireError) -> VboxError {
    match e {
        inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted => {
            VboxError::Interrupted
        }
        inquire::InquireError::IO(source) => VboxError::Io {
            context: "reading terminal input".into(),
            source,
        },
        other => VboxError::Io {
            context: format!("prompt error: {other}"),
            source: std::io::Error::other(other.to_string()),
        },
    }
}

/// Plain prompt for piped input: prints the message, reads one line.
///
/// Reading is async so a pending read can be raced against Ctrl+C; a read
/// abandoned that way leaves already-buffered input in `input`.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: AsyncBufRead + Unpin, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: AsyncBufRead + Unpin, W: Write> Prompt for LinePrompt<R, W> {
    async fn text(&mut self, message: &str) -> Result<String, VboxError> {
        let io_err = |source| VboxError::Io {
            context: "reading input".into(),
            source,
        };

        write!(self.output, "{message}").map_err(io_err)?;
        self.output.flush().map_err(io_err)?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await.map_err(io_err)? == 0 {
            return Err(VboxError::InputClosed);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(line)
    }
}

/// Answers questions from a fixed script and records what was asked.
/// Runs out with `InputClosed`, like a pipe reaching EOF.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<Result<String, Interrupt>>,
    asked: Vec<String>,
}

/// Marker for a scripted Ctrl+C.
#[derive(Debug)]
pub struct Interrupt;

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(|a| Ok(a.into())).collect(),
            asked: Vec::new(),
        }
    }

    /// Queue a Ctrl+C as the next answer.
    pub fn then_interrupt(mut self) -> Self {
        self.answers.push_back(Err(Interrupt));
        self
    }

    /// Queue another answer after any interrupt.
    pub fn then(mut self, answer: impl Into<String>) -> Self {
        self.answers.push_back(Ok(answer.into()));
        self
    }

    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompt for ScriptedPrompt {
    async fn text(&mut self, message: &str) -> Result<String, VboxError> {
        self.asked.push(message.to_string());
        match self.answers.pop_front() {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(Interrupt)) => Err(VboxError::Interrupted),
            None => Err(VboxError::InputClosed),
        }
    }
}
