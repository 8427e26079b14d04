use miette::Diagnostic;
use thiserror::Error;

use crate::validate::ValidationError;

#[derive(Debug, Error, Diagnostic)]
pub enum VboxError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error("{tool} command not found")]
    #[diagnostic(help("Make sure VirtualBox is installed and added to system PATH."))]
    ToolNotFound { tool: String },

    #[error("{command} failed with exit status {}", exit_status(.code))]
    Tool {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config from {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("operation interrupted")]
    Interrupted,

    #[error("input closed")]
    InputClosed,
}

fn exit_status(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}
