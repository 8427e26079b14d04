use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::create::CreationPolicy;

#[derive(Parser, Debug)]
#[command(name = "vboxmenu", about = "Interactive VirtualBox VM manager")]
pub struct Cli {
    /// Path to config file (default: ./vboxmenu.toml, then the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// VBoxManage executable to run
    #[arg(long)]
    pub tool: Option<PathBuf>,

    /// Directory in which per-VM disk directories are created
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// What to do when a configuration step of VM creation fails
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Append debug logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print debug logs to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    /// Attempt every step, reporting each failure
    BestEffort,
    /// Stop at the first failed step
    AbortOnFailure,
}

impl From<PolicyArg> for CreationPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::BestEffort => CreationPolicy::BestEffort,
            PolicyArg::AbortOnFailure => CreationPolicy::AbortOnFailure,
        }
    }
}
