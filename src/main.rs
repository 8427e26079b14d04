use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use vboxmenu::backend::vboxmanage::VBoxManage;
use vboxmenu::cli::Cli;
use vboxmenu::config::{self, Settings};
use vboxmenu::error::VboxError;
use vboxmenu::interrupt::{self, Interrupts};
use vboxmenu::logging::SessionLog;
use vboxmenu::progress::OutputMode;
use vboxmenu::prompt::{InquirePrompt, LinePrompt, Prompt};
use vboxmenu::session::Session;

/// Exit status after Ctrl+C outside VM creation (128 + SIGINT).
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Terminal layer: off unless requested, since stderr log lines would
    // interleave with the menu.
    let terminal_filter = if cli.verbose {
        EnvFilter::new("vboxmenu=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"))
    };

    let terminal_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(terminal_filter);

    // File layer: discards until settings name a log file
    let session_log = SessionLog::default();
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(session_log.clone())
        .with_filter(EnvFilter::new("vboxmenu=debug"));

    tracing_subscriber::registry()
        .with(terminal_layer)
        .with(file_layer)
        .init();

    let settings = config::load_settings(&cli)?;

    match session_log.attach(&settings) {
        Ok(Some(path)) => tracing::debug!(path = %path.display(), "logging to file"),
        Ok(None) => {}
        Err(e) => {
            let path = settings.log_file.clone().unwrap_or_default();
            eprintln!("warning: cannot open log file {}: {e}", path.display());
        }
    }

    let mode = OutputMode::detect();
    tracing::info!(
        tool = %settings.tool.display(),
        base_dir = %settings.base_dir.display(),
        policy = ?settings.policy,
        ?mode,
        "starting session"
    );

    let executor = VBoxManage::new(settings.tool.clone(), mode);
    let interrupts = Interrupts::default();
    let session = async {
        match mode {
            OutputMode::Interactive => {
                run_session(executor, InquirePrompt, &settings, interrupts.clone()).await
            }
            OutputMode::Plain => {
                let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                let prompt = LinePrompt::new(stdin, std::io::stdout());
                run_session(executor, prompt, &settings, interrupts.clone()).await
            }
        }
    };

    // Ctrl+C while VM creation runs is handled there; anywhere else it ends
    // the session.
    let result = tokio::select! {
        result = session => result,
        () = interrupt::forward_ctrl_c(interrupts.clone()) => Err(VboxError::Interrupted),
    };

    match result {
        Ok(()) => Ok(()),
        Err(VboxError::InputClosed) => {
            tracing::info!("input closed, ending session");
            Ok(())
        }
        Err(VboxError::Interrupted) => {
            tracing::info!("interrupted outside VM creation");
            eprintln!("Interrupted.");
            std::process::exit(EXIT_INTERRUPTED);
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_session<P: Prompt>(
    executor: VBoxManage,
    prompt: P,
    settings: &Settings,
    interrupts: Interrupts,
) -> Result<(), VboxError> {
    let mut session = Session::new(executor, prompt, std::io::stdout())
        .with_base_dir(settings.base_dir.clone())
        .with_policy(settings.policy)
        .with_interrupts(interrupts);
    session.run().await
}
