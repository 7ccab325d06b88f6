use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser};

use kicker::cli::Cli;
use kicker::config::Settings;
use kicker::exec::{CommandExecutor, DesktopNotifier, Notifier};
use kicker::logging::{self, LogSink, TracingSink};
use kicker::{Kicker, StartError, build_registry};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Cannot load config from {}", path.display()))?,
        None => Settings::load().context("Cannot load configuration")?,
    };
    cli.apply(&mut settings);

    if cli.show_config {
        print!("{}", settings.to_toml()?);
        return Ok(ExitCode::SUCCESS);
    }

    logging::init_with_config(&settings.logging);

    let registry = match build_registry(&settings) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let log: Arc<dyn LogSink> = Arc::new(TracingSink);
    let notifier: Option<Arc<dyn Notifier>> = settings
        .notifications
        .enabled
        .then(|| Arc::new(DesktopNotifier::new()) as Arc<dyn Notifier>);

    let mut executor = CommandExecutor::new(log.clone())
        .with_click_command(settings.notifications.click_command.clone());
    if let Some(notifier) = &notifier {
        executor = executor.with_notifier(notifier.clone());
    }

    let kicker = Kicker::builder()
        .paths(settings.paths.clone())
        .latency_ms(settings.latency_ms)
        .chain(registry.build())
        .executor(Arc::new(executor))
        .log(log)
        .notifier(notifier)
        .build()?;

    match kicker.validate() {
        Ok(()) => {}
        Err(StartError::NoHandlers) => {
            Cli::command().print_help()?;
            return Ok(ExitCode::FAILURE);
        }
        Err(e @ StartError::MissingPath(_)) => {
            eprintln!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    }

    kicker.start().await?;
    Ok(ExitCode::SUCCESS)
}
