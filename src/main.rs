use clap::Parser;
use cloudenum::cli::{self, Args, LogLevel};
use cloudenum::config::Config;
use cloudenum::error::{Error, Result};
use cloudenum::options::Options;
use cloudenum::output::TextReporter;
use cloudenum::{dispatch, router};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::fmt::writer::MakeWriterExt;

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Could not open log file {}: {}", log_path.display(), e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("cloudenum {} started with log level: {:?}", cloudenum::VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("cloudenum").join("cloudenum.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".cloudenum").join("cloudenum.log");
    }
    PathBuf::from("cloudenum.log")
}

async fn run(args: &Args) -> Result<()> {
    let config = Config::load();
    let options = Options::from_args(args, &config)?;
    let route = router::route(&options)?;

    let mut reporter = TextReporter::stdio(options.output);
    dispatch::run(&options, route, &mut reporter).await?;

    tracing::info!(
        "Finished with {} findings and {} failed calls",
        reporter.findings(),
        reporter.failures()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let argv = cli::normalize_flags(std::env::args());
    let args = match Args::try_parse_from(&argv) {
        Ok(args) => args,
        Err(e) => {
            // --help and --version come through here too
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    let _guard = setup_logging(args.log_level);

    if args.examples {
        cli::print_examples();
        return ExitCode::SUCCESS;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", err);
            eprintln!("Error: {}", err);
            if matches!(err, Error::Validation(_)) {
                eprintln!("Run 'cloudenum --help' for usage, or 'cloudenum -examples' for examples");
            }
            ExitCode::from(err.exit_code())
        }
    }
}
