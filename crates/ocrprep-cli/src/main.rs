use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use ocrprep_core::config::{ConfigLoader, ModelSource, OcrPrepConfig};
use ocrprep_core::downloader::ModelDownloader;
use ocrprep_core::environment::{probe_interpreter, VirtualEnv};
use ocrprep_core::{Bootstrap, Locale, StdoutConsole, SystemCommandRunner};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[clap(
    name = "ocrprep",
    author,
    version,
    about = "Prepare a local DeepSeek-OCR workspace"
)]
struct Cli {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(
        long,
        short,
        global = true,
        help = "Configuration file (defaults to ocrprep.yaml in the working directory, if present)"
    )]
    config: Option<PathBuf>,

    #[clap(long, short = 'C', global = true, help = "Workspace directory (defaults to the current directory)")]
    workdir: Option<PathBuf>,

    #[clap(long, short, global = true, default_value = "info")]
    log_level: String,

    #[clap(long, global = true, help = "Append log output to this file instead of stderr")]
    log_file: Option<PathBuf>,

    #[clap(long, global = true, help = "Message language: en or zh")]
    locale: Option<String>,

    #[clap(long, global = true, help = "Python interpreter used to create the environment")]
    python: Option<String>,

    #[clap(long, global = true, help = "Do not wait for Enter before exiting")]
    no_pause: bool,

    #[clap(long, global = true, help = "Fetch models with the built-in downloader instead of the download script")]
    builtin_downloader: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Run the full setup (default command)
    Setup,
    /// Download the model files only
    Download,
    /// Show what is already in place
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_file.as_deref())?;

    let interactive = std::io::stdin().is_terminal();

    let (workdir, config, source) = match prepare(&cli).await {
        Ok(prepared) => prepared,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            if should_pause(&cli, true, interactive) {
                pause(startup_locale(&cli));
            }
            std::process::exit(1);
        }
    };

    let code = match cli.command.unwrap_or(Commands::Setup) {
        Commands::Setup => {
            let code = run_setup(&config, &workdir).await;
            if should_pause(&cli, config.pause_on_exit, interactive) {
                pause(config.locale);
            }
            code
        }
        Commands::Download => run_download(&config, &workdir).await?,
        Commands::Status => run_status(&config, &workdir, source.as_deref()).await,
    };

    std::process::exit(code);
}

fn init_logging(level: &str, log_file: Option<&Path>) -> Result<()> {
    let log_level_filter = level.parse().unwrap_or(LevelFilter::Info);
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log_level_filter);

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

/// Absolute workspace directory, configuration, and the file it came from
async fn prepare(cli: &Cli) -> Result<(PathBuf, OcrPrepConfig, Option<PathBuf>)> {
    let workdir = match &cli.workdir {
        Some(dir) => std::path::absolute(dir)
            .with_context(|| format!("Invalid workspace directory {}", dir.display()))?,
        None => std::env::current_dir().context("Failed to determine the current directory")?,
    };

    let (mut config, source) = ConfigLoader::load_or_default(cli.config.as_deref(), &workdir)
        .await
        .context("Failed to load configuration")?;
    apply_cli_overrides(&mut config, cli)?;
    config.validate()?;
    Ok((workdir, config, source))
}

/// Locale for messages printed before the configuration is available
fn startup_locale(cli: &Cli) -> Locale {
    cli.locale
        .as_deref()
        .and_then(|l| l.parse().ok())
        .unwrap_or_default()
}

fn apply_cli_overrides(config: &mut OcrPrepConfig, cli: &Cli) -> Result<()> {
    if let Some(locale) = &cli.locale {
        config.locale = locale.parse::<Locale>()?;
    }
    if let Some(python) = &cli.python {
        config.interpreter = python.clone();
    }
    if cli.builtin_downloader {
        config.models.source = ModelSource::Builtin;
    }
    Ok(())
}

/// Only `setup` pauses; it is the command run by double-clicking
fn should_pause(cli: &Cli, pause_on_exit: bool, interactive: bool) -> bool {
    cli.command.unwrap_or(Commands::Setup) == Commands::Setup
        && !cli.no_pause
        && pause_on_exit
        && interactive
}

fn pause(locale: Locale) {
    let prompt = locale.messages().press_enter();
    if let Err(e) = dialoguer::Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
    {
        log::debug!("Pause prompt failed: {}", e);
    }
}

async fn run_setup(config: &OcrPrepConfig, workdir: &Path) -> i32 {
    let runner = SystemCommandRunner::new();
    let console = StdoutConsole;
    let report = Bootstrap::new(config, config.resolve(workdir), &runner, &console)
        .run()
        .await;

    if let Some(err) = &report.error {
        log::info!("Setup ended with exit code {} ({})", report.exit_code, err);
    }
    report.exit_code
}

async fn run_download(config: &OcrPrepConfig, workdir: &Path) -> Result<i32> {
    let messages = config.locale.messages();
    let paths = config.resolve(workdir);
    let downloader = ModelDownloader::from_config(&config.models)?;

    println!("{}", messages.downloading_models());
    tokio::select! {
        result = downloader.download_all(&paths.models_dir) => {
            let summary = result?;
            println!("{}", messages.download_summary(summary.succeeded(), summary.total));
            if summary.is_complete() {
                println!("{}", messages.models_ready());
                Ok(0)
            } else {
                println!("{}", messages.failed_files());
                for name in &summary.failed {
                    println!("  - {}", name);
                }
                for line in messages.models_incomplete(&config.models.manual_url) {
                    println!("{}", line);
                }
                Ok(1)
            }
        }
        _ = tokio::signal::ctrl_c() => {
            log::warn!("Interrupted, partial files are kept for resuming");
            println!("{}", messages.download_cancelled());
            Ok(1)
        }
    }
}

async fn run_status(config: &OcrPrepConfig, workdir: &Path, source: Option<&Path>) -> i32 {
    let messages = config.locale.messages();
    let paths = config.resolve(workdir);
    let runner = SystemCommandRunner::new();

    match source {
        Some(path) => println!("config: {}", path.display()),
        None => println!("config: built-in defaults"),
    }

    let python = probe_interpreter(&runner, &config.interpreter).await;
    let python_detail = match &python {
        Ok(info) => info.version.clone(),
        Err(_) => config.interpreter.clone(),
    };
    let venv = VirtualEnv::new(&paths.env_dir);

    let entries = [
        ("python", python_detail, python.is_ok()),
        ("env", venv.python_path().display().to_string(), venv.exists()),
        ("requirements", paths.requirements.display().to_string(), paths.requirements.is_file()),
        ("download script", paths.download_script.display().to_string(), paths.download_script.is_file()),
        ("models", paths.models_dir.display().to_string(), paths.models_dir.is_dir()),
    ];
    for (label, detail, present) in entries {
        println!("{}", messages.status_entry(label, &detail, present));
    }
    0
}
