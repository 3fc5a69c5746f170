//! imd - Intelligent Music Discovery terminal client
//!
//! Talks to the recommendation backend over HTTP. One-shot subcommands for
//! scripting (`library`, `recommend`, `upload`) and an interactive `shell`.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{ExitCode, Stdio};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use imd_common::config::{ClientConfig, ConfigResolver, API_BASE_URL_ENV};
use imd_common::events::EventBus;
use imd_ui::api::{AudioUpload, EndpointFamily, ACCEPTED_EXTENSIONS};
use imd_ui::library::filter_library;
use imd_ui::view::{self, LibraryListing};
use imd_ui::{QueryOutcome, Session};
use reqwest::Url;
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod shell;

/// Command-line arguments for imd
#[derive(Parser, Debug)]
#[command(name = "imd")]
#[command(about = "Intelligent Music Discovery client")]
#[command(version)]
struct Args {
    /// Recommendation backend base URL
    #[arg(long, global = true, env = API_BASE_URL_ENV)]
    api_base_url: Option<String>,

    /// Config file (default: $XDG_CONFIG_HOME/imd/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the song library
    Library {
        /// Case-insensitive filter on track or artist
        #[arg(short, long)]
        filter: Option<String>,

        /// Maximum number of entries
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Recommendations by song name
    Recommend {
        /// Song name (words are joined with spaces)
        #[arg(required = true)]
        name: Vec<String>,

        /// Open a web search for the top match
        #[arg(long)]
        open: bool,
    },

    /// Recommendations by uploaded audio (first file is used)
    Upload {
        /// Audio files (.mp3, .wav, .flac)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Open a web search for the uploaded file
        #[arg(long)]
        open: bool,
    },

    /// Interactive session
    Shell,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = ConfigResolver::new()
        .with_cli_base_url(args.api_base_url.clone().filter(|url| !url.trim().is_empty()))
        .with_config_file(args.config.clone())
        .resolve()
        .context("Failed to resolve configuration")?;

    init_tracing(&config, args.log_level.as_deref())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        built = env!("BUILD_TIMESTAMP"),
        profile = env!("BUILD_PROFILE"),
        "Starting imd"
    );
    info!(base_url = %config.api_base_url, "Configuration resolved");

    let event_bus = EventBus::new(100);
    let session =
        Session::from_config(&config, event_bus).context("Failed to create API client")?;

    match args.command {
        Command::Library { filter, limit } => {
            run_library(&session, &config, filter.as_deref().unwrap_or(""), limit).await
        }
        Command::Recommend { name, open } => run_recommend(&session, &name.join(" "), open).await,
        Command::Upload { files, open } => run_upload(&session, &files, open).await,
        Command::Shell => shell::run(session, &config).await.map(|_| ExitCode::SUCCESS),
    }
}

/// Initialize tracing to stderr or the configured log file
fn init_tracing(config: &ClientConfig, cli_level: Option<&str>) -> Result<()> {
    let level = cli_level.unwrap_or(config.logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("imd={0},imd_ui={0},imd_common={0}", level))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match &config.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

async fn run_library(
    session: &Session,
    config: &ClientConfig,
    filter: &str,
    limit: Option<usize>,
) -> Result<ExitCode> {
    let songs = match session.library().await {
        Ok(songs) => songs,
        Err(e) => {
            println!("{}", view::library_panel(&LibraryListing::Failed, filter));
            eprintln!("{}", e.user_message(EndpointFamily::Library));
            return Ok(ExitCode::FAILURE);
        }
    };

    let limit = limit.unwrap_or(config.library_filter_limit);
    let listing = LibraryListing::Ready(filter_library(&songs, filter, limit));
    println!("{}", view::library_panel(&listing, filter));
    Ok(ExitCode::SUCCESS)
}

async fn run_recommend(session: &Session, name: &str, open: bool) -> Result<ExitCode> {
    let Some(outcome) = session.search(name).await else {
        eprintln!("Nothing to search for");
        return Ok(ExitCode::FAILURE);
    };

    print_results(session);
    if open {
        play(session)?;
    }
    Ok(exit_code(&outcome))
}

async fn run_upload(session: &Session, files: &[PathBuf], open: bool) -> Result<ExitCode> {
    let mut uploads = Vec::with_capacity(files.len());
    for path in files {
        uploads.push(read_upload(path).await?);
    }

    let started = Instant::now();
    let upload = session.upload(uploads);
    tokio::pin!(upload);

    let mut ticker = tokio::time::interval(Duration::from_millis(200));
    let outcome = loop {
        tokio::select! {
            outcome = &mut upload => break outcome,
            _ = ticker.tick() => {
                eprint!("\r{}", view::progress_line(view::estimated_progress(started.elapsed())));
            }
        }
    };
    eprintln!("\r{}", view::progress_line(100.0));

    let Some(outcome) = outcome else {
        eprintln!("No audio file given");
        return Ok(ExitCode::FAILURE);
    };

    print_results(session);
    if open {
        play(session)?;
    }
    Ok(exit_code(&outcome))
}

/// Read an audio file for upload; unknown extensions are only warned about
async fn read_upload(path: &Path) -> Result<AudioUpload> {
    let upload = AudioUpload::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if !upload.has_accepted_extension() {
        warn!(
            file = %upload.file_name,
            accepted = ?ACCEPTED_EXTENSIONS,
            "Unexpected audio file extension, uploading anyway"
        );
    }
    Ok(upload)
}

/// Title, results, analysis and now-playing bar for the current state
pub(crate) fn print_results(session: &Session) {
    let state = session.state();
    let now_playing = session.now_playing();

    println!("{}", view::recommendations_title(now_playing.as_ref()));
    println!("{}", view::results_panel(&state));
    if let Some(panel) = view::analysis_panel(&state) {
        println!();
        println!("{}", panel);
    }
    if let Some(bar) = view::now_playing_bar(now_playing.as_ref()) {
        println!();
        println!("{}", bar);
    }
}

/// Open (or print) the web search for the now-playing song
pub(crate) fn play(session: &Session) -> Result<()> {
    match session.play_url(None)? {
        Some(url) => open_url(&url),
        None => {
            println!("Nothing selected");
            Ok(())
        }
    }
}

/// Hand a URL to the platform opener, printing it if that is not possible
pub(crate) fn open_url(url: &Url) -> Result<()> {
    let Some(mut command) = opener() else {
        println!("{}", url);
        return Ok(());
    };

    match command
        .arg(url.as_str())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(_) => {
            info!(url = %url, "Opened web search");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Failed to launch browser");
            println!("{}", url);
            Ok(())
        }
    }
}

fn opener() -> Option<std::process::Command> {
    if cfg!(target_os = "macos") {
        Some(std::process::Command::new("open"))
    } else if cfg!(windows) {
        let mut command = std::process::Command::new("cmd");
        command.args(["/C", "start", ""]);
        Some(command)
    } else if cfg!(unix) {
        Some(std::process::Command::new("xdg-open"))
    } else {
        None
    }
}

fn exit_code(outcome: &QueryOutcome) -> ExitCode {
    match outcome {
        QueryOutcome::Failed { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}
