// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use napisub::app_config::{self, Config};
use napisub::catalog::{MediaQuery, VideoSignal, parse_media_id};
use napisub::catalog_service::CatalogService;
use napisub::file_utils::FileManager;
use napisub::formats::convert_to_srt;
use napisub::providers::RequestContext;
use napisub::providers::http::HttpTransport;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List subtitles for a movie or episode
    Search(SearchArgs),

    /// Download one subtitle by handle and save it as SRT
    Download(DownloadArgs),

    /// Convert local caption files to SRT
    Convert(ConvertArgs),

    /// Generate shell completions for napisub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct SearchArgs {
    /// Media id such as tt0111161 or tt0944947:1:2
    #[arg(long)]
    id: Option<String>,

    /// Title to search for
    #[arg(short, long)]
    title: Option<String>,

    /// Alternative (original or localised) title
    #[arg(long)]
    alt_title: Option<String>,

    /// Release year
    #[arg(short, long)]
    year: Option<u16>,

    /// Season number
    #[arg(short, long, requires = "episode")]
    season: Option<u32>,

    /// Episode number
    #[arg(short, long, requires = "season")]
    episode: Option<u32>,

    /// Duration of your video in seconds, for ranking
    #[arg(short, long)]
    duration: Option<f64>,

    /// Frame rate of your video, for ranking
    #[arg(long)]
    fps: Option<f64>,

    /// Show at most this many results
    #[arg(short = 'n', long, default_value_t = 20)]
    limit: usize,
}

#[derive(Parser, Debug)]
struct DownloadArgs {
    /// Subtitle handle printed by `search`
    handle: String,

    /// Output file (defaults to <handle>.srt)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Caption file or directory to convert
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Directory for converted files (defaults to next to the input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Frame rate for frame-indexed files without an fps header
    #[arg(long)]
    fps: Option<f64>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

/// napisub - NapiProjekt subtitle finder and caption converter
///
/// Searches the NapiProjekt catalog, downloads subtitles and converts
/// MicroDVD, MPL2 and timecoded captions to SRT.
#[derive(Parser, Debug)]
#[command(name = "napisub")]
#[command(version)]
#[command(about = "NapiProjekt subtitle finder and caption converter")]
#[command(long_about = "napisub finds subtitles in the NapiProjekt catalog and converts them to SRT.

EXAMPLES:
    napisub search -t \"Skazani na Shawshank\" -y 1994
    napisub search --id tt0944947:1:2 -d 3420
    napisub download 7c8d1e2f3a4b5c6d7e8f9a0b1c2d3e4f -o movie.srt
    napisub convert movie.txt
    napisub convert --fps 25 /subtitles/
    napisub completions bash > napisub.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and emoji for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (colour, emoji) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set once the config is read
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "napisub", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli.config_path, cli.log_level.clone())?;

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding requests");
            ctrl_c_token.cancel();
        }
    });
    let ctx = RequestContext::with_token(token);

    match cli.command {
        Commands::Search(args) => run_search(&config, args, &ctx).await,
        Commands::Download(args) => run_download(&config, args, &ctx).await,
        Commands::Convert(args) => run_convert(&config, args),
        Commands::Completions { .. } => Ok(()),
    }
}

fn load_config(config_path: &str, cli_level: Option<CliLogLevel>) -> Result<Config> {
    // Apply the command line level first so config loading is logged at that level
    if let Some(level) = &cli_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(config_path)?;
    if let Some(level) = cli_level {
        config.log_level = level.into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    Ok(config)
}

fn build_service(config: &Config) -> CatalogService {
    let transport = Arc::new(HttpTransport::from_config(&config.catalog));
    CatalogService::from_config(transport, config)
}

fn spinner(message: &str) -> ProgressBar {
    let progress_bar = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    progress_bar.set_style(style);
    progress_bar.set_message(message.to_string());
    progress_bar.enable_steady_tick(Duration::from_millis(120));
    progress_bar
}

async fn run_search(config: &Config, args: SearchArgs, ctx: &RequestContext) -> Result<()> {
    let (mut query, mut signal) = match &args.id {
        Some(id) => parse_media_id(id)?,
        None => (MediaQuery::default(), VideoSignal::default()),
    };

    if let Some(title) = args.title {
        query.title = title;
    }
    if let Some(alt_title) = args.alt_title {
        query.alternate_title = Some(alt_title);
    }
    if let Some(year) = args.year {
        query.year = Some(year);
    }
    if let (Some(season), Some(episode)) = (args.season, args.episode) {
        query = query.with_episode(season, episode);
    }
    if args.duration.is_some() {
        signal.duration_secs = args.duration;
    }
    if args.fps.is_some() {
        signal.fps = args.fps;
    }

    query.validate()?;

    let service = build_service(config);
    let progress_bar = spinner(&format!("Searching NapiProjekt for {}", query));
    let entries = service.list_subtitles(&query, &signal, ctx).await;
    progress_bar.finish_and_clear();

    if entries.is_empty() {
        warn!("No subtitles found for {}", query);
        return Ok(());
    }

    info!("Found {} subtitles for {}", entries.len(), query);
    let mut stdout = std::io::stdout();
    for (i, entry) in entries.iter().take(args.limit).enumerate() {
        writeln!(
            stdout,
            "{:>3}. {}  {}  {}",
            i + 1,
            entry.handle,
            entry.display_label(),
            entry.label
        )?;
    }

    Ok(())
}

async fn run_download(config: &Config, args: DownloadArgs, ctx: &RequestContext) -> Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}.srt", args.handle)));

    if output.exists() && !args.force_overwrite {
        warn!("Output file already exists: {:?}. Use -f to force overwrite.", output);
        return Ok(());
    }

    let service = build_service(config);
    let progress_bar = spinner(&format!("Downloading {}", args.handle));
    let caption = service.fetch_caption(&args.handle, ctx).await;
    progress_bar.finish_and_clear();

    match caption? {
        Some(srt) => {
            FileManager::write_to_file(&output, &srt)?;
            info!("Success: {:?}", output);
            Ok(())
        }
        None => Err(anyhow!("No usable subtitle for handle {}", args.handle)),
    }
}

fn run_convert(config: &Config, args: ConvertArgs) -> Result<()> {
    let fps = args.fps.unwrap_or(config.conversion.default_fps);
    if !(fps.is_finite() && fps > 0.0) {
        return Err(anyhow!("Frame rate must be positive, got {}", fps));
    }

    if FileManager::file_exists(&args.input_path) {
        let output_dir = output_dir_for(&args.input_path, args.output_dir.as_deref());
        convert_file(&args.input_path, &output_dir, fps, args.force_overwrite)?;
        return Ok(());
    }

    if !FileManager::dir_exists(&args.input_path) {
        return Err(anyhow!("Input path does not exist: {:?}", args.input_path));
    }

    let files = FileManager::find_subtitle_files(&args.input_path)?;
    info!("Converting {} caption files in {:?}", files.len(), args.input_path);

    let mut converted = 0;
    for file in &files {
        let output_dir = output_dir_for(file, args.output_dir.as_deref());
        match convert_file(file, &output_dir, fps, args.force_overwrite) {
            Ok(true) => converted += 1,
            Ok(false) => {}
            Err(e) => error!("Error converting {:?}: {}", file, e),
        }
    }

    info!("Finished converting {} of {} files", converted, files.len());
    Ok(())
}

fn output_dir_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.parent().unwrap_or(Path::new(".")).to_path_buf())
}

/// Convert one file; `Ok(false)` when it was skipped
fn convert_file(input: &Path, output_dir: &Path, fps: f64, force_overwrite: bool) -> Result<bool> {
    let text = FileManager::read_subtitle_text(input)?;

    let Some(srt) = convert_to_srt(&text, fps) else {
        warn!("Unrecognised caption format: {:?}", input);
        return Ok(false);
    };

    let mut output = FileManager::generate_output_path(input, output_dir, "");
    if output == input {
        output = FileManager::generate_output_path(input, output_dir, "converted");
    }

    if output.exists() && !force_overwrite {
        warn!("Output file already exists: {:?}. Use -f to force overwrite.", output);
        return Ok(false);
    }

    FileManager::write_to_file(&output, &srt)?;
    debug!("Converted {:?} -> {:?}", input, output);
    info!("Success: {:?}", output);
    Ok(true)
}
