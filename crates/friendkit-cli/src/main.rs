//! FriendKit CLI - Export a VK user's friend list to a report file

mod prompt;
mod settings;

use clap::{Parser, ValueEnum};
use friendkit::{
    export_friends, AccessToken, ExportSummary, FriendsError, JsonFraming, ReportFormat,
    SinkOptions, VkFriendsClient,
};
use prompt::{resolve_token, Prompter, TokenSource, TOKEN_ENV_VAR};
use settings::Settings;
use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SEPARATOR: &str = "---------------------------------------------------------------";

/// Report format accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Tsv,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ReportFormat::Csv,
            FormatArg::Tsv => ReportFormat::Tsv,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

/// FriendKit - export a VK user's friends to CSV, TSV or JSON
///
/// Parameters not given as flags are asked for interactively.
#[derive(Parser, Debug)]
#[command(name = "friendkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// VK access token
    #[arg(long, conflicts_with = "token_source")]
    token: Option<String>,

    /// Where to read the access token from
    #[arg(long, value_enum)]
    token_source: Option<TokenSource>,

    /// VK id of the user whose friends are exported
    #[arg(long)]
    user_id: Option<String>,

    /// Report format
    #[arg(long, short, value_enum)]
    format: Option<FormatArg>,

    /// Report path without extension; directories are created as needed
    #[arg(long, short)]
    output: Option<String>,

    /// Write the JSON report as a strictly valid array
    #[arg(long)]
    strict_json: bool,

    /// Friends requested per page (overrides the configuration file)
    #[arg(long)]
    page_size: Option<u32>,

    /// Configuration file
    #[arg(long, default_value = "friendkit.toml")]
    config: PathBuf,

    /// Log file, truncated on every run
    #[arg(long, default_value = "friendkit.log")]
    log_file: PathBuf,
}

/// Everything needed to run one export
#[derive(Debug)]
struct LaunchParams {
    access_token: AccessToken,
    user_id: String,
    format: ReportFormat,
    output: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_file) {
        eprintln!(
            "Error: cannot open log file {}: {}",
            cli.log_file.display(),
            e
        );
        std::process::exit(1);
    }

    println!("Hello, welcome to VK get friends report service");
    println!("{}", SEPARATOR);

    let settings = match Settings::load(&cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, config = %cli.config.display(), "Failed to read configuration");
            eprintln!("Error: failed to read configuration {}: {}", cli.config.display(), e);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    let params = match launch_params(&cli, &settings, &mut prompter) {
        Ok(params) => params,
        Err(e) => {
            error!(error = %e, "An error occurred while passing parameters to start the service");
            eprintln!("An error occurred while passing parameters to start the service.");
            eprintln!("Make sure the entered data is correct and try again.");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        user_id = %params.user_id,
        format = %params.format,
        output = %params.output,
        "Parameters to start the service successfully accepted"
    );

    println!("{}", SEPARATOR);
    println!("........Preparing report file........Please wait........");

    let page_size = cli.page_size.unwrap_or(settings.page_size);
    let options = SinkOptions {
        json_framing: if cli.strict_json {
            JsonFraming::Strict
        } else {
            JsonFraming::Legacy
        },
    };
    let report_path = params.format.report_path(&params.output);

    match run_export(params, &settings, page_size, options).await {
        Ok(summary) => {
            info!(path = %report_path.display(), "Report successfully created");
            println!("{}", SEPARATOR);
            println!(
                "Report successfully created: {} ({} friends, {} deactivated skipped)",
                report_path.display(),
                summary.written,
                summary.skipped
            );
        }
        Err(e) => {
            error!(error = %e, "Report creation failed");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Log to `path` without colors; `RUST_LOG` overrides the `info` default
fn init_logging(path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Take each parameter from its flag, or ask for it
fn launch_params<R: BufRead, W: Write>(
    cli: &Cli,
    settings: &Settings,
    prompter: &mut Prompter<R, W>,
) -> Result<LaunchParams, FriendsError> {
    let access_token = match &cli.token {
        Some(token) => {
            let token = AccessToken::new(token.trim());
            if token.is_empty() {
                return Err(FriendsError::MissingAccessToken);
            }
            token
        }
        None => {
            let source = match cli.token_source {
                Some(source) => source,
                None => prompter.token_source()?,
            };
            resolve_token(
                source,
                prompter,
                std::env::var(TOKEN_ENV_VAR).ok(),
                settings.access_token.as_deref(),
            )?
        }
    };
    prompter.say(SEPARATOR)?;

    let user_id = match &cli.user_id {
        Some(id) if id.trim().is_empty() => return Err(FriendsError::MissingUserId),
        Some(id) => id.trim().to_string(),
        None => prompter.user_id()?,
    };
    prompter.say(SEPARATOR)?;

    let format = match cli.format {
        Some(format) => format.into(),
        None => prompter.format()?,
    };
    prompter.say(SEPARATOR)?;

    let output = match &cli.output {
        Some(output) if !output.trim().is_empty() => output.trim().to_string(),
        Some(_) => prompt::DEFAULT_REPORT_PATH.to_string(),
        None => prompter.output_path(format)?,
    };

    Ok(LaunchParams {
        access_token,
        user_id,
        format,
        output,
    })
}

/// Create the report and fill it from the API
async fn run_export(
    params: LaunchParams,
    settings: &Settings,
    page_size: u32,
    options: SinkOptions,
) -> Result<ExportSummary, FriendsError> {
    if page_size == 0 {
        return Err(FriendsError::InvalidPageSize);
    }
    let client = VkFriendsClient::builder(params.access_token, params.user_id)
        .api_base(settings.api_base.as_str())
        .api_version(settings.api_version.as_str())
        .request_delay(settings.request_delay())
        .build()?;

    let report_path = params.format.report_path(&params.output);
    ensure_parent_dir(&report_path)?;
    let mut sink = params.format.create_sink(&params.output, &options)?;

    export_friends(&client, sink.as_mut(), page_size).await
}

/// Create the directories leading to `path`
fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent)?;
            info!(directory = %parent.display(), "Created report directory");
            Ok(())
        }
        _ => Ok(()),
    }
}
