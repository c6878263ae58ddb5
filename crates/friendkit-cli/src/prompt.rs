//! Interactive prompts for launch parameters missing from the command line

use clap::ValueEnum;
use friendkit::{AccessToken, FriendsError, ReportFormat};
use std::io::{self, BufRead, Write};

/// Default report base path
pub const DEFAULT_REPORT_PATH: &str = "report";

/// Environment variable read for [`TokenSource::Env`]
pub const TOKEN_ENV_VAR: &str = "ACCESS_TOKEN";

/// Where the access token comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TokenSource {
    /// `ACCESS_TOKEN` environment variable
    Env,
    /// Typed in at the prompt
    Manual,
    /// `access_token` from the configuration file
    Config,
}

/// Line-based prompter over any reader/writer pair
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `message` and read one trimmed line
    pub fn ask(&mut self, message: &str) -> io::Result<String> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for an answer",
            ));
        }
        Ok(line.trim().to_string())
    }

    pub fn say(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message)
    }

    /// Ask until the answer is E, M or F
    pub fn token_source(&mut self) -> io::Result<TokenSource> {
        loop {
            self.say("Do you want get ACCESS_TOKEN from environment or enter manually?")?;
            self.say("Type \"E\" - from environment,")?;
            self.say("Type \"M\" - enter access token manually")?;
            let answer = self.ask("Type \"F\" - from configuration file\n")?;
            match answer.to_uppercase().as_str() {
                "E" => return Ok(TokenSource::Env),
                "M" => return Ok(TokenSource::Manual),
                "F" => return Ok(TokenSource::Config),
                _ => self.say("Incorrect input, try again")?,
            }
        }
    }

    pub fn manual_token(&mut self) -> io::Result<String> {
        self.ask("Enter vk access_token: ")
    }

    pub fn user_id(&mut self) -> Result<String, FriendsError> {
        let id = self.ask("Enter the user VK ID for which the report is required: ")?;
        if id.is_empty() {
            return Err(FriendsError::MissingUserId);
        }
        Ok(id)
    }

    /// Ask until the answer is a known format; an empty answer selects csv
    pub fn format(&mut self) -> io::Result<ReportFormat> {
        loop {
            let answer = self.ask(
                "Choose format of report file (available formats: csv, tsv, json) \
                 or press \"Enter\" to choose the csv: ",
            )?;
            if answer.is_empty() {
                return Ok(ReportFormat::Csv);
            }
            match answer.parse::<ReportFormat>() {
                Ok(format) => return Ok(format),
                Err(e) => self.say(&format!("{}, try again", e))?,
            }
        }
    }

    /// Ask for the report base path; an empty answer selects `report`
    pub fn output_path(&mut self, format: ReportFormat) -> io::Result<String> {
        let answer = self.ask(&format!(
            "Enter path to report file (example: type \"results/resfile\" to create \
             \"results/resfile.{ext}\") or press \"Enter\" to create file \
             \"{default}.{ext}\" in current directory: ",
            ext = format.extension(),
            default = DEFAULT_REPORT_PATH,
        ))?;
        if answer.is_empty() {
            Ok(DEFAULT_REPORT_PATH.to_string())
        } else {
            Ok(answer)
        }
    }
}

/// Resolve the access token from the chosen source
pub fn resolve_token<R: BufRead, W: Write>(
    source: TokenSource,
    prompter: &mut Prompter<R, W>,
    env_token: Option<String>,
    config_token: Option<&str>,
) -> Result<AccessToken, FriendsError> {
    let token = match source {
        TokenSource::Env => env_token,
        TokenSource::Manual => Some(prompter.manual_token()?),
        TokenSource::Config => config_token.map(str::to_string),
    };
    let token = AccessToken::new(token.unwrap_or_default().trim());
    if token.is_empty() {
        return Err(FriendsError::MissingAccessToken);
    }
    Ok(token)
}
