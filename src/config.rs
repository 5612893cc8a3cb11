//! Command-line surface and validated redirect configuration.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use clap::Parser;

use crate::{AppError, Result};

/// Command-line options.
#[derive(Debug, Parser)]
#[command(
    name = "stdrelay",
    about = "Redirect stdin, stdout, and stderr to named IPC endpoints",
    version
)]
pub struct Cli {
    /// Endpoint name for this process's stdout.
    #[arg(short = 'o', long = "out", value_name = "NAME")]
    pub stdout_endpoint: Option<String>,

    /// Endpoint name for this process's stdin.
    #[arg(short = 'i', long = "in", value_name = "NAME")]
    pub stdin_endpoint: Option<String>,

    /// Endpoint name for this process's stderr.
    #[arg(short = 'e', long = "err", value_name = "NAME")]
    pub stderr_endpoint: Option<String>,

    /// Log file path; omitted means log output is discarded.
    #[arg(short = 'l', long = "logs", value_name = "FILE")]
    pub logs: Option<PathBuf>,
}

/// Standard stream a bridge is attached to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StdStream {
    /// The process's standard output.
    Stdout,
    /// The process's standard input.
    Stdin,
    /// The process's standard error.
    Stderr,
}

impl Display for StdStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stdin => write!(f, "stdin"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Validated redirect configuration; immutable once constructed.
#[derive(Debug, Clone)]
pub struct RedirectConfig {
    /// Endpoint name feeding this process's stdout, when requested.
    pub stdout_endpoint: Option<String>,
    /// Endpoint name fed by this process's stdin, when requested.
    pub stdin_endpoint: Option<String>,
    /// Endpoint name feeding this process's stderr, when requested.
    pub stderr_endpoint: Option<String>,
    /// Log destination; `None` routes log output to a no-op sink.
    pub log_file: Option<PathBuf>,
}

impl RedirectConfig {
    /// Build a validated configuration from parsed CLI options.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when an endpoint name is empty or is
    /// used for more than one stream.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let config = Self {
            stdout_endpoint: cli.stdout_endpoint,
            stdin_endpoint: cli.stdin_endpoint,
            stderr_endpoint: cli.stderr_endpoint,
            log_file: cli.logs,
        };
        config.validate()?;
        Ok(config)
    }

    /// The requested `(stream, endpoint name)` pairs, stdout first.
    #[must_use]
    pub fn endpoints(&self) -> Vec<(StdStream, String)> {
        let mut endpoints = Vec::new();
        if let Some(name) = &self.stdout_endpoint {
            endpoints.push((StdStream::Stdout, name.clone()));
        }
        if let Some(name) = &self.stdin_endpoint {
            endpoints.push((StdStream::Stdin, name.clone()));
        }
        if let Some(name) = &self.stderr_endpoint {
            endpoints.push((StdStream::Stderr, name.clone()));
        }
        endpoints
    }

    /// Endpoint names must be non-empty and unique among the active set.
    fn validate(&self) -> Result<()> {
        let mut seen: Vec<String> = Vec::new();
        for (stream, name) in self.endpoints() {
            if name.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "empty endpoint name for {stream}"
                )));
            }
            if seen.contains(&name) {
                return Err(AppError::Config(format!(
                    "endpoint name '{name}' is used for more than one stream"
                )));
            }
            seen.push(name);
        }
        Ok(())
    }
}
