//! Command-line interface definitions
//!
//! Arguments are grouped by **functional usage**: each group holds the
//! options one part of the sidecar consumes.

use anyhow::Result;
use clap::Parser;
use tracing::Level;

/// Read-only filesystem sidecar speaking length-prefixed JSON over stdio
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Registration configuration
    #[command(flatten)]
    pub registration: RegistrationConfig,

    /// Output and logging configuration
    #[command(flatten)]
    pub output: OutputConfig,
}

// ============================================================================
// FUNCTIONAL GROUPS: Organized by what component consumes them
// ============================================================================

/// Registration configuration
///
/// Used by: `SidecarServer::start()`
#[derive(clap::Args, Debug, Clone, Default)]
#[command(next_help_heading = "Registration Options")]
pub struct RegistrationConfig {
    /// Machine identity; the provider registers as `file-sidecar-<name>`
    ///
    /// Without it (or when empty) nothing is registered, requests are still
    /// served.
    #[arg(long, env = "CHE_MACHINE_NAME", value_name = "NAME")]
    pub machine_name: Option<String>,
}

/// Output and logging configuration
///
/// Used by: `main()`, logging initialization
///
/// Logs always go to stderr; stdout carries the protocol.
#[derive(clap::Args, Debug, Clone, Default)]
#[command(next_help_heading = "Output Options")]
pub struct OutputConfig {
    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except errors)
    #[arg(short, long)]
    pub quiet: bool,
}

impl OutputConfig {
    /// Maximum log level for the subscriber
    #[must_use]
    pub const fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

impl Args {
    /// Validate command-line arguments
    ///
    /// # Errors
    ///
    /// This function will return an error if both --quiet and --verbose
    /// options are used.
    pub fn validate(&self) -> Result<()> {
        if self.output.quiet && self.output.verbose > 0 {
            anyhow::bail!("Cannot use both --quiet and --verbose options");
        }
        Ok(())
    }

    /// Machine identity, `None` when absent or empty
    #[must_use]
    pub fn machine_name(&self) -> Option<&str> {
        self.registration
            .machine_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }
}
