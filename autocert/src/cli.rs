use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use crate::commands;
use crate::config::CONFIG_PATH_ENV;

/// Autocert - Check certificate expiry and renew through certbot
#[derive(Parser)]
#[command(name = "autocert")]
#[command(version)]
#[command(about = "Autocert - Check certificate expiry and renew through certbot")]
#[command(group(ArgGroup::new("mode").args(["list", "check", "issue"])))]
pub struct Cli {
    /// Config file, TOML or `.env` (default: ./autocert.toml, then ./.env)
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,

    /// Show verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// List every certificate in the store, soonest expiry first
    #[arg(long)]
    pub list: bool,

    /// Print the listing as JSON (with --list)
    #[arg(long, requires = "list")]
    pub json: bool,

    /// Show expiry status for one domain
    #[arg(long, value_name = "DOMAIN")]
    pub check: Option<String>,

    /// Issue a certificate for one domain regardless of expiry
    #[arg(long, value_name = "DOMAIN")]
    pub issue: Option<String>,

    /// Report renewal decisions without invoking the CA client
    #[arg(long, conflicts_with_all = ["list", "check"])]
    pub dry_run: bool,
}

/// What this invocation does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    CheckAndRenew { dry_run: bool },
    List { json: bool },
    Check { domain: String },
    Issue { domain: String, dry_run: bool },
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.list {
            Mode::List { json: self.json }
        } else if let Some(domain) = &self.check {
            Mode::Check {
                domain: domain.clone(),
            }
        } else if let Some(domain) = &self.issue {
            Mode::Issue {
                domain: domain.clone(),
                dry_run: self.dry_run,
            }
        } else {
            Mode::CheckAndRenew {
                dry_run: self.dry_run,
            }
        }
    }

    /// Run the selected mode, returning the process exit code.
    pub fn run(self) -> Result<i32, Box<dyn std::error::Error>> {
        let config_path = self.config.as_deref();
        match self.mode() {
            Mode::CheckAndRenew { dry_run } => commands::renew::run(config_path, dry_run),
            Mode::List { json } => commands::list::run(config_path, json),
            Mode::Check { domain } => commands::check::run(config_path, &domain),
            Mode::Issue { domain, dry_run } => commands::issue::run(config_path, &domain, dry_run),
        }
    }
}
