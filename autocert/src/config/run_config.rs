use autocert_core::{DEFAULT_THRESHOLD_DAYS, DomainConfig, validate_domain_name};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "AUTOCERT_CONFIG";

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "autocert.toml";

/// `KEY=value` file picked up when there is no `autocert.toml`.
pub const DEFAULT_DOTENV_FILE: &str = ".env";

pub const DEFAULT_CERT_STORE: &str = "/etc/letsencrypt/live";
pub const DEFAULT_CERTBOT_BIN: &str = "certbot";
pub const DEFAULT_RELOAD_COMMAND: &[&str] = &["systemctl", "reload", "nginx"];

/// Settings for one invocation, loaded once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// HTTP-01 webroot. `None` runs the CA client in standalone mode.
    pub webroot: Option<PathBuf>,
    /// Configured domains, in file order
    pub domains: Vec<DomainConfig>,
    /// Threshold applied to domains without their own
    pub default_threshold_days: u32,
    /// Reload the web server after at least one successful renewal
    pub reload_webserver: bool,
    /// ACME account contact
    pub email: Option<String>,
    /// The CA client's live certificate directory
    pub cert_store: PathBuf,
    pub certbot_bin: String,
    pub reload_command: Vec<String>,
    /// Use the CA's staging environment
    pub staging: bool,
    /// When false, decisions are reported and nothing is invoked
    pub renewals_enabled: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            webroot: None,
            domains: Vec::new(),
            default_threshold_days: DEFAULT_THRESHOLD_DAYS,
            reload_webserver: true,
            email: None,
            cert_store: PathBuf::from(DEFAULT_CERT_STORE),
            certbot_bin: DEFAULT_CERTBOT_BIN.to_string(),
            reload_command: DEFAULT_RELOAD_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
            staging: false,
            renewals_enabled: true,
        }
    }
}

/// File layout: the same keys as the environment, as top-level TOML keys.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
struct RawConfig {
    webroot_path: Option<PathBuf>,
    domains: Option<RawDomains>,
    threshold_days: Option<u32>,
    update_nginx: Option<bool>,
    email: Option<String>,
    cert_store: Option<PathBuf>,
    certbot_bin: Option<String>,
    reload_command: Option<RawCommand>,
    staging: Option<bool>,
    use_certbot: Option<bool>,
}

/// `DOMAINS = "a.com, b.com"` or `[[DOMAINS]]` tables.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDomains {
    List(String),
    Tables(Vec<RawDomain>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDomain {
    name: String,
    threshold_days: Option<u32>,
}

/// `RELOAD_COMMAND = "systemctl reload nginx"` or an argv array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCommand {
    Line(String),
    Argv(Vec<String>),
}

impl RawCommand {
    fn into_argv(self) -> Vec<String> {
        match self {
            RawCommand::Line(line) => split_command_line(&line),
            RawCommand::Argv(argv) => argv,
        }
    }
}

/// How a config file is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    /// `KEY=value` lines
    Dotenv,
}

impl ConfigFormat {
    /// `.env` and `*.env` are dotenv files; anything else is TOML.
    fn for_path(path: &Path) -> Self {
        let is_dotenv = path.file_name().is_some_and(|n| n == DEFAULT_DOTENV_FILE)
            || path.extension().is_some_and(|e| e == "env");
        if is_dotenv {
            ConfigFormat::Dotenv
        } else {
            ConfigFormat::Toml
        }
    }
}

impl RunConfig {
    /// Load from a config file and the process environment.
    ///
    /// An explicit `path` must exist. Without one, `autocert.toml` in the working
    /// directory is used when present, then `.env`, otherwise only the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileMissing(path.to_path_buf()));
                }
                Some(path.to_path_buf())
            }
            None => [DEFAULT_CONFIG_FILE, DEFAULT_DOTENV_FILE]
                .into_iter()
                .map(PathBuf::from)
                .find(|p| p.exists()),
        };

        let process_env = |key: &str| std::env::var(key).ok();
        match file {
            Some(file) => {
                tracing::debug!("Loading config from {}", file.display());
                let content = read_file(&file)?;
                match ConfigFormat::for_path(&file) {
                    ConfigFormat::Toml => Self::from_sources(Some(&content), process_env),
                    ConfigFormat::Dotenv => Self::from_dotenv(&content, process_env),
                }
            }
            None => Self::from_sources(None, process_env),
        }
    }

    /// Build a config from `KEY=value` content and an environment lookup.
    ///
    /// The file's values are read exactly like environment variables, with the
    /// real environment taking precedence. Keys autocert does not know are
    /// ignored.
    pub fn from_dotenv<F>(content: &str, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = dotenvy::from_read_iter(content.as_bytes())
            .collect::<std::result::Result<HashMap<String, String>, _>>()?;

        Self::from_sources(None, |key| {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file.get(key).cloned())
        })
    }

    /// Build a config from optional TOML content and an environment lookup.
    ///
    /// Environment values win over the file. Empty environment values count as
    /// unset.
    pub fn from_sources<F>(content: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawConfig = match content {
            Some(content) if !content.trim().is_empty() => toml::from_str(content)?,
            _ => RawConfig::default(),
        };
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let mut config = RunConfig::default();

        if let Some(days) = raw.threshold_days {
            config.default_threshold_days = days;
        }
        if let Some(value) = env("THRESHOLD_DAYS") {
            let value = value.trim();
            config.default_threshold_days =
                value.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                    key: "THRESHOLD_DAYS",
                    message: format!("'{}' is not a non-negative integer", value),
                })?;
        }

        config.webroot = env("WEBROOT_PATH")
            .map(|v| PathBuf::from(v.trim()))
            .or(raw.webroot_path)
            .filter(|p| !p.as_os_str().is_empty());

        config.reload_webserver = match env("UPDATE_NGINX") {
            Some(v) => parse_bool("UPDATE_NGINX", &v)?,
            None => raw.update_nginx.unwrap_or(config.reload_webserver),
        };
        config.staging = match env("STAGING") {
            Some(v) => parse_bool("STAGING", &v)?,
            None => raw.staging.unwrap_or(config.staging),
        };
        config.renewals_enabled = match env("USE_CERTBOT") {
            Some(v) => parse_bool("USE_CERTBOT", &v)?,
            None => raw.use_certbot.unwrap_or(config.renewals_enabled),
        };

        config.email = env("EMAIL")
            .or(raw.email)
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        if let Some(store) = env("CERT_STORE")
            .map(|v| PathBuf::from(v.trim()))
            .or(raw.cert_store)
        {
            config.cert_store = store;
        }
        if let Some(bin) = env("CERTBOT_BIN").or(raw.certbot_bin) {
            let bin = bin.trim().to_string();
            if bin.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "CERTBOT_BIN",
                    message: "must not be empty".to_string(),
                });
            }
            config.certbot_bin = bin;
        }

        let reload_command = match env("RELOAD_COMMAND") {
            Some(line) => Some(split_command_line(&line)),
            None => raw.reload_command.map(RawCommand::into_argv),
        };
        if let Some(argv) = reload_command {
            if argv.is_empty() || argv[0].trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "RELOAD_COMMAND",
                    message: "must name a program".to_string(),
                });
            }
            config.reload_command = argv;
        }

        let threshold = config.default_threshold_days;
        let domains = match env("DOMAINS") {
            Some(list) => parse_domain_list(&list, threshold),
            None => match raw.domains {
                Some(RawDomains::List(list)) => parse_domain_list(&list, threshold),
                Some(RawDomains::Tables(tables)) => tables
                    .into_iter()
                    .map(|d| DomainConfig::new(d.name.trim(), d.threshold_days.unwrap_or(threshold)))
                    .collect(),
                None => Vec::new(),
            },
        };
        config.domains = validate_domains(domains)?;

        Ok(config)
    }

    /// The configured domains, or an error when none are configured.
    pub fn require_domains(&self) -> Result<&[DomainConfig]> {
        if self.domains.is_empty() {
            return Err(ConfigError::MissingDomains);
        }
        Ok(&self.domains)
    }

    /// Threshold for `domain`: its own when configured, else the default.
    pub fn threshold_for(&self, domain: &str) -> u32 {
        self.domains
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(domain))
            .map(|d| d.threshold_days)
            .unwrap_or(self.default_threshold_days)
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key,
            message: format!("'{}' is not a boolean", other),
        }),
    }
}

fn parse_domain_list(list: &str, threshold: u32) -> Vec<DomainConfig> {
    list.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| DomainConfig::new(d, threshold))
        .collect()
}

fn split_command_line(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

fn validate_domains(domains: Vec<DomainConfig>) -> Result<Vec<DomainConfig>> {
    let mut seen = HashSet::new();
    for domain in &domains {
        validate_domain_name(&domain.name).map_err(ConfigError::InvalidDomain)?;
        if !seen.insert(domain.name.to_ascii_lowercase()) {
            return Err(ConfigError::DuplicateDomain(domain.name.clone()));
        }
    }
    Ok(domains)
}
