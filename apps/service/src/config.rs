use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config file: {0}")]
    ReadFailed(#[source] std::io::Error),
    #[error("failed to write config file: {0}")]
    WriteFailed(#[source] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseFailed(String),
    #[error("no config directory available (set XDG_CONFIG_HOME or HOME)")]
    ConfigPathUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub telegram: Telegram,
    pub monitor: Monitor,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub targets: Vec<TargetEntry>,
}

/// Credentials and endpoint of the Telegram bot used for notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telegram {
    pub bot_token: String,
    pub chat_id: String,
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monitor {
    pub interval_seconds: u64,
    pub max_workers: usize,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Regex whose first capture group is the stock count
    pub stock_pattern: String,
    /// Regex whose first capture group is the price
    pub price_pattern: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_accept")]
    pub accept: String,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logging {
    /// Append-only log file; stdout only when unset
    pub file: Option<path::PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetEntry {
    pub url: String,
    pub name: String,
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".into()
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36"
        .into()
}

fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8".into()
}

fn default_accept_language() -> String {
    "zh-CN,zh;q=0.9".into()
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/stockwatch/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("stockwatch/config.toml"))
}

impl Default for Logging {
    fn default() -> Self {
        Self { file: Some("stockwatch.log".into()) }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: Telegram {
                bot_token: "TELEGRAM_BOT_TOKEN".into(),
                chat_id: "TELEGRAM_CHAT_ID".into(),
                api_base: default_telegram_api(),
                timeout_seconds: default_timeout(),
            },
            monitor: Monitor {
                interval_seconds: 180,
                max_workers: 6,
                timeout_seconds: default_timeout(),
                stock_pattern: r"库存\((\d+)\)".into(),
                price_pattern: r"¥\s*(\d+\.\d+)".into(),
                currency: "¥".into(),
                user_agent: default_user_agent(),
                accept: default_accept(),
                accept_language: default_accept_language(),
            },
            logging: Logging::default(),
            targets: vec![
                TargetEntry {
                    url: "https://cloud.upx8.com/buy/1".into(),
                    name: "Cloud server (Hong Kong)".into(),
                },
                TargetEntry {
                    url: "https://cloud.upx8.com/buy/2".into(),
                    name: "Cloud server (US)".into(),
                },
            ],
        }
    }
}

/// Keeps the last four characters of a secret so it can be recognised in logs
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".into();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);
        let write_2 = write_indented(2);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Telegram")?;
        write_1(f, "Bot Token", &mask(&self.telegram.bot_token))?;
        write_1(f, "Chat ID", &self.telegram.chat_id)?;
        write_1(f, "API Base", &self.telegram.api_base)?;
        write_1(f, "Timeout (s)", &self.telegram.timeout_seconds)?;
        write_title_1(f, "Monitor")?;
        write_1(f, "Interval (s)", &self.monitor.interval_seconds)?;
        write_1(f, "Max Workers", &self.monitor.max_workers)?;
        write_1(f, "Timeout (s)", &self.monitor.timeout_seconds)?;
        write_1(f, "Stock Pattern", &self.monitor.stock_pattern)?;
        write_1(f, "Price Pattern", &self.monitor.price_pattern)?;
        write_1(f, "Currency", &self.monitor.currency)?;
        write_title_1(f, "Logging")?;
        match &self.logging.file {
            Some(file) => write_1(f, "File", &file.display())?,
            None => write_1(f, "File", &"(stdout only)")?,
        }
        write_title_1(f, "Targets")?;
        for target in &self.targets {
            write_1(f, "Name", &target.name)?;
            write_2(f, "URL", &target.url)?;
        }

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/stockwatch/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    ///
    /// ```rust,ignore
    /// let cfg = config::Config::from_config(None::<&path::Path>)?;
    /// println!("{}", cfg);
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path).map_err(Error::ReadFailed)?;
            Self::from_toml(&raw_string)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    pub fn from_toml(raw: &str) -> Result<Self, Error> {
        toml::from_str(raw).map_err(|err| Error::ParseFailed(err.to_string()))
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &std::path::Path) -> Result<(), Error> {
        let config_str: String =
            toml::to_string_pretty(self).map_err(|err| Error::ParseFailed(err.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(Error::WriteFailed)?;
        }

        std::fs::write(path, config_str).map_err(Error::WriteFailed)
    }
}
