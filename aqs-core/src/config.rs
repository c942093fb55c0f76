use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

/// Environment variable overriding the configured account email.
pub const EMAIL_ENV: &str = "AQS_EMAIL";
/// Environment variable overriding the configured API key.
pub const KEY_ENV: &str = "AQS_KEY";

/// AQS account credentials: a registered email plus the key issued for it.
///
/// Credentials are supplied by the operator, via the config file or the
/// `AQS_EMAIL` / `AQS_KEY` environment variables; they are never compiled in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub key: String,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Example TOML:
    /// [credentials]
    /// email = "you@example.org"
    /// key = "..."
    pub credentials: Option<Credentials>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "aqs-task", "aqs-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace the stored credentials.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    /// Resolve the credentials to use for API calls.
    ///
    /// `AQS_EMAIL` / `AQS_KEY` take precedence over the config file, field by
    /// field, so either source can be partial as long as the combination is
    /// complete.
    pub fn credentials(&self) -> Result<Credentials> {
        resolve_credentials(
            self.credentials.as_ref(),
            env::var(EMAIL_ENV).ok(),
            env::var(KEY_ENV).ok(),
        )
    }
}

fn resolve_credentials(
    stored: Option<&Credentials>,
    email_env: Option<String>,
    key_env: Option<String>,
) -> Result<Credentials> {
    let email = email_env
        .filter(|v| !v.is_empty())
        .or_else(|| stored.map(|c| c.email.clone()))
        .unwrap_or_default();
    let key = key_env
        .filter(|v| !v.is_empty())
        .or_else(|| stored.map(|c| c.key.clone()))
        .unwrap_or_default();

    if email.is_empty() || key.is_empty() {
        return Err(anyhow!(
            "No AQS credentials configured.\n\
             Hint: run `aqs configure`, or set the {EMAIL_ENV} and {KEY_ENV} environment variables."
        ));
    }

    Ok(Credentials { email, key })
}
