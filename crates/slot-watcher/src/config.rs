use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `mail.smtp_password`
pub const SMTP_PASSWORD_ENV: &str = "SMTP_PASSWORD";

const MAX_CATCH_WITHIN_DAYS: i64 = 3650;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON-RPC endpoint of the booking API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Patient's medical insurance number
    pub oms_number: String,

    /// Patient's birth date, as the API expects it (YYYY-MM-DD)
    pub birth_date: String,

    /// Notify about slots starting at most this many days from now
    pub catch_within_days: i64,

    /// Pause between poll cycles (seconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Pause before retrying a failed appointment lookup (seconds)
    #[serde(default = "default_lookup_retry")]
    pub lookup_retry_secs: u64,

    /// Timeout for a single API request (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Where already-notified slots are remembered
    #[serde(default = "default_status_path")]
    pub status_path: PathBuf,

    /// Look up the patient's existing appointment before fetching schedules
    #[serde(default = "default_resolve_appointment")]
    pub resolve_appointment: bool,

    /// Doctors to watch, processed in this order
    pub doctors: Vec<DoctorConfig>,

    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorConfig {
    /// Display name, also the key in the status file
    pub name: String,

    /// `availableResourceId` of the doctor in the booking API
    pub resource_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTP server hostname (implicit TLS)
    pub smtp_domain: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    pub smtp_user: String,

    #[serde(default)]
    pub smtp_password: String,

    /// Sender mailbox, e.g. `Slot Watcher <notify@example.com>`
    #[serde(default = "default_from")]
    pub from: String,

    /// Recipient mailbox
    pub to: String,
}

fn default_base_url() -> String {
    "https://emias.info/api/new/eip5orch".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_lookup_retry() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30
}

fn default_status_path() -> PathBuf {
    PathBuf::from("status.json")
}

fn default_resolve_appointment() -> bool {
    true
}

fn default_smtp_port() -> u16 {
    465
}

fn default_from() -> String {
    "Slot Watcher <notify@localhost>".to_string()
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;

        if let Ok(password) = std::env::var(SMTP_PASSWORD_ENV) {
            config.mail.smtp_password = password;
        }

        Ok(config)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.oms_number.trim().is_empty() {
            bail!("oms_number must not be empty");
        }
        if self.birth_date.trim().is_empty() {
            bail!("birth_date must not be empty");
        }
        if self.doctors.is_empty() {
            bail!("at least one [[doctors]] entry is required");
        }

        let mut seen = HashSet::new();
        for doctor in &self.doctors {
            if !seen.insert(doctor.name.as_str()) {
                bail!("doctor '{}' is listed more than once", doctor.name);
            }
        }

        if !(0..=MAX_CATCH_WITHIN_DAYS).contains(&self.catch_within_days) {
            bail!("catch_within_days must be between 0 and {}", MAX_CATCH_WITHIN_DAYS);
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn lookup_retry(&self) -> Duration {
        Duration::from_secs(self.lookup_retry_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn example() -> Self {
        Config {
            base_url: default_base_url(),
            oms_number: "1234567890123456".to_string(),
            birth_date: "1990-01-31".to_string(),
            doctors: vec![
                DoctorConfig {
                    name: "Therapist".to_string(),
                    resource_id: 12345678,
                },
                DoctorConfig {
                    name: "Ophthalmologist".to_string(),
                    resource_id: 87654321,
                },
            ],
            catch_within_days: 3,
            poll_interval_secs: default_poll_interval(),
            lookup_retry_secs: default_lookup_retry(),
            request_timeout_secs: default_request_timeout(),
            status_path: default_status_path(),
            resolve_appointment: true,
            mail: MailConfig {
                smtp_domain: "smtp.example.com".to_string(),
                smtp_port: default_smtp_port(),
                smtp_user: "notify@example.com".to_string(),
                smtp_password: "your-app-password".to_string(),
                from: "Slot Watcher <notify@example.com>".to_string(),
                to: "you@example.com".to_string(),
            },
        }
    }
}
