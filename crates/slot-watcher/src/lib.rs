//! Watches a clinic booking API for open appointment slots and emails the
//! first sighting of each one.

pub mod client;
pub mod config;
pub mod error;
pub mod notifier;
pub mod service;
pub mod status;
pub mod window;

pub use client::{FetchOutcome, ScheduleClient};
pub use config::{Config, DoctorConfig, MailConfig};
pub use error::{CycleError, FetchError};
pub use notifier::{Mailer, Notifier, SmtpMailer};
pub use service::{CycleReport, PollService};
pub use status::{JsonFileStore, NoveltyTracker, StatusStore};
