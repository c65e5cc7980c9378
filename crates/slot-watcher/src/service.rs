//! The polling loop: fetch schedules, pick new near-term slots, send emails.

use anyhow::Result;
use chrono::{Local, NaiveDateTime};

use crate::client::ScheduleClient;
use crate::config::{Config, DoctorConfig};
use crate::error::CycleError;
use crate::notifier::{Mailer, Notifier, SmtpMailer};
use crate::status::{JsonFileStore, NoveltyTracker, StatusStore};
use crate::window::find_slots;

/// What happened during one poll cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Doctors whose schedule was fetched successfully
    pub checked: Vec<String>,
    /// Doctors whose schedule could not be fetched
    pub failed: Vec<String>,
    /// Doctors an email was sent for
    pub notified: Vec<String>,
}

enum DoctorResult {
    Quiet,
    Notified,
    Failed,
}

pub struct PollService<M, S> {
    config: Config,
    client: ScheduleClient,
    notifier: Notifier<M, S>,
}

impl PollService<SmtpMailer, JsonFileStore> {
    /// Wire up the production client, SMTP mailer and status file.
    pub fn from_config(config: Config) -> Result<Self> {
        let client = ScheduleClient::new(&config)?;
        let mailer = SmtpMailer::new(&config.mail)?;
        let tracker = NoveltyTracker::new(JsonFileStore::new(&config.status_path));
        Ok(Self::new(config, client, Notifier::new(mailer, tracker)))
    }
}

impl<M: Mailer, S: StatusStore> PollService<M, S> {
    pub fn new(config: Config, client: ScheduleClient, notifier: Notifier<M, S>) -> Self {
        Self {
            config,
            client,
            notifier,
        }
    }

    pub fn notifier(&self) -> &Notifier<M, S> {
        &self.notifier
    }

    /// Poll forever. Returns only when a notification could not be delivered.
    pub async fn run(&self) -> Result<()> {
        tracing::info!(
            "Watching {} doctor(s) (interval: {:?}, window: {} days)",
            self.config.doctors.len(),
            self.config.poll_interval(),
            self.config.catch_within_days
        );

        loop {
            let now = Local::now().naive_local();

            match self.run_cycle(now).await {
                Ok(report) => {
                    tracing::debug!(
                        "Cycle done: {} checked, {} failed, {} notified",
                        report.checked.len(),
                        report.failed.len(),
                        report.notified.len()
                    );
                    tokio::time::sleep(self.config.poll_interval()).await;
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!("{}; retrying in {:?}", e, self.config.lookup_retry());
                    tokio::time::sleep(self.config.lookup_retry()).await;
                }
                Err(e) => {
                    let error = anyhow::Error::new(e);
                    tracing::error!("Stopping: {:#}", error);
                    self.notifier.report_failure(&error).await;
                    return Err(error);
                }
            }
        }
    }

    /// One pass over all configured doctors, in configuration order.
    ///
    /// A doctor whose schedule cannot be fetched is skipped; the others are
    /// still processed.
    pub async fn run_cycle(&self, now: NaiveDateTime) -> Result<CycleReport, CycleError> {
        let appointment_id = if self.config.resolve_appointment {
            self.client
                .resolve_appointment_id()
                .await
                .map_err(CycleError::Lookup)?
        } else {
            None
        };

        let mut report = CycleReport::default();

        for doctor in &self.config.doctors {
            match self.check_doctor(doctor, appointment_id, now).await? {
                DoctorResult::Quiet => report.checked.push(doctor.name.clone()),
                DoctorResult::Notified => {
                    report.checked.push(doctor.name.clone());
                    report.notified.push(doctor.name.clone());
                }
                DoctorResult::Failed => report.failed.push(doctor.name.clone()),
            }
        }

        Ok(report)
    }

    async fn check_doctor(
        &self,
        doctor: &DoctorConfig,
        appointment_id: Option<i64>,
        now: NaiveDateTime,
    ) -> Result<DoctorResult, CycleError> {
        let days = match self.client.fetch_schedule(doctor, appointment_id).await {
            Ok(outcome) => outcome.into_days(),
            Err(e) => {
                let kind = if e.is_transient() { "transient" } else { "fatal" };
                tracing::error!("Failed to fetch schedule for {} ({}): {}", doctor.name, kind, e);
                return Ok(DoctorResult::Failed);
            }
        };

        let slots = find_slots(&days, self.config.catch_within_days, now);
        let tracker = self.notifier.tracker();
        if slots.is_empty() || tracker.has_already_notified(&slots, &doctor.name) {
            return Ok(DoctorResult::Quiet);
        }

        let fresh = tracker.fresh_slots(&slots, &doctor.name);
        tracing::warn!(
            "Caught {} slot(s) for {}, new: {}",
            slots.len(),
            doctor.name,
            fresh
                .iter()
                .map(|s| s.key())
                .collect::<Vec<_>>()
                .join(", ")
        );

        self.notifier
            .notify(&doctor.name, &slots)
            .await
            .map_err(|source| CycleError::Dispatch {
                doctor: doctor.name.clone(),
                source,
            })?;

        Ok(DoctorResult::Notified)
    }
}
