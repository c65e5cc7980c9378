//! Email notifications about found slots and about the watcher stopping.

use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use slot_types::Slot;

use crate::config::MailConfig;
use crate::status::{NoveltyTracker, StatusStore};

/// Body used when the subject already says everything
const EMPTY_BODY: &str = "(no content)";

/// Outgoing mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// SMTP submission over implicit TLS with username/password auth
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .with_context(|| format!("Invalid sender address '{}'", config.from))?;
        let to: Mailbox = config
            .to
            .parse()
            .with_context(|| format!("Invalid recipient address '{}'", config.to))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_domain)
            .with_context(|| format!("Invalid SMTP host '{}'", config.smtp_domain))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        Ok(Self { transport, from, to })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, subject: &str, body: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("Failed to build email")?;

        self.transport
            .send(message)
            .await
            .context("SMTP delivery failed")?;

        tracing::info!("Email sent: {}", subject);
        Ok(())
    }
}

/// Subject and body of one email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Build the email for `slots` of `doctor`. `slots` must not be empty.
pub fn compose(doctor: &str, slots: &[Slot]) -> Notification {
    match slots {
        [slot] => Notification {
            subject: format!("Free slot: {} - {}", doctor, slot),
            body: EMPTY_BODY.to_string(),
        },
        _ => Notification {
            subject: format!("Free slots: {}", doctor),
            body: slots
                .iter()
                .map(Slot::key)
                .collect::<Vec<_>>()
                .join(", "),
        },
    }
}

/// Sends slot emails and records what was sent.
pub struct Notifier<M, S> {
    mailer: M,
    tracker: NoveltyTracker<S>,
}

impl<M: Mailer, S: StatusStore> Notifier<M, S> {
    pub fn new(mailer: M, tracker: NoveltyTracker<S>) -> Self {
        Self { mailer, tracker }
    }

    pub fn tracker(&self) -> &NoveltyTracker<S> {
        &self.tracker
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    /// Email `slots` and, once delivered, mark them as notified.
    ///
    /// Delivery errors are returned; a failure to persist the status is only
    /// logged, which means the same slots are reported again next cycle.
    pub async fn notify(&self, doctor: &str, slots: &[Slot]) -> anyhow::Result<()> {
        if slots.is_empty() {
            return Ok(());
        }

        let notification = compose(doctor, slots);
        self.mailer
            .send(&notification.subject, &notification.body)
            .await?;

        if let Err(e) = self.tracker.update_status(doctor, slots) {
            tracing::error!("Failed to record notified slots for {}: {:#}", doctor, e);
        }

        Ok(())
    }

    /// Tell the operator the watcher is stopping. Never fails.
    pub async fn report_failure(&self, error: &anyhow::Error) {
        let body = format!("{:?}", error);
        if let Err(e) = self.mailer.send("Slot watcher stopped", &body).await {
            tracing::error!("Failed to send failure report: {:#}", e);
        }
    }
}
