//! Remembers which slots were already notified, per doctor.

use anyhow::Context;
use slot_types::{NotificationStatus, Slot};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Persistence for the notification status.
///
/// `load` never fails: an unreadable store is reported as empty so that
/// slots get notified again rather than silently dropped.
pub trait StatusStore {
    fn load(&self) -> NotificationStatus;
    fn save(&self, status: &NotificationStatus) -> anyhow::Result<()>;
}

/// Status kept in a single JSON file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "status.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StatusStore for JsonFileStore {
    fn load(&self) -> NotificationStatus {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return NotificationStatus::new(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", self.path.display(), e);
                return NotificationStatus::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(
                    "Ignoring corrupt status file {}: {}",
                    self.path.display(),
                    e
                );
                NotificationStatus::new()
            }
        }
    }

    fn save(&self, status: &NotificationStatus) -> anyhow::Result<()> {
        let json = serde_json::to_vec(status)?;
        let tmp = self.temp_path();

        {
            let mut file = fs::File::create(&tmp)
                .with_context(|| format!("Failed to create {}", tmp.display()))?;
            file.write_all(&json)?;
            file.sync_all()?;
        }

        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }
}

/// Decides whether slots are new and records them once notified.
pub struct NoveltyTracker<S> {
    store: S,
}

impl<S: StatusStore> NoveltyTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// True iff every slot was already notified for `doctor`.
    pub fn has_already_notified(&self, slots: &[Slot], doctor: &str) -> bool {
        let keys: Vec<String> = slots.iter().map(Slot::key).collect();
        self.store
            .load()
            .contains_all(doctor, keys.iter().map(String::as_str))
    }

    /// Slots not yet notified for `doctor`, input order kept.
    pub fn fresh_slots(&self, slots: &[Slot], doctor: &str) -> Vec<Slot> {
        let status = self.store.load();
        match status.notified(doctor) {
            Some(known) => slots
                .iter()
                .filter(|s| !known.contains(&s.key()))
                .copied()
                .collect(),
            None => slots.to_vec(),
        }
    }

    /// Union `slots` into the doctor's record. Only writes when something changed.
    pub fn update_status(&self, doctor: &str, slots: &[Slot]) -> anyhow::Result<()> {
        let mut status = self.store.load();
        if status.merge(doctor, slots.iter().map(Slot::key)) {
            self.store.save(&status)?;
        }
        Ok(())
    }
}
