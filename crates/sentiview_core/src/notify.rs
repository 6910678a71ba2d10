use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};

use sentiview_logging::{sv_debug, sv_warn};

use crate::clock::{system_clock, Clock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    Timed(Duration),
    /// Stays until hidden explicitly.
    Indefinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "process-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
    pub lifetime: Lifetime,
    pub process: Option<ProcessId>,
    pub shown_at: Instant,
}

impl Notification {
    fn expired_at(&self, now: Instant) -> bool {
        match self.lifetime {
            Lifetime::Timed(duration) => now.saturating_duration_since(self.shown_at) >= duration,
            Lifetime::Indefinite => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
    pub max_notifications: usize,
    pub default_duration: Duration,
    pub success_duration: Duration,
    pub failure_duration: Duration,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            max_notifications: 3,
            default_duration: Duration::from_millis(4000),
            success_duration: Duration::from_millis(4000),
            failure_duration: Duration::from_millis(6000),
        }
    }
}

/// Bounded queue of transient messages, oldest first.
pub struct NotificationQueue {
    items: VecDeque<Notification>,
    /// Running processes and the "started" notification each one owns.
    processes: HashMap<ProcessId, NotificationId>,
    next_id: u64,
    settings: NotificationSettings,
    clock: Clock,
}

impl NotificationQueue {
    pub fn new(settings: NotificationSettings) -> Self {
        Self::with_clock(settings, system_clock())
    }

    pub fn with_clock(settings: NotificationSettings, clock: Clock) -> Self {
        Self {
            items: VecDeque::new(),
            processes: HashMap::new(),
            next_id: 0,
            settings,
            clock,
        }
    }

    /// Insert a message; `None` uses the default duration. Evicts the oldest
    /// entry once the bound is exceeded.
    pub fn show(
        &mut self,
        message: impl Into<String>,
        severity: Severity,
        lifetime: Option<Lifetime>,
    ) -> NotificationId {
        let lifetime = lifetime.unwrap_or(Lifetime::Timed(self.settings.default_duration));
        self.push(message.into(), severity, lifetime, None)
    }

    pub fn hide(&mut self, id: NotificationId) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        before != self.items.len()
    }

    pub fn show_processing_start(&mut self, name: &str) -> ProcessId {
        let process = ProcessId(self.bump());
        let id = self.push(
            format!("Started {name}..."),
            Severity::Info,
            Lifetime::Indefinite,
            Some(process),
        );
        self.processes.insert(process, id);
        sv_debug!("Process {} started: {}", process, name);
        process
    }

    /// Replace the "started" message of `process` with a timed outcome.
    /// Unknown or already finished processes are logged and ignored.
    pub fn show_processing_complete(
        &mut self,
        name: &str,
        process: ProcessId,
        success: bool,
    ) -> Option<NotificationId> {
        let Some(started) = self.processes.remove(&process) else {
            sv_warn!(
                "Ignoring completion of unknown process {} ({})",
                process,
                name
            );
            return None;
        };
        self.hide(started);

        let (message, severity, duration) = if success {
            (
                format!("{name} completed successfully!"),
                Severity::Success,
                self.settings.success_duration,
            )
        } else {
            (
                format!("{name} failed. Please check the logs."),
                Severity::Error,
                self.settings.failure_duration,
            )
        };
        Some(self.push(message, severity, Lifetime::Timed(duration), Some(process)))
    }

    pub fn is_running(&self, process: ProcessId) -> bool {
        self.processes.contains_key(&process)
    }

    /// Drop timed notifications whose duration has elapsed.
    pub fn prune_expired(&mut self) -> usize {
        let now = (self.clock)();
        let before = self.items.len();
        self.items.retain(|n| !n.expired_at(now));
        before - self.items.len()
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn push(
        &mut self,
        message: String,
        severity: Severity,
        lifetime: Lifetime,
        process: Option<ProcessId>,
    ) -> NotificationId {
        let id = NotificationId(self.bump());
        self.items.push_back(Notification {
            id,
            message,
            severity,
            lifetime,
            process,
            shown_at: (self.clock)(),
        });
        while self.items.len() > self.settings.max_notifications.max(1) {
            self.items.pop_front();
        }
        id
    }

    fn bump(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(NotificationSettings::default())
    }
}
