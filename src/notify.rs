// Notifications emitted after state-changing mutations

use std::fmt;
use std::time::{Duration, Instant};
use tracing::info;

/// How long a notification stays visible
pub const NOTIFICATION_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    TaskAdded,
    TaskCompleted,
    TaskMarkedActive,
    TaskDeleted,
    TaskUpdated,
}

impl Notification {
    pub fn message(self) -> &'static str {
        match self {
            Notification::TaskAdded => "Task added!",
            Notification::TaskCompleted => "Task completed!",
            Notification::TaskMarkedActive => "Task marked as active!",
            Notification::TaskDeleted => "Task deleted!",
            Notification::TaskUpdated => "Task updated!",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Receiver of notifications from the task store
pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

/// Collects notifications in order
impl Notifier for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

impl<N: Notifier + ?Sized> Notifier for &mut N {
    fn notify(&mut self, notification: Notification) {
        (**self).notify(notification);
    }
}

/// Logs notifications through tracing and otherwise discards them
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&mut self, notification: Notification) {
        info!(text = notification.message(), "Notification");
    }
}

/// Single visible notification slot
///
/// Showing a new notification replaces the current one and restarts its timer.
#[derive(Debug, Clone)]
pub struct ToastSlot {
    duration: Duration,
    current: Option<(Notification, Instant)>,
}

impl Default for ToastSlot {
    fn default() -> Self {
        Self::new(NOTIFICATION_DURATION)
    }
}

impl ToastSlot {
    pub fn new(duration: Duration) -> Self {
        Self { duration, current: None }
    }

    pub fn show(&mut self, notification: Notification, now: Instant) {
        self.current = Some((notification, now));
    }

    /// The notification visible at `now`, if it has not expired
    pub fn visible(&self, now: Instant) -> Option<Notification> {
        match self.current {
            Some((notification, shown_at)) if now.saturating_duration_since(shown_at) < self.duration => {
                Some(notification)
            }
            _ => None,
        }
    }

    /// Drop the notification once it has expired
    pub fn tick(&mut self, now: Instant) {
        if self.visible(now).is_none() {
            self.current = None;
        }
    }
}

impl Notifier for ToastSlot {
    fn notify(&mut self, notification: Notification) {
        self.show(notification, Instant::now());
    }
}
