#![forbid(unsafe_code)]

//! Stack of transient, dismissible notifications.
//!
//! A notification is shown, stays for the configured display duration and
//! then fades out. The fade is a two-phase removal: the exit transition
//! starts first and the entry is detached only after the fade duration. A
//! manual dismiss starts the same exit early and cancels the pending
//! auto-dismiss, so every entry is removed exactly once.
//!
//! All timing goes through the [`SharedClock`] handed to
//! [`NotificationCenter::new`]; nothing happens between calls to
//! [`NotificationCenter::tick`]. Hosts call `tick` whenever the clock reaches
//! [`NotificationCenter::next_deadline`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use pagekit_core::{ManualClock, NotificationConfig};
//! use pagekit_widgets::{NotificationCenter, Severity};
//!
//! let clock = ManualClock::new();
//! let mut center = NotificationCenter::new(clock.shared(), NotificationConfig::default());
//! center.show("Saved <draft>", Severity::Success);
//! assert_eq!(center.entries()[0].message(), "Saved &lt;draft&gt;");
//!
//! clock.advance(Duration::from_millis(5300));
//! center.tick();
//! assert!(center.is_empty());
//! ```
//!
//! # Invariants
//!
//! 1. Entries are listed in insertion order.
//! 2. An entry receives at most one `ExitStarted` and at most one `Removed`.
//! 3. `Removed` is never recorded earlier than `fade_duration` after the
//!    entry's `ExitStarted`.
//! 4. Dismissing or expiring one entry never changes another.
//!
//! # Failure Modes
//!
//! | Scenario | Behavior |
//! |----------|----------|
//! | Dismiss of an exiting entry | No-op, returns `false` |
//! | Dismiss of an unknown id | No-op, returns `false` |
//! | Host ticks late | Overdue timers act at their own deadlines, in order |
//! | Zero fade duration | Exit and removal happen in the same tick |

use std::fmt;
use std::time::Duration;

use pagekit_core::{
    EventKind, Listen, NotificationConfig, NotificationId, SharedClock, Target, TimerQueue,
    sanitize,
};

use crate::text::{display_width, pad_to, wrap};

/// Visual category of a notification. Affects styling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Error,
}

impl Severity {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Alert class used by the host stylesheet.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Info => "alert-info",
            Self::Success => "alert-success",
            Self::Error => "alert-danger",
        }
    }

    /// Icon used by the text renderer.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Info => "i",
            Self::Success => "✓",
            Self::Error => "!",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase of a displayed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPhase {
    /// Fully shown.
    Visible,
    /// Exit transition running; detached once the fade elapses.
    Exiting,
}

/// Why an entry started to exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCause {
    /// The close affordance was used.
    Dismissed,
    /// The display duration elapsed.
    Expired,
}

/// Lifecycle record kept for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    Shown {
        id: NotificationId,
        severity: Severity,
        at: Duration,
    },
    ExitStarted {
        id: NotificationId,
        cause: ExitCause,
        at: Duration,
    },
    Removed {
        id: NotificationId,
        at: Duration,
    },
}

impl NotificationEvent {
    /// Id of the entry the event belongs to.
    #[must_use]
    pub fn id(&self) -> NotificationId {
        match self {
            Self::Shown { id, .. } | Self::ExitStarted { id, .. } | Self::Removed { id, .. } => *id,
        }
    }
}

/// A displayed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    id: NotificationId,
    message: String,
    severity: Severity,
    shown_at: Duration,
    phase: NotificationPhase,
}

impl Notification {
    #[must_use]
    pub fn id(&self) -> NotificationId {
        self.id
    }

    /// Sanitized message text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn shown_at(&self) -> Duration {
        self.shown_at
    }

    #[must_use]
    pub fn phase(&self) -> NotificationPhase {
        self.phase
    }

    /// Class list of the entry's container element.
    #[must_use]
    pub fn class_list(&self) -> String {
        let state = match self.phase {
            NotificationPhase::Visible => "fade show",
            NotificationPhase::Exiting => "fade",
        };
        format!("alert {} alert-dismissible {state}", self.severity.css_class())
    }

    /// Markup for the entry. The message is already escaped.
    #[must_use]
    pub fn to_html(&self) -> String {
        format!(
            "<div class=\"{}\" role=\"alert\" data-notification=\"{}\">{}\
             <button type=\"button\" class=\"btn-close\" aria-label=\"Close\"></button></div>",
            self.class_list(),
            self.id.raw(),
            self.message
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TimerKind {
    AutoDismiss,
    Detach,
}

/// Owner of the notification stack.
pub struct NotificationCenter {
    clock: SharedClock,
    config: NotificationConfig,
    entries: Vec<Notification>,
    timers: TimerQueue<(NotificationId, TimerKind)>,
    history: Vec<NotificationEvent>,
}

impl fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("config", &self.config)
            .field("entries", &self.entries)
            .field("pending_timers", &self.timers.len())
            .finish_non_exhaustive()
    }
}

impl NotificationCenter {
    /// Create an empty stack reading time from `clock`.
    pub fn new(clock: SharedClock, config: NotificationConfig) -> Self {
        Self {
            clock,
            config,
            entries: Vec::new(),
            timers: TimerQueue::new(),
            history: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }

    /// Show an [`Severity::Info`] notification.
    pub fn show_info(&mut self, message: &str) -> NotificationId {
        self.show(message, Severity::default())
    }

    /// Append a notification and schedule its auto-dismiss.
    ///
    /// The message is sanitized before it is stored. Identical messages are
    /// not merged.
    pub fn show(&mut self, message: &str, severity: Severity) -> NotificationId {
        let now = self.clock.now_mono();
        let id = NotificationId::next();
        self.entries.push(Notification {
            id,
            message: sanitize(message),
            severity,
            shown_at: now,
            phase: NotificationPhase::Visible,
        });
        self.timers.schedule(
            (id, TimerKind::AutoDismiss),
            now.saturating_add(self.config.display_duration),
        );
        self.history.push(NotificationEvent::Shown {
            id,
            severity,
            at: now,
        });
        tracing::info!(notification = %id, %severity, "notification shown");
        id
    }

    /// Start the exit of a visible entry and cancel its auto-dismiss.
    ///
    /// Returns `false` if the entry is unknown or already exiting.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        let visible = self
            .entry(id)
            .is_some_and(|n| n.phase == NotificationPhase::Visible);
        if !visible {
            tracing::debug!(notification = %id, "dismiss ignored");
            return false;
        }
        self.timers.cancel(&(id, TimerKind::AutoDismiss));
        self.start_exit(id, ExitCause::Dismissed, self.clock.now_mono());
        true
    }

    /// Process every timer due at the current clock reading.
    ///
    /// Returns the ids removed during this call.
    pub fn tick(&mut self) -> Vec<NotificationId> {
        let now = self.clock.now_mono();
        let mut removed = Vec::new();
        loop {
            let due = self.timers.pop_due_timed(now);
            if due.is_empty() {
                break;
            }
            // Each timer acts at its own deadline, so a late tick still
            // starts the fade when the display duration ran out.
            for (at, (id, kind)) in due {
                match kind {
                    TimerKind::AutoDismiss => self.start_exit(id, ExitCause::Expired, at),
                    TimerKind::Detach => {
                        if self.detach(id, at) {
                            removed.push(id);
                        }
                    }
                }
            }
        }
        removed
    }

    /// Earliest pending auto-dismiss or detach.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// One close-button listener per displayed entry.
    #[must_use]
    pub fn listeners(&self) -> Vec<Listen> {
        self.entries
            .iter()
            .map(|n| Listen::new(Target::DismissButton(n.id), EventKind::Click))
            .collect()
    }

    /// Displayed entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[Notification] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, id: NotificationId) -> Option<&Notification> {
        self.entries.iter().find(|n| n.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lifecycle records in the order they happened.
    #[must_use]
    pub fn history(&self) -> &[NotificationEvent] {
        &self.history
    }

    /// Render the stack as text, `width` columns wide.
    ///
    /// Each entry starts with its icon and ends its first line with a close
    /// marker; exiting entries are marked as fading.
    #[must_use]
    pub fn render_lines(&self, width: usize) -> Vec<String> {
        const PREFIX: usize = 2;
        const CLOSE: &str = " ×";
        let body_width = width.saturating_sub(PREFIX + display_width(CLOSE)).max(1);

        let mut out = Vec::new();
        for entry in &self.entries {
            let icon = match entry.phase {
                NotificationPhase::Visible => entry.severity.icon(),
                NotificationPhase::Exiting => "·",
            };
            for (i, line) in wrap(&entry.message, body_width).iter().enumerate() {
                let lead = if i == 0 { icon } else { " " };
                let mut row = format!("{lead} {}", pad_to(line, body_width));
                if i == 0 {
                    row.push_str(CLOSE);
                }
                out.push(row.trim_end().to_string());
            }
        }
        out
    }

    /// Markup for the whole stack container.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::from("<div class=\"position-fixed top-0 end-0 p-3\">");
        for entry in &self.entries {
            html.push_str(&entry.to_html());
        }
        html.push_str("</div>");
        html
    }

    // -----------------------------------------------------------------------

    fn start_exit(&mut self, id: NotificationId, cause: ExitCause, now: Duration) {
        let Some(entry) = self.entries.iter_mut().find(|n| n.id == id) else {
            return;
        };
        if entry.phase == NotificationPhase::Exiting {
            return;
        }
        entry.phase = NotificationPhase::Exiting;
        self.timers.schedule(
            (id, TimerKind::Detach),
            now.saturating_add(self.config.fade_duration),
        );
        self.history
            .push(NotificationEvent::ExitStarted { id, cause, at: now });
        tracing::debug!(notification = %id, ?cause, "notification exit started");
    }

    fn detach(&mut self, id: NotificationId, now: Duration) -> bool {
        let Some(index) = self.entries.iter().position(|n| n.id == id) else {
            return false;
        };
        self.entries.remove(index);
        self.history.push(NotificationEvent::Removed { id, at: now });
        tracing::info!(notification = %id, "notification removed");
        true
    }
}
