#![forbid(unsafe_code)]

//! Submission state with token-based staleness checks.
//!
//! A form has at most one submission in flight. Starting one issues a new
//! [`SubmissionToken`]; the send result carries the token back, and only the
//! result whose token matches the in-flight submission settles it. Settling
//! takes the in-flight record, so the restore step it feeds runs exactly once.
//!
//! # Invariants
//!
//! 1. Tokens are strictly monotonic and token 0 is never issued.
//! 2. At most one submission is in flight.
//! 3. Every `Started` is followed by at most one `Settled` for its token.
//! 4. `StaleDiscarded` never names the in-flight token.

use std::fmt;

/// Identity of one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SubmissionToken(u64);

impl SubmissionToken {
    /// The null token representing no submission.
    pub const NONE: Self = Self(0);

    /// Create a token from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SubmissionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "submission-{}", self.0)
    }
}

/// An event in the submission lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    Started { token: SubmissionToken },
    /// A submit arrived while `in_flight` was pending and was dropped.
    DuplicateIgnored { in_flight: SubmissionToken },
    Settled { token: SubmissionToken, ok: bool },
    /// A result arrived for a token that is not in flight.
    StaleDiscarded {
        token: SubmissionToken,
        in_flight: SubmissionToken,
    },
}

/// The submission currently being sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlight {
    pub token: SubmissionToken,
    /// Submit control label to restore once the send settles.
    pub original_label: Option<String>,
}

/// Per-form submission state.
#[derive(Debug, Clone)]
pub struct SubmissionTracker {
    next_token: u64,
    in_flight: Option<InFlight>,
    trace: Vec<SubmissionEvent>,
}

impl Default for SubmissionTracker {
    fn default() -> Self {
        Self {
            next_token: 1,
            in_flight: None,
            trace: Vec::new(),
        }
    }
}

impl SubmissionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Token of the in-flight submission, if any.
    #[must_use]
    pub fn current(&self) -> Option<SubmissionToken> {
        self.in_flight.as_ref().map(|f| f.token)
    }

    /// Record a dropped duplicate request if a submission is in flight.
    ///
    /// Returns the in-flight token, or `None` when the tracker is idle and
    /// nothing was recorded.
    pub fn record_duplicate(&mut self) -> Option<SubmissionToken> {
        let in_flight = self.current()?;
        self.trace.push(SubmissionEvent::DuplicateIgnored { in_flight });
        Some(in_flight)
    }

    /// Start a submission, or return `None` if one is already in flight.
    pub fn start(&mut self, original_label: Option<String>) -> Option<SubmissionToken> {
        if self.record_duplicate().is_some() {
            return None;
        }
        let token = SubmissionToken(self.next_token);
        self.next_token += 1;
        self.in_flight = Some(InFlight {
            token,
            original_label,
        });
        self.trace.push(SubmissionEvent::Started { token });
        Some(token)
    }

    /// Settle the submission identified by `token`.
    ///
    /// Returns the in-flight record if `token` matches, `None` if the result
    /// is stale.
    pub fn settle(&mut self, token: SubmissionToken, ok: bool) -> Option<InFlight> {
        match &self.in_flight {
            Some(in_flight) if in_flight.token == token => {
                self.trace.push(SubmissionEvent::Settled { token, ok });
                self.in_flight.take()
            }
            other => {
                let in_flight = other.as_ref().map_or(SubmissionToken::NONE, |f| f.token);
                self.trace
                    .push(SubmissionEvent::StaleDiscarded { token, in_flight });
                None
            }
        }
    }

    /// Lifecycle events so far.
    #[must_use]
    pub fn trace(&self) -> &[SubmissionEvent] {
        &self.trace
    }

    /// Check the trace against the invariants.
    pub fn verify_trace(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();
        let mut last_started = SubmissionToken::NONE;
        let mut open: Option<SubmissionToken> = None;

        for event in &self.trace {
            match event {
                SubmissionEvent::Started { token } => {
                    if *token <= last_started {
                        violations.push(format!(
                            "non-monotonic token: {token} after {last_started}"
                        ));
                    }
                    if let Some(prev) = open {
                        violations.push(format!("{token} started while {prev} in flight"));
                    }
                    last_started = *token;
                    open = Some(*token);
                }
                SubmissionEvent::Settled { token, .. } => {
                    if open != Some(*token) {
                        violations.push(format!("{token} settled while not in flight"));
                    }
                    open = None;
                }
                SubmissionEvent::StaleDiscarded { token, .. } => {
                    if open == Some(*token) {
                        violations.push(format!("in-flight {token} discarded as stale"));
                    }
                }
                SubmissionEvent::DuplicateIgnored { in_flight } => {
                    if open != Some(*in_flight) {
                        violations.push(format!("duplicate ignored for idle {in_flight}"));
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
