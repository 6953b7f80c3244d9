#![forbid(unsafe_code)]

//! Page configuration.
//!
//! Every setting has a default matching the reference contact page. Hosts
//! adjust settings with the builder methods or through `PAGEKIT_*`
//! environment variables via [`PageConfig::from_env`].
//!
//! | Variable | Setting | Default |
//! |----------|---------|---------|
//! | `PAGEKIT_NOTIFY_DURATION_MS` | notification display duration | 5000 |
//! | `PAGEKIT_FADE_MS` | notification fade-out duration | 300 |
//! | `PAGEKIT_NAVIGATE_DELAY_MS` | delay before the confirmation redirect | 1000 |
//! | `PAGEKIT_CONFIRMATION_URL` | confirmation destination | `thank_you.html` |
//! | `PAGEKIT_DEBOUNCE_MS` | debounce quiet period | 250 |
//! | `PAGEKIT_THROTTLE_MS` | throttle window | 100 |

use std::env;
use std::fmt;
use std::time::Duration;

/// Invalid configuration override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    InvalidValue { variable: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { variable, value } => {
                write!(f, "invalid value for {variable}: {value:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Timing of the notification stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationConfig {
    /// How long a notification stays before it starts to fade out.
    pub display_duration: Duration,
    /// Length of the exit transition before the entry is detached.
    pub fade_duration: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            display_duration: Duration::from_millis(5000),
            fade_duration: Duration::from_millis(300),
        }
    }
}

impl NotificationConfig {
    /// Set the display duration.
    #[must_use]
    pub fn display_duration(mut self, duration: Duration) -> Self {
        self.display_duration = duration;
        self
    }

    /// Set the fade duration.
    #[must_use]
    pub fn fade_duration(mut self, duration: Duration) -> Self {
        self.fade_duration = duration;
        self
    }
}

/// Fixed user-facing texts of the contact form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormMessages {
    pub required: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub acceptance: String,
    pub invalid_summary: String,
    pub sent: String,
    pub send_failed: String,
}

impl Default for FormMessages {
    fn default() -> Self {
        Self {
            required: "This field is required".into(),
            first_name: "Please enter a valid first name (2-50 characters)".into(),
            last_name: "Please enter a valid last name (2-50 characters)".into(),
            email: "Please enter a valid email address".into(),
            phone: "Please enter a valid phone number (10-20 characters)".into(),
            message: "The message must be at least 10 characters long".into(),
            acceptance: "You must accept the privacy policy".into(),
            invalid_summary: "Please correct the marked errors".into(),
            sent: "Thank you! Your message was sent successfully.".into(),
            send_failed: "Something went wrong. Please try again later.".into(),
        }
    }
}

/// Behavior of a form's submission sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Where to go after a successful send.
    pub confirmation_target: String,
    /// Delay between the success notification and the redirect.
    pub navigate_delay: Duration,
    /// Label shown on the submit control while a send is in flight.
    pub busy_label: String,
    /// Fixed texts.
    pub messages: FormMessages,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confirmation_target: "thank_you.html".into(),
            navigate_delay: Duration::from_millis(1000),
            busy_label: "Sending...".into(),
            messages: FormMessages::default(),
        }
    }
}

impl PipelineConfig {
    /// Set the confirmation destination.
    #[must_use]
    pub fn confirmation_target(mut self, target: impl Into<String>) -> Self {
        self.confirmation_target = target.into();
        self
    }

    /// Set the redirect delay.
    #[must_use]
    pub fn navigate_delay(mut self, delay: Duration) -> Self {
        self.navigate_delay = delay;
        self
    }

    /// Set the busy label.
    #[must_use]
    pub fn busy_label(mut self, label: impl Into<String>) -> Self {
        self.busy_label = label.into();
        self
    }

    /// Replace the fixed texts.
    #[must_use]
    pub fn messages(mut self, messages: FormMessages) -> Self {
        self.messages = messages;
        self
    }
}

/// Defaults for debounced and throttled page collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub debounce: Duration,
    pub throttle: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(250),
            throttle: Duration::from_millis(100),
        }
    }
}

/// Complete page configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageConfig {
    pub notifications: NotificationConfig,
    pub pipeline: PipelineConfig,
    pub rate_limit: RateLimitConfig,
}

impl PageConfig {
    /// Defaults with `PAGEKIT_*` environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults with overrides read through `lookup`.
    ///
    /// Separated from [`from_env`](Self::from_env) so overrides can be tested
    /// without touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(ms) = millis(&lookup, "PAGEKIT_NOTIFY_DURATION_MS")? {
            config.notifications.display_duration = ms;
        }
        if let Some(ms) = millis(&lookup, "PAGEKIT_FADE_MS")? {
            config.notifications.fade_duration = ms;
        }
        if let Some(ms) = millis(&lookup, "PAGEKIT_NAVIGATE_DELAY_MS")? {
            config.pipeline.navigate_delay = ms;
        }
        if let Some(url) = lookup("PAGEKIT_CONFIRMATION_URL")
            && !url.trim().is_empty()
        {
            config.pipeline.confirmation_target = url;
        }
        if let Some(ms) = millis(&lookup, "PAGEKIT_DEBOUNCE_MS")? {
            config.rate_limit.debounce = ms;
        }
        if let Some(ms) = millis(&lookup, "PAGEKIT_THROTTLE_MS")? {
            config.rate_limit.throttle = ms;
        }

        Ok(config)
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    variable: &str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = lookup(variable) else {
        return Ok(None);
    };
    let parsed = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            variable: variable.to_string(),
            value: raw.clone(),
        })?;
    tracing::debug!(variable, millis = parsed, "config override applied");
    Ok(Some(Duration::from_millis(parsed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_reference_page() {
        let config = PageConfig::default();
        assert_eq!(config.notifications.display_duration, Duration::from_millis(5000));
        assert_eq!(config.notifications.fade_duration, Duration::from_millis(300));
        assert_eq!(config.pipeline.navigate_delay, Duration::from_millis(1000));
        assert_eq!(config.pipeline.confirmation_target, "thank_you.html");
        assert_eq!(config.rate_limit.debounce, Duration::from_millis(250));
        assert_eq!(config.rate_limit.throttle, Duration::from_millis(100));
    }

    #[test]
    fn overrides_are_applied() {
        let config = PageConfig::from_lookup(lookup_from(&[
            ("PAGEKIT_NOTIFY_DURATION_MS", "1200"),
            ("PAGEKIT_CONFIRMATION_URL", "/done"),
            ("PAGEKIT_THROTTLE_MS", " 40 "),
        ]))
        .expect("valid overrides");
        assert_eq!(config.notifications.display_duration, Duration::from_millis(1200));
        assert_eq!(config.pipeline.confirmation_target, "/done");
        assert_eq!(config.rate_limit.throttle, Duration::from_millis(40));
        assert_eq!(config.notifications.fade_duration, Duration::from_millis(300));
    }

    #[test]
    fn invalid_number_is_reported() {
        let err = PageConfig::from_lookup(lookup_from(&[("PAGEKIT_FADE_MS", "soon")]))
            .expect_err("non-numeric value");
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                variable: "PAGEKIT_FADE_MS".into(),
                value: "soon".into(),
            }
        );
        assert!(err.to_string().contains("PAGEKIT_FADE_MS"));
    }

    #[test]
    fn blank_confirmation_url_keeps_default() {
        let config = PageConfig::from_lookup(lookup_from(&[("PAGEKIT_CONFIRMATION_URL", "  ")]))
            .expect("blank url is ignored");
        assert_eq!(config.pipeline.confirmation_target, "thank_you.html");
    }
}
