#![forbid(unsafe_code)]

//! Page events and listener keys.
//!
//! The host page translates its native events into [`PageEvent`] values.
//! Components never register global listeners; instead they declare the
//! set of [`Listen`] keys they are interested in, and the runtime drops any
//! event that no declared listener matches. A listener disappears as soon as
//! the component stops declaring it, which is how a dismissed notification
//! releases its close-button subscription.

use crate::id::{FieldId, FormId, NotificationId};

/// An input event delivered by the host page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// A field lost focus.
    Blur { form: FormId, field: FieldId },
    /// A field's value was edited.
    Input { form: FormId, field: FieldId },
    /// A form submit was requested.
    Submit { form: FormId },
    /// The close affordance of a notification was activated.
    Dismiss { notification: NotificationId },
    /// Time advanced; delivered unconditionally.
    Tick,
}

impl PageEvent {
    /// Listener key this event must match to be delivered.
    ///
    /// Returns `None` for [`PageEvent::Tick`], which needs no listener.
    #[must_use]
    pub fn listen_key(&self) -> Option<Listen> {
        match self {
            Self::Blur { form, field } => Some(Listen::new(
                Target::Field(form.clone(), field.clone()),
                EventKind::Blur,
            )),
            Self::Input { form, field } => Some(Listen::new(
                Target::Field(form.clone(), field.clone()),
                EventKind::Input,
            )),
            Self::Submit { form } => Some(Listen::new(Target::Form(form.clone()), EventKind::Submit)),
            Self::Dismiss { notification } => Some(Listen::new(
                Target::DismissButton(*notification),
                EventKind::Click,
            )),
            Self::Tick => None,
        }
    }

    /// Stable event name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blur { .. } => "blur",
            Self::Input { .. } => "input",
            Self::Submit { .. } => "submit",
            Self::Dismiss { .. } => "dismiss",
            Self::Tick => "tick",
        }
    }
}

/// The element an event is dispatched to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Target {
    /// A form element.
    Form(FormId),
    /// A field inside a form.
    Field(FormId, FieldId),
    /// The close button of a notification.
    DismissButton(NotificationId),
}

/// The kind of event a listener waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Blur,
    Input,
    Submit,
    Click,
}

/// A declared interest in one kind of event on one target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Listen {
    pub target: Target,
    pub kind: EventKind,
}

impl Listen {
    /// Create a listener key.
    #[must_use]
    pub fn new(target: Target, kind: EventKind) -> Self {
        Self { target, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blur_and_input_target_the_field() {
        let blur = PageEvent::Blur {
            form: "contact".into(),
            field: "email".into(),
        };
        let key = blur.listen_key().expect("blur has a listener key");
        assert_eq!(key.kind, EventKind::Blur);
        assert_eq!(key.target, Target::Field("contact".into(), "email".into()));
    }

    #[test]
    fn tick_needs_no_listener() {
        assert!(PageEvent::Tick.listen_key().is_none());
    }

    #[test]
    fn dismiss_targets_close_button() {
        let id = NotificationId::from_raw(3);
        let key = PageEvent::Dismiss { notification: id }
            .listen_key()
            .expect("dismiss has a listener key");
        assert_eq!(key, Listen::new(Target::DismissButton(id), EventKind::Click));
    }
}
