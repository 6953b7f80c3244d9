#![forbid(unsafe_code)]

//! The page model: notification stack plus one pipeline per form.
//!
//! [`FormPage`] implements [`Model`], so the threaded [`Program`] and the
//! deterministic [`PageSimulator`] can both drive it. Page events are routed
//! by form id; events for forms the page does not host are ignored.
//!
//! Listener declarations follow the current state: one submit listener per
//! form, blur and input listeners per field, and one click listener per
//! notification that is still on screen.
//!
//! [`Program`]: pagekit_runtime::Program
//! [`PageSimulator`]: pagekit_runtime::PageSimulator

use std::time::Duration;

use pagekit_core::{EventKind, FormDocument, FormId, Listen, PageEvent, Target};
use pagekit_runtime::{Cmd, Model};
use pagekit_widgets::NotificationCenter;

use crate::pipeline::{FormMsg, FormPipeline};

/// Messages handled by a [`FormPage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageMsg {
    /// A host event.
    Event(PageEvent),
    /// A message addressed to one form's pipeline.
    Form(FormId, FormMsg),
}

impl From<PageEvent> for PageMsg {
    fn from(event: PageEvent) -> Self {
        Self::Event(event)
    }
}

/// A page hosting forms and a notification stack.
#[derive(Debug)]
pub struct FormPage<D: FormDocument> {
    notifications: NotificationCenter,
    forms: Vec<(FormPipeline, D)>,
}

impl<D: FormDocument> FormPage<D> {
    pub fn new(notifications: NotificationCenter) -> Self {
        Self {
            notifications,
            forms: Vec::new(),
        }
    }

    /// Host a form. A pipeline for an already hosted form id replaces it.
    #[must_use]
    pub fn with_form(mut self, pipeline: FormPipeline, doc: D) -> Self {
        self.forms.retain(|(p, _)| p.form() != pipeline.form());
        self.forms.push((pipeline, doc));
        self
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationCenter {
        &mut self.notifications
    }

    /// The pipeline of a hosted form.
    #[must_use]
    pub fn pipeline(&self, form: &FormId) -> Option<&FormPipeline> {
        self.forms.iter().find(|(p, _)| p.form() == form).map(|(p, _)| p)
    }

    /// The document of a hosted form.
    #[must_use]
    pub fn document(&self, form: &FormId) -> Option<&D> {
        self.forms.iter().find(|(p, _)| p.form() == form).map(|(_, d)| d)
    }

    /// Mutable access to a hosted form's document, for simulating edits.
    pub fn document_mut(&mut self, form: &FormId) -> Option<&mut D> {
        self.forms
            .iter_mut()
            .find(|(p, _)| p.form() == form)
            .map(|(_, d)| d)
    }

    /// Hosted form ids in registration order.
    pub fn form_ids(&self) -> impl Iterator<Item = &FormId> {
        self.forms.iter().map(|(p, _)| p.form())
    }

    fn route(&mut self, form: FormId, msg: FormMsg) -> Cmd<PageMsg> {
        let Some((pipeline, doc)) = self.forms.iter_mut().find(|(p, _)| p.form() == &form) else {
            tracing::debug!(form = %form, "message for unknown form dropped");
            return Cmd::none();
        };
        pipeline
            .update(msg, doc, &mut self.notifications)
            .map(move |m| PageMsg::Form(form.clone(), m))
    }

    fn on_event(&mut self, event: PageEvent) -> Cmd<PageMsg> {
        match event {
            PageEvent::Blur { form, field } => self.route(form, FormMsg::Blur(field)),
            PageEvent::Input { form, field } => self.route(form, FormMsg::Input(field)),
            PageEvent::Submit { form } => self.route(form, FormMsg::Submit),
            PageEvent::Dismiss { notification } => {
                self.notifications.dismiss(notification);
                Cmd::none()
            }
            PageEvent::Tick => {
                let removed = self.notifications.tick();
                if !removed.is_empty() {
                    tracing::trace!(count = removed.len(), "notifications detached");
                }
                Cmd::none()
            }
        }
    }
}

impl<D: FormDocument> Model for FormPage<D> {
    type Message = PageMsg;

    fn update(&mut self, msg: PageMsg) -> Cmd<PageMsg> {
        match msg {
            PageMsg::Event(event) => self.on_event(event),
            PageMsg::Form(form, msg) => self.route(form, msg),
        }
    }

    fn listeners(&self) -> Vec<Listen> {
        let mut keys = self.notifications.listeners();
        for (pipeline, doc) in &self.forms {
            let form = pipeline.form();
            keys.push(Listen::new(Target::Form(form.clone()), EventKind::Submit));
            for field in doc.field_ids() {
                let target = Target::Field(form.clone(), field);
                keys.push(Listen::new(target.clone(), EventKind::Blur));
                keys.push(Listen::new(target, EventKind::Input));
            }
        }
        keys
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.notifications.next_deadline()
    }
}
