#![forbid(unsafe_code)]

//! Per-form validation and submission pipeline.
//!
//! # Blur and input
//!
//! Blur validates the field and shows or clears its error. Input only
//! clears the error: a field can look valid while holding an invalid value
//! until its next blur or submit.
//!
//! # Submission sequence
//!
//! 1. The submit event's default action and propagation are suppressed.
//! 2. If a submission is in flight the request is dropped.
//! 3. Existing field errors are cleared and every field is revalidated.
//!    Failures are marked on their fields and a single summary
//!    notification is raised; the form stays enabled.
//! 4. Otherwise the submit control is disabled and relabelled, the payload
//!    is collected and the send is spawned as a runtime task.
//! 5. The send result raises a success or error notification. The control
//!    is re-enabled with its original label on every outcome.
//! 6. After a success the page navigates to the confirmation target once
//!    the configured delay has elapsed.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Field fails validation | Inline error plus one summary notification |
//! | Submit while sending | Dropped silently |
//! | Send returns an error | Error notification, form restored |
//! | Send panics | Caught, reported as a send error, form restored |
//! | Result for an unknown token | Logged and discarded |
//! | Field id not in the document | Treated as valid |

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use pagekit_core::{FieldId, FormDocument, FormId, PipelineConfig, sanitize};
use pagekit_runtime::{Cmd, panic_message};
use pagekit_widgets::{NotificationCenter, Severity};

use crate::field::FieldSpec;
use crate::payload::FormPayload;
use crate::submission::{SubmissionToken, SubmissionTracker};
use crate::transport::{SendError, Transport};
use crate::validation::ValidationResult;
use crate::validator::FieldValidator;

/// Messages handled by a [`FormPipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMsg {
    Blur(FieldId),
    Input(FieldId),
    Submit,
    /// The send task finished.
    SendSettled {
        token: SubmissionToken,
        outcome: Result<(), SendError>,
    },
    /// The post-success delay elapsed.
    Navigate,
}

/// Host submit event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitEvent {
    default_prevented: bool,
    propagation_stopped: bool,
}

impl SubmitEvent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    #[must_use]
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    #[must_use]
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// What a submit request led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A submission was already in flight.
    Ignored,
    /// Validation failed on this many fields.
    Invalid(usize),
    /// The send was started.
    Sending(SubmissionToken),
}

/// Validation and submission controller for one form.
pub struct FormPipeline {
    form: FormId,
    validator: FieldValidator,
    config: PipelineConfig,
    transport: Arc<dyn Transport>,
    submission: SubmissionTracker,
}

impl std::fmt::Debug for FormPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormPipeline")
            .field("form", &self.form)
            .field("transport", &self.transport.name())
            .field("submission", &self.submission.current())
            .finish_non_exhaustive()
    }
}

impl FormPipeline {
    /// Contact form pipeline sending through `transport`.
    pub fn new(form: impl Into<FormId>, config: PipelineConfig, transport: Arc<dyn Transport>) -> Self {
        let validator = FieldValidator::contact_form(&config.messages);
        Self {
            form: form.into(),
            validator,
            config,
            transport,
            submission: SubmissionTracker::new(),
        }
    }

    /// Replace the validation policy.
    #[must_use]
    pub fn with_validator(mut self, validator: FieldValidator) -> Self {
        self.validator = validator;
        self
    }

    #[must_use]
    pub fn form(&self) -> &FormId {
        &self.form
    }

    #[must_use]
    pub fn validator(&self) -> &FieldValidator {
        &self.validator
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submission.is_submitting()
    }

    #[must_use]
    pub fn submission(&self) -> &SubmissionTracker {
        &self.submission
    }

    /// Dispatch a message.
    pub fn update<D: FormDocument + ?Sized>(
        &mut self,
        msg: FormMsg,
        doc: &mut D,
        notify: &mut NotificationCenter,
    ) -> Cmd<FormMsg> {
        match msg {
            FormMsg::Blur(field) => {
                self.on_field_blur(doc, &field);
                Cmd::none()
            }
            FormMsg::Input(field) => {
                self.on_field_input(doc, &field);
                Cmd::none()
            }
            FormMsg::Submit => {
                let mut event = SubmitEvent::new();
                self.on_submit(&mut event, doc, notify).1
            }
            FormMsg::SendSettled { token, outcome } => {
                self.on_send_settled(token, outcome, doc, notify)
            }
            FormMsg::Navigate => Cmd::navigate(self.config.confirmation_target.clone()),
        }
    }

    /// Validate a field that lost focus and update its error display.
    pub fn on_field_blur<D: FormDocument + ?Sized>(
        &self,
        doc: &mut D,
        field: &FieldId,
    ) -> ValidationResult {
        self.check_field(doc, field)
    }

    /// Clear a field's error as soon as it is edited.
    pub fn on_field_input<D: FormDocument + ?Sized>(&self, doc: &mut D, field: &FieldId) {
        doc.clear_field_error(field);
    }

    /// Handle a submit request.
    pub fn on_submit<D: FormDocument + ?Sized>(
        &mut self,
        event: &mut SubmitEvent,
        doc: &mut D,
        notify: &mut NotificationCenter,
    ) -> (SubmitOutcome, Cmd<FormMsg>) {
        event.prevent_default();
        event.stop_propagation();

        if let Some(in_flight) = self.submission.record_duplicate() {
            tracing::debug!(form = %self.form, token = %in_flight, "duplicate submit dropped");
            return (SubmitOutcome::Ignored, Cmd::none());
        }

        for field in doc.invalid_fields() {
            doc.clear_field_error(&field);
        }
        let mut invalid = 0;
        for id in doc.field_ids() {
            if self.check_field(doc, &id).is_invalid() {
                invalid += 1;
            }
        }
        if invalid > 0 {
            tracing::info!(form = %self.form, invalid, "submit blocked by validation");
            notify.show(&self.config.messages.invalid_summary, Severity::Error);
            return (SubmitOutcome::Invalid(invalid), Cmd::none());
        }

        let Some(token) = self.submission.start(doc.submit_label()) else {
            return (SubmitOutcome::Ignored, Cmd::none());
        };
        doc.set_submit_enabled(false);
        doc.set_submit_label(&self.config.busy_label);

        let payload = FormPayload::collect(&doc.fields());
        let transport = Arc::clone(&self.transport);
        tracing::info!(
            form = %self.form,
            %token,
            transport = transport.name(),
            fields = payload.len(),
            "submission started"
        );
        let cmd = Cmd::task_named(format!("send:{}", self.form), move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| transport.send(&payload)))
                .unwrap_or_else(|panic| Err(SendError::Panicked(panic_message(panic.as_ref()))));
            FormMsg::SendSettled { token, outcome }
        });
        (SubmitOutcome::Sending(token), cmd)
    }

    /// Finish a submission once its send settled.
    pub fn on_send_settled<D: FormDocument + ?Sized>(
        &mut self,
        token: SubmissionToken,
        outcome: Result<(), SendError>,
        doc: &mut D,
        notify: &mut NotificationCenter,
    ) -> Cmd<FormMsg> {
        let Some(in_flight) = self.submission.settle(token, outcome.is_ok()) else {
            tracing::warn!(form = %self.form, %token, "stale send result discarded");
            return Cmd::none();
        };

        let cmd = match outcome {
            Ok(()) => {
                tracing::info!(form = %self.form, %token, "submission sent");
                notify.show(&self.config.messages.sent, Severity::Success);
                Cmd::after(self.config.navigate_delay, FormMsg::Navigate)
            }
            Err(err) => {
                tracing::warn!(form = %self.form, %token, error = %err, "submission failed");
                notify.show(&self.config.messages.send_failed, Severity::Error);
                Cmd::none()
            }
        };

        doc.set_submit_enabled(true);
        if let Some(label) = in_flight.original_label {
            doc.set_submit_label(&label);
        }
        cmd
    }

    fn check_field<D: FormDocument + ?Sized>(&self, doc: &mut D, id: &FieldId) -> ValidationResult {
        let Some(snapshot) = doc.field(id) else {
            tracing::debug!(form = %self.form, field = %id, "field not in document");
            return ValidationResult::Valid;
        };
        let result = self.validator.validate(&FieldSpec::from(&snapshot));
        match result.error() {
            Some(error) => {
                tracing::debug!(form = %self.form, field = %id, code = error.code, "field invalid");
                doc.show_field_error(id, &sanitize(&error.message));
            }
            None => {
                tracing::debug!(form = %self.form, field = %id, "field valid");
                doc.clear_field_error(id);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::submission::SubmissionEvent;
    use crate::transport::RecordingTransport;
    use crate::validation::contact;
    use pagekit_core::{ManualClock, MemoryDocument, NotificationConfig};

    struct Fixture {
        pipeline: FormPipeline,
        doc: MemoryDocument,
        notify: NotificationCenter,
        transport: RecordingTransport,
    }

    fn fixture(transport: RecordingTransport) -> Fixture {
        let clock = ManualClock::new();
        Fixture {
            pipeline: FormPipeline::new(
                "contactForm",
                PipelineConfig::default(),
                Arc::new(transport.clone()),
            ),
            doc: contact::blank_document(),
            notify: NotificationCenter::new(clock.shared(), NotificationConfig::default()),
            transport,
        }
    }

    fn fill_valid(doc: &mut MemoryDocument) {
        doc.set_value(&contact::FIRST_NAME.into(), "Ada");
        doc.set_value(&contact::LAST_NAME.into(), "Lovelace");
        doc.set_value(&contact::EMAIL.into(), "ada@example.org");
        doc.set_value(&contact::MESSAGE.into(), "Hello there, engine fans");
        doc.set_checked(&contact::PRIVACY.into(), true);
    }

    fn run_task(cmd: Cmd<FormMsg>) -> FormMsg {
        match cmd {
            Cmd::Task(_, f) => f(),
            other => panic!("expected task, got {other:?}"),
        }
    }

    #[test]
    fn blur_shows_then_clears_error() {
        let mut fx = fixture(RecordingTransport::new());
        let email = FieldId::from(contact::EMAIL);
        fx.doc.set_value(&email, "nope");
        assert!(fx.pipeline.on_field_blur(&mut fx.doc, &email).is_invalid());
        assert!(fx.doc.has_error(&email));
        assert_eq!(
            fx.doc.visible_feedback(&email),
            Some("Please enter a valid email address")
        );

        fx.doc.set_value(&email, "a@b.co");
        assert!(fx.pipeline.on_field_blur(&mut fx.doc, &email).is_valid());
        assert!(!fx.doc.has_error(&email));
        assert_eq!(fx.doc.visible_feedback(&email), None);
    }

    #[test]
    fn blur_on_unknown_field_is_valid() {
        let mut fx = fixture(RecordingTransport::new());
        let result = fx.pipeline.on_field_blur(&mut fx.doc, &FieldId::from("nickname"));
        assert!(result.is_valid());
        assert!(fx.doc.invalid_fields().is_empty());
    }

    #[test]
    fn input_clears_error_without_revalidating() {
        let mut fx = fixture(RecordingTransport::new());
        let first = FieldId::from(contact::FIRST_NAME);
        fx.pipeline.on_field_blur(&mut fx.doc, &first);
        assert!(fx.doc.has_error(&first));
        fx.pipeline.on_field_input(&mut fx.doc, &first);
        assert!(!fx.doc.has_error(&first));
    }

    #[test]
    fn invalid_submit_marks_fields_and_raises_one_summary() {
        let mut fx = fixture(RecordingTransport::new());
        let mut event = SubmitEvent::new();
        let (outcome, cmd) = fx.pipeline.on_submit(&mut event, &mut fx.doc, &mut fx.notify);

        assert!(event.is_default_prevented());
        assert!(event.is_propagation_stopped());
        // Every required field is blank; the optional phone passes.
        assert_eq!(outcome, SubmitOutcome::Invalid(5));
        assert!(cmd.is_none());
        assert_eq!(fx.notify.len(), 1);
        assert_eq!(fx.notify.entries()[0].severity(), Severity::Error);
        assert_eq!(fx.notify.entries()[0].message(), "Please correct the marked errors");
        assert!(!fx.pipeline.is_submitting());
        assert!(fx.doc.submit().is_some_and(|s| s.enabled));
        assert_eq!(fx.transport.call_count(), 0);
    }

    #[test]
    fn submit_clears_stale_errors_before_revalidating() {
        let mut fx = fixture(RecordingTransport::new());
        fill_valid(&mut fx.doc);
        let phone = FieldId::from(contact::PHONE);
        fx.doc.show_field_error(&phone, "old");
        let mut event = SubmitEvent::new();
        let (outcome, _) = fx.pipeline.on_submit(&mut event, &mut fx.doc, &mut fx.notify);
        assert!(matches!(outcome, SubmitOutcome::Sending(_)));
        assert!(fx.doc.invalid_fields().is_empty());
    }

    #[test]
    fn successful_send_notifies_restores_and_schedules_navigation() {
        let mut fx = fixture(RecordingTransport::new());
        fill_valid(&mut fx.doc);
        let mut event = SubmitEvent::new();
        let (outcome, cmd) = fx.pipeline.on_submit(&mut event, &mut fx.doc, &mut fx.notify);
        let SubmitOutcome::Sending(token) = outcome else {
            panic!("expected sending, got {outcome:?}");
        };
        let submit = fx.doc.submit().cloned().expect("submit control");
        assert!(!submit.enabled);
        assert_eq!(submit.label, "Sending...");

        let FormMsg::SendSettled { token: settled, outcome } = run_task(cmd) else {
            panic!("expected settlement");
        };
        assert_eq!(settled, token);
        let next = fx
            .pipeline
            .on_send_settled(settled, outcome, &mut fx.doc, &mut fx.notify);

        assert!(matches!(next, Cmd::After(d, FormMsg::Navigate) if d == Duration::from_millis(1000)));
        assert_eq!(fx.notify.entries()[0].severity(), Severity::Success);
        let submit = fx.doc.submit().cloned().expect("submit control");
        assert!(submit.enabled);
        assert_eq!(submit.label, contact::SUBMIT_LABEL);
        assert_eq!(fx.transport.call_count(), 1);
        assert_eq!(
            fx.transport.calls()[0].get("privacy"),
            Some(pagekit_core::DEFAULT_CHECKBOX_VALUE)
        );
        assert_eq!(fx.pipeline.submission().verify_trace(), Ok(()));
    }

    #[test]
    fn duplicate_submit_is_traced_and_sends_nothing() {
        let mut fx = fixture(RecordingTransport::new());
        fill_valid(&mut fx.doc);
        let (first, _cmd) = fx
            .pipeline
            .on_submit(&mut SubmitEvent::new(), &mut fx.doc, &mut fx.notify);
        let SubmitOutcome::Sending(token) = first else {
            panic!("expected sending, got {first:?}");
        };

        let mut again = SubmitEvent::new();
        let (outcome, cmd) = fx.pipeline.on_submit(&mut again, &mut fx.doc, &mut fx.notify);
        assert_eq!(outcome, SubmitOutcome::Ignored);
        assert!(cmd.is_none());
        assert!(again.is_default_prevented());
        assert_eq!(fx.pipeline.submission().current(), Some(token));
        assert_eq!(
            fx.pipeline.submission().trace().last(),
            Some(&SubmissionEvent::DuplicateIgnored { in_flight: token })
        );
        assert_eq!(fx.pipeline.submission().verify_trace(), Ok(()));
    }

    #[test]
    fn failed_send_restores_form() {
        let transport = RecordingTransport::new().then(Err(SendError::Transport("offline".into())));
        let mut fx = fixture(transport);
        fill_valid(&mut fx.doc);
        let (_, cmd) = fx
            .pipeline
            .on_submit(&mut SubmitEvent::new(), &mut fx.doc, &mut fx.notify);
        let FormMsg::SendSettled { token, outcome } = run_task(cmd) else {
            panic!("expected settlement");
        };
        assert!(outcome.is_err());
        let next = fx
            .pipeline
            .on_send_settled(token, outcome, &mut fx.doc, &mut fx.notify);

        assert!(next.is_none());
        assert_eq!(fx.notify.entries()[0].severity(), Severity::Error);
        assert_eq!(
            fx.notify.entries()[0].message(),
            "Something went wrong. Please try again later."
        );
        assert!(fx.doc.submit().is_some_and(|s| s.enabled && s.label == contact::SUBMIT_LABEL));
        assert!(!fx.pipeline.is_submitting());
    }

    #[test]
    fn panicking_transport_is_reported_as_send_error() {
        let transport = crate::transport::FnTransport::new("boom", |_: &FormPayload| -> Result<(), SendError> {
            panic!("socket exploded")
        });
        let clock = ManualClock::new();
        let mut pipeline =
            FormPipeline::new("contactForm", PipelineConfig::default(), Arc::new(transport));
        let mut doc = contact::blank_document();
        let mut notify = NotificationCenter::new(clock.shared(), NotificationConfig::default());
        fill_valid(&mut doc);

        let (_, cmd) = pipeline.on_submit(&mut SubmitEvent::new(), &mut doc, &mut notify);
        let FormMsg::SendSettled { token, outcome } = run_task(cmd) else {
            panic!("expected settlement");
        };
        assert_eq!(outcome, Err(SendError::Panicked("socket exploded".into())));
        pipeline.on_send_settled(token, outcome, &mut doc, &mut notify);
        assert!(doc.submit().is_some_and(|s| s.enabled));
    }

    #[test]
    fn submit_while_sending_is_ignored() {
        let mut fx = fixture(RecordingTransport::new());
        fill_valid(&mut fx.doc);
        let (first, _pending) = fx
            .pipeline
            .on_submit(&mut SubmitEvent::new(), &mut fx.doc, &mut fx.notify);
        assert!(matches!(first, SubmitOutcome::Sending(_)));

        let mut event = SubmitEvent::new();
        let (second, cmd) = fx.pipeline.on_submit(&mut event, &mut fx.doc, &mut fx.notify);
        assert_eq!(second, SubmitOutcome::Ignored);
        assert!(cmd.is_none());
        assert!(event.is_default_prevented());
        assert!(fx.notify.is_empty());
    }

    #[test]
    fn stale_settlement_is_discarded() {
        let mut fx = fixture(RecordingTransport::new());
        let cmd = fx.pipeline.on_send_settled(
            SubmissionToken::from_raw(42),
            Ok(()),
            &mut fx.doc,
            &mut fx.notify,
        );
        assert!(cmd.is_none());
        assert!(fx.notify.is_empty());
    }

    #[test]
    fn navigate_message_targets_confirmation_page() {
        let mut fx = fixture(RecordingTransport::new());
        let cmd = fx.pipeline.update(FormMsg::Navigate, &mut fx.doc, &mut fx.notify);
        assert!(matches!(cmd, Cmd::Navigate(ref url) if url == "thank_you.html"));
    }

    #[test]
    fn field_errors_are_escaped() {
        let messages = pagekit_core::FormMessages {
            email: "<b>bad</b> email".into(),
            ..Default::default()
        };
        let config = PipelineConfig::default().messages(messages);
        let pipeline = FormPipeline::new("f", config, Arc::new(RecordingTransport::new()));
        let mut doc = contact::blank_document();
        let email = FieldId::from(contact::EMAIL);
        doc.set_value(&email, "x");
        pipeline.on_field_blur(&mut doc, &email);
        assert_eq!(doc.visible_feedback(&email), Some("&lt;b&gt;bad&lt;/b&gt; email"));
    }
}
