#![forbid(unsafe_code)]

//! The scripted contact-page session.
//!
//! [`DemoPage`] wraps the contact [`FormPage`] and records a transcript of
//! what a visitor would see: every change to the notification stack and to
//! the submit control, stamped with the page clock.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use pagekit::core::{FieldSnapshot, MonotonicClock};
use pagekit::forms::{FieldSpec, FnTransport, FormPayload};
use pagekit::{
    Cmd, ExitReason, FieldErrorDisplay, FieldId, FormDocument, FormId, FormPage, FormPipeline,
    MemoryDocument, Model, NotificationCenter, PageConfig, PageEvent, PageMsg, Program,
    ProgramConfig, ScriptedEvents, SendError, SharedClock, SimulatedTransport, Transport, contact,
};

use crate::cli::{Opts, Scenario};
use crate::viewport::{self, ViewportMonitor, ViewportReport};

/// Form id of the contact form.
pub const CONTACT_FORM: &str = "contactForm";

/// Upper bound on a session, well past the longest scripted timeline.
const MAX_RUNTIME: Duration = Duration::from_secs(30);

/// Contact page plus a visitor-eye transcript.
pub struct DemoPage {
    page: FormPage<MemoryDocument>,
    clock: SharedClock,
    width: usize,
    transcript: Vec<String>,
    last_stack: Vec<String>,
    last_submit: Option<(String, bool)>,
}

impl std::fmt::Debug for DemoPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoPage")
            .field("page", &self.page)
            .field("width", &self.width)
            .field("transcript_lines", &self.transcript.len())
            .finish_non_exhaustive()
    }
}

impl DemoPage {
    #[must_use]
    pub fn new(page: FormPage<MemoryDocument>, clock: SharedClock, width: usize) -> Self {
        let mut demo = Self {
            page,
            clock,
            width,
            transcript: Vec::new(),
            last_stack: Vec::new(),
            last_submit: None,
        };
        demo.record_changes();
        demo
    }

    #[must_use]
    pub fn page(&self) -> &FormPage<MemoryDocument> {
        &self.page
    }

    #[must_use]
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    fn stamp(&self) -> String {
        let now = self.clock.now_mono();
        format!("[{:>4}.{:03}s]", now.as_secs(), now.subsec_millis())
    }

    fn record_changes(&mut self) {
        let submit = self
            .page
            .document(&FormId::from(CONTACT_FORM))
            .and_then(|doc| doc.submit())
            .map(|s| (s.label.clone(), s.enabled));
        if submit != self.last_submit {
            if let Some((label, enabled)) = &submit {
                let state = if *enabled { "enabled" } else { "disabled" };
                let line = format!("{} submit \"{label}\" ({state})", self.stamp());
                self.transcript.push(line);
            }
            self.last_submit = submit;
        }

        let stack = self.page.notifications().render_lines(self.width);
        if stack != self.last_stack {
            let header = if stack.is_empty() {
                format!("{} notifications cleared", self.stamp())
            } else {
                format!("{} notifications:", self.stamp())
            };
            self.transcript.push(header);
            self.transcript
                .extend(stack.iter().map(|line| format!("    {line}")));
            self.last_stack = stack;
        }
    }
}

impl Model for DemoPage {
    type Message = PageMsg;

    fn update(&mut self, msg: PageMsg) -> Cmd<PageMsg> {
        let cmd = self.page.update(msg);
        self.record_changes();
        cmd
    }

    fn listeners(&self) -> Vec<pagekit::core::Listen> {
        self.page.listeners()
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.page.next_deadline()
    }
}

/// Everything a finished session produced.
#[derive(Debug)]
pub struct SessionReport {
    pub scenario: Scenario,
    pub exit: ExitReason,
    pub transcript: Vec<String>,
    /// Inline errors left on the form, one rendered line per field.
    pub field_errors: Vec<String>,
    pub viewport: ViewportReport,
}

impl SessionReport {
    /// Human-readable report.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "scenario: {}", self.scenario);
        for line in &self.transcript {
            let _ = writeln!(out, "{line}");
        }
        if !self.field_errors.is_empty() {
            let _ = writeln!(out, "field errors:");
            for line in &self.field_errors {
                let _ = writeln!(out, "    {line}");
            }
        }
        let exit = match &self.exit {
            ExitReason::Navigated(url) => format!("navigated to {url}"),
            ExitReason::Quit => "quit".to_string(),
            ExitReason::Idle => "page idle".to_string(),
        };
        let _ = writeln!(out, "exit: {exit}");
        let _ = writeln!(
            out,
            "viewport: {} resize events -> widths {:?}; {} scroll events -> {} updates",
            self.viewport.resize_events,
            self.viewport.applied_widths,
            self.viewport.scroll_events,
            self.viewport.scroll_updates.len()
        );
        out
    }
}

/// Form contents for a scenario.
#[must_use]
pub fn scenario_document(scenario: Scenario) -> MemoryDocument {
    let mut doc = contact::blank_document();
    let mut set = |id: &str, value: &str| {
        doc.set_value(&FieldId::from(id), value);
    };
    match scenario {
        Scenario::Invalid => {
            set(contact::FIRST_NAME, "J");
            set(contact::LAST_NAME, "Doe");
            set(contact::EMAIL, "john@example");
            set(contact::PHONE, "12");
            set(contact::MESSAGE, "Hi");
        }
        Scenario::Valid | Scenario::Failure | Scenario::Double => {
            set(contact::FIRST_NAME, "Jane");
            set(contact::LAST_NAME, "O'Connor");
            set(contact::EMAIL, "jane@example.org");
            set(contact::PHONE, "+1 (555) 010-4477");
            set(contact::MESSAGE, "I'd like a quote for <three> seats & support.");
            doc.set_checked(&FieldId::from(contact::PRIVACY), true);
        }
    }
    doc
}

/// Visitor events for a scenario: focus moves through every field, then
/// the form is submitted.
#[must_use]
pub fn scenario_events(scenario: Scenario) -> ScriptedEvents {
    let form = FormId::from(CONTACT_FORM);
    let mut events = ScriptedEvents::new();
    let mut at = Duration::ZERO;
    for id in [
        contact::FIRST_NAME,
        contact::LAST_NAME,
        contact::EMAIL,
        contact::PHONE,
        contact::MESSAGE,
    ] {
        at += Duration::from_millis(100);
        events = events.at(
            at,
            PageEvent::Blur {
                form: form.clone(),
                field: FieldId::from(id),
            },
        );
    }
    at += Duration::from_millis(200);
    events = events.at(at, PageEvent::Submit { form: form.clone() });
    if scenario == Scenario::Double {
        events = events.at(at + Duration::from_millis(50), PageEvent::Submit { form });
    }
    events
}

fn transport(scenario: Scenario, latency: Duration) -> Arc<dyn Transport> {
    match scenario {
        Scenario::Failure => Arc::new(FnTransport::new("rejecting", move |_: &FormPayload| {
            std::thread::sleep(latency);
            Err(SendError::Rejected {
                status: 503,
                reason: "service unavailable".into(),
            })
        })),
        _ => Arc::new(SimulatedTransport::new(latency)),
    }
}

/// Inline errors left on the form, rendered with their validation codes.
fn field_errors(page: &FormPage<MemoryDocument>, width: usize) -> Vec<String> {
    let form = FormId::from(CONTACT_FORM);
    let (Some(doc), Some(pipeline)) = (page.document(&form), page.pipeline(&form)) else {
        return Vec::new();
    };
    doc.invalid_fields()
        .iter()
        .filter_map(|id| doc.field(id))
        .filter_map(|snapshot: FieldSnapshot| {
            let result = pipeline.validator().validate(&FieldSpec::from(&snapshot));
            let error = result.error()?;
            let display = FieldErrorDisplay::with_code(error.code, error.message.clone());
            Some(format!(
                "{:<10} {}",
                snapshot.id.as_str(),
                display.render_line(width.saturating_sub(11))
            ))
        })
        .collect()
}

/// Run one scripted session on the wall clock.
pub fn run(opts: &Opts, config: &PageConfig) -> pagekit::Result<SessionReport> {
    tracing::info!(scenario = %opts.scenario, latency_ms = opts.latency.as_millis() as u64, "session starting");
    let viewport = ViewportMonitor::replay(&config.rate_limit, viewport::contact_page_visit());

    let clock: SharedClock = Arc::new(MonotonicClock::new());
    let pipeline = FormPipeline::new(
        CONTACT_FORM,
        config.pipeline.clone(),
        transport(opts.scenario, opts.latency),
    );
    let page = FormPage::new(NotificationCenter::new(clock.clone(), config.notifications))
        .with_form(pipeline, scenario_document(opts.scenario));
    let model = DemoPage::new(page, clock.clone(), opts.width);

    let outcome = Program::with_clock(model, scenario_events(opts.scenario), clock)
        .config(ProgramConfig::default().max_runtime(MAX_RUNTIME))
        .run()?;

    let field_errors = field_errors(outcome.model.page(), opts.width);
    Ok(SessionReport {
        scenario: opts.scenario,
        exit: outcome.exit,
        transcript: outcome.model.transcript,
        field_errors,
        viewport,
    })
}
