#![forbid(unsafe_code)]

//! Elm-style page runtime.
//!
//! A page is a [`Model`]: state plus an `update` function that turns a
//! message into the next state and a [`Cmd`] describing side effects. The
//! runtime owns every effect:
//!
//! - `Cmd::After` delivers a message once a delay elapses.
//! - `Cmd::Task` runs a blocking closure off the update path and feeds its
//!   result back as a message.
//! - `Cmd::Navigate` leaves the page.
//!
//! Time-driven components expose `Model::next_deadline()`; the runtime
//! delivers [`PageEvent::Tick`] once that instant is reached.
//!
//! [`Program`] is the threaded runtime: tasks run on spawned threads and
//! report back over a channel. [`PageSimulator`](crate::simulator::PageSimulator)
//! runs the same model deterministically for tests.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Task panics | Panic is logged; no message is delivered |
//! | Run exceeds `ProgramConfig::max_runtime` | `RuntimeError::DeadlineExceeded` |
//! | Model never settles after a tick | Warning logged, loop keeps running |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use pagekit_core::{MonotonicClock, PageEvent, SharedClock, TimerQueue};

use crate::listener::ListenerSet;

/// A page model.
pub trait Model: Sized {
    /// Message type. Page events convert into it.
    type Message: From<PageEvent> + Send + 'static;

    /// Commands to run once at startup.
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    /// Apply a message.
    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;

    /// Listener keys the model wants attached right now.
    ///
    /// Called after every update. Events for keys that are not declared are
    /// dropped before reaching `update`.
    fn listeners(&self) -> Vec<pagekit_core::Listen> {
        vec![]
    }

    /// Earliest instant at which the model wants a [`PageEvent::Tick`].
    fn next_deadline(&self) -> Option<Duration> {
        None
    }
}

/// Metadata for background tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSpec {
    /// Optional task name for diagnostics.
    pub name: Option<String>,
}

impl TaskSpec {
    /// Attach a task name for diagnostics.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Side effects returned from `init` and `update`.
#[derive(Default)]
pub enum Cmd<M> {
    /// No operation.
    #[default]
    None,
    /// Stop the program.
    Quit,
    /// Execute commands in order.
    Batch(Vec<Cmd<M>>),
    /// Deliver a message immediately.
    Msg(M),
    /// Deliver a message once the delay has elapsed.
    After(Duration, M),
    /// Run a blocking closure off the update path; its return value is
    /// delivered as a message.
    Task(TaskSpec, Box<dyn FnOnce() -> M + Send>),
    /// Leave the page for the given location.
    Navigate(String),
    /// Emit a log line.
    Log(String),
}

impl<M: fmt::Debug> fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Quit => write!(f, "Quit"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Msg(m) => f.debug_tuple("Msg").field(m).finish(),
            Self::After(d, m) => f.debug_tuple("After").field(d).field(m).finish(),
            Self::Task(spec, _) => f.debug_struct("Task").field("spec", spec).finish(),
            Self::Navigate(url) => f.debug_tuple("Navigate").field(url).finish(),
            Self::Log(s) => f.debug_tuple("Log").field(s).finish(),
        }
    }
}

type MapFn<M, N> = Arc<dyn Fn(M) -> N + Send + Sync>;

impl<M> Cmd<M> {
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    #[inline]
    pub fn quit() -> Self {
        Self::Quit
    }

    #[inline]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    #[inline]
    pub fn after(delay: Duration, m: M) -> Self {
        Self::After(delay, m)
    }

    #[inline]
    pub fn navigate(location: impl Into<String>) -> Self {
        Self::Navigate(location.into())
    }

    #[inline]
    pub fn log(msg: impl Into<String>) -> Self {
        Self::Log(msg.into())
    }

    /// Create a batch, collapsing empty and single-element lists.
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or(Self::None),
            _ => Self::Batch(cmds),
        }
    }

    /// Create a background task command.
    pub fn task<F>(f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(TaskSpec::default(), Box::new(f))
    }

    /// Create a named background task command.
    pub fn task_named<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(TaskSpec::default().with_name(name), Box::new(f))
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Stable name for tracing.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Quit => "Quit",
            Self::Batch(_) => "Batch",
            Self::Msg(_) => "Msg",
            Self::After(..) => "After",
            Self::Task(..) => "Task",
            Self::Navigate(_) => "Navigate",
            Self::Log(_) => "Log",
        }
    }
}

impl<M: 'static> Cmd<M> {
    /// Convert every message this command can produce.
    ///
    /// Lets a parent model embed a child's commands.
    pub fn map<N: 'static>(self, f: impl Fn(M) -> N + Send + Sync + 'static) -> Cmd<N> {
        let f: MapFn<M, N> = Arc::new(f);
        self.map_with(&f)
    }

    fn map_with<N: 'static>(self, f: &MapFn<M, N>) -> Cmd<N> {
        match self {
            Self::None => Cmd::None,
            Self::Quit => Cmd::Quit,
            Self::Batch(cmds) => Cmd::Batch(cmds.into_iter().map(|c| c.map_with(f)).collect()),
            Self::Msg(m) => Cmd::Msg(f(m)),
            Self::After(d, m) => Cmd::After(d, f(m)),
            Self::Task(spec, task) => {
                let f = Arc::clone(f);
                Cmd::Task(spec, Box::new(move || f(task())))
            }
            Self::Navigate(url) => Cmd::Navigate(url),
            Self::Log(s) => Cmd::Log(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Runtime failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The program ran longer than its configured maximum.
    DeadlineExceeded(Duration),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadlineExceeded(limit) => {
                write!(f, "program did not finish within {}ms", limit.as_millis())
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

// ---------------------------------------------------------------------------
// Event sources
// ---------------------------------------------------------------------------

/// Supplier of host page events.
pub trait EventSource {
    /// Next event that is due at `now`, if any.
    fn poll(&mut self, now: Duration) -> Option<PageEvent>;

    /// Instant of the next scheduled event, if known.
    fn next_due(&self) -> Option<Duration> {
        None
    }

    /// Whether the source will never yield another event.
    fn is_exhausted(&self) -> bool;
}

/// Events replayed at fixed offsets from program start.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEvents {
    queue: std::collections::VecDeque<(Duration, PageEvent)>,
}

impl ScriptedEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event delivered at `at`. Offsets must be non-decreasing.
    #[must_use]
    pub fn at(mut self, at: Duration, event: PageEvent) -> Self {
        self.queue.push_back((at, event));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl EventSource for ScriptedEvents {
    fn poll(&mut self, now: Duration) -> Option<PageEvent> {
        match self.queue.front() {
            Some((at, _)) if *at <= now => self.queue.pop_front().map(|(_, event)| event),
            _ => None,
        }
    }

    fn next_due(&self) -> Option<Duration> {
        self.queue.front().map(|(at, _)| *at)
    }

    fn is_exhausted(&self) -> bool {
        self.queue.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Program
// ---------------------------------------------------------------------------

/// Runtime limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramConfig {
    /// Longest sleep between loop iterations.
    pub poll_interval: Duration,
    /// Abort with an error if the program is still running after this long.
    pub max_runtime: Option<Duration>,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(20),
            max_runtime: None,
        }
    }
}

impl ProgramConfig {
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn max_runtime(mut self, limit: Duration) -> Self {
        self.max_runtime = Some(limit);
        self
    }
}

/// Why a program stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// `Cmd::Quit` was executed.
    Quit,
    /// The page navigated away.
    Navigated(String),
    /// No events, timers, tasks or deadlines remained.
    Idle,
}

/// Final state of a finished program.
#[derive(Debug)]
pub struct ProgramOutcome<M> {
    pub model: M,
    pub exit: ExitReason,
    pub logs: Vec<String>,
}

/// Same-instant ticks tolerated before the loop yields.
const MAX_TICKS_PER_INSTANT: usize = 64;

/// Threaded page runtime.
pub struct Program<M: Model, E: EventSource> {
    model: M,
    events: E,
    clock: SharedClock,
    config: ProgramConfig,
    listeners: ListenerSet,
    timers: TimerQueue<u64>,
    delayed: HashMap<u64, M::Message>,
    next_timer: u64,
    task_sender: mpsc::Sender<M::Message>,
    task_receiver: mpsc::Receiver<M::Message>,
    task_handles: Vec<(Option<String>, JoinHandle<()>)>,
    logs: Vec<String>,
    exit: Option<ExitReason>,
}

impl<M: Model, E: EventSource> Program<M, E> {
    /// Create a program driven by `events` on a monotonic clock.
    pub fn new(model: M, events: E) -> Self {
        Self::with_clock(model, events, Arc::new(MonotonicClock::new()))
    }

    /// Create a program reading time from `clock`.
    ///
    /// Components inside the model must share the same clock.
    pub fn with_clock(model: M, events: E, clock: SharedClock) -> Self {
        let (task_sender, task_receiver) = mpsc::channel();
        Self {
            model,
            events,
            clock,
            config: ProgramConfig::default(),
            listeners: ListenerSet::new(),
            timers: TimerQueue::new(),
            delayed: HashMap::new(),
            next_timer: 0,
            task_sender,
            task_receiver,
            task_handles: Vec::new(),
            logs: Vec::new(),
            exit: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: ProgramConfig) -> Self {
        self.config = config;
        self
    }

    /// Run until the model quits, navigates or goes idle.
    pub fn run(mut self) -> Result<ProgramOutcome<M>, RuntimeError> {
        let started = self.clock.now_mono();
        tracing::info!("page program starting");
        let cmd = self.model.init();
        self.execute_cmd(cmd);
        self.reconcile();

        while self.exit.is_none() {
            let now = self.clock.now_mono();
            if let Some(limit) = self.config.max_runtime
                && now.saturating_sub(started) > limit
            {
                tracing::error!(limit_ms = limit.as_millis() as u64, "program deadline exceeded");
                self.join_tasks();
                return Err(RuntimeError::DeadlineExceeded(limit));
            }

            // Reap before draining so a finished task's message is never
            // left behind when the loop decides it is idle.
            self.reap_finished_tasks();
            self.process_task_results();
            self.fire_due(now);
            while self.exit.is_none()
                && let Some(event) = self.events.poll(now)
            {
                self.inject(event);
            }

            if self.exit.is_some() {
                break;
            }
            if self.is_idle() {
                self.exit = Some(ExitReason::Idle);
                break;
            }
            self.wait_for_work();
        }

        self.join_tasks();
        let exit = self.exit.take().unwrap_or(ExitReason::Idle);
        tracing::info!(?exit, "page program finished");
        Ok(ProgramOutcome {
            model: self.model,
            exit,
            logs: self.logs,
        })
    }

    fn inject(&mut self, event: PageEvent) {
        if !self.listeners.accepts(&event) {
            tracing::debug!(event = event.name(), "event dropped: no listener attached");
            return;
        }
        self.dispatch(M::Message::from(event));
    }

    fn dispatch(&mut self, msg: M::Message) {
        if self.exit.is_some() {
            return;
        }
        let cmd = self.model.update(msg);
        tracing::trace!(cmd_type = cmd.type_name(), "update returned");
        self.execute_cmd(cmd);
        self.reconcile();
    }

    fn reconcile(&mut self) {
        let declared = self.model.listeners();
        self.listeners.reconcile(declared);
    }

    fn fire_due(&mut self, now: Duration) {
        for key in self.timers.pop_due(now) {
            if let Some(msg) = self.delayed.remove(&key) {
                self.dispatch(msg);
            }
        }
        let mut ticks = 0;
        while self.exit.is_none() && self.model.next_deadline().is_some_and(|d| d <= now) {
            if ticks == MAX_TICKS_PER_INSTANT {
                tracing::warn!("model deadline did not advance after repeated ticks");
                break;
            }
            ticks += 1;
            self.dispatch(M::Message::from(PageEvent::Tick));
        }
    }

    fn process_task_results(&mut self) {
        while let Ok(msg) = self.task_receiver.try_recv() {
            self.dispatch(msg);
        }
    }

    fn next_wakeup(&self) -> Option<Duration> {
        [
            self.timers.next_deadline(),
            self.model.next_deadline(),
            self.events.next_due(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn is_idle(&self) -> bool {
        self.events.is_exhausted() && self.task_handles.is_empty() && self.next_wakeup().is_none()
    }

    fn wait_for_work(&mut self) {
        let now = self.clock.now_mono();
        let wait = self
            .next_wakeup()
            .map_or(self.config.poll_interval, |at| at.saturating_sub(now))
            .min(self.config.poll_interval);
        if let Ok(msg) = self.task_receiver.recv_timeout(wait) {
            self.dispatch(msg);
        }
    }

    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.exit = Some(ExitReason::Quit),
            Cmd::Batch(cmds) => {
                for c in cmds {
                    self.execute_cmd(c);
                    if self.exit.is_some() {
                        break;
                    }
                }
            }
            Cmd::Msg(m) => {
                let cmd = self.model.update(m);
                self.execute_cmd(cmd);
                self.reconcile();
            }
            Cmd::After(delay, m) => {
                let key = self.next_timer;
                self.next_timer += 1;
                self.timers.schedule(key, self.clock.now_mono() + delay);
                self.delayed.insert(key, m);
            }
            Cmd::Task(spec, f) => {
                tracing::debug!(task = spec.name.as_deref().unwrap_or("<unnamed>"), "spawning task");
                let sender = self.task_sender.clone();
                let handle = std::thread::spawn(move || {
                    let msg = f();
                    let _ = sender.send(msg);
                });
                self.task_handles.push((spec.name, handle));
            }
            Cmd::Navigate(location) => {
                tracing::info!(%location, "navigating");
                self.exit = Some(ExitReason::Navigated(location));
            }
            Cmd::Log(text) => {
                tracing::info!(target: "pagekit::page", "{text}");
                self.logs.push(text);
            }
        }
    }

    fn reap_finished_tasks(&mut self) {
        if self.task_handles.is_empty() {
            return;
        }
        let mut remaining = Vec::with_capacity(self.task_handles.len());
        for (name, handle) in self.task_handles.drain(..) {
            if handle.is_finished() {
                if let Err(payload) = handle.join() {
                    log_task_panic(name.as_deref(), payload.as_ref());
                }
            } else {
                remaining.push((name, handle));
            }
        }
        self.task_handles = remaining;
    }

    fn join_tasks(&mut self) {
        for (name, handle) in self.task_handles.drain(..) {
            if let Err(payload) = handle.join() {
                log_task_panic(name.as_deref(), payload.as_ref());
            }
        }
    }
}

/// Text of a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

fn log_task_panic(name: Option<&str>, payload: &(dyn std::any::Any + Send)) {
    let msg = panic_message(payload);
    tracing::error!(task = name.unwrap_or("<unnamed>"), "spawned task panicked: {msg}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekit_core::{EventKind, Listen, Target};

    #[derive(Debug, PartialEq)]
    enum Msg {
        Event(PageEvent),
        Loaded(u32),
        Later,
    }

    impl From<PageEvent> for Msg {
        fn from(event: PageEvent) -> Self {
            Self::Event(event)
        }
    }

    #[derive(Default)]
    struct Loader {
        loaded: Vec<u32>,
        later: usize,
    }

    impl Model for Loader {
        type Message = Msg;

        fn init(&mut self) -> Cmd<Msg> {
            Cmd::batch(vec![
                Cmd::task_named("load", || Msg::Loaded(7)),
                Cmd::after(Duration::from_millis(5), Msg::Later),
            ])
        }

        fn update(&mut self, msg: Msg) -> Cmd<Msg> {
            match msg {
                Msg::Loaded(n) => self.loaded.push(n),
                Msg::Later => self.later += 1,
                Msg::Event(PageEvent::Submit { .. }) => return Cmd::navigate("done.html"),
                Msg::Event(_) => {}
            }
            Cmd::none()
        }

        fn listeners(&self) -> Vec<Listen> {
            vec![Listen::new(Target::Form("f".into()), EventKind::Submit)]
        }
    }

    #[test]
    fn batch_collapses_trivial_lists() {
        assert!(Cmd::<Msg>::batch(vec![]).is_none());
        assert!(Cmd::batch(vec![Cmd::none(), Cmd::msg(Msg::Later)]).type_name() == "Msg");
        assert_eq!(
            Cmd::batch(vec![Cmd::msg(Msg::Later), Cmd::quit()]).type_name(),
            "Batch"
        );
    }

    #[test]
    fn map_wraps_task_results() {
        let cmd: Cmd<Msg> = Cmd::task(|| 3u32).map(Msg::Loaded);
        match cmd {
            Cmd::Task(_, f) => assert_eq!(f(), Msg::Loaded(3)),
            other => panic!("expected task, got {other:?}"),
        }
    }

    #[test]
    fn program_runs_tasks_and_timers_until_idle() {
        let outcome = Program::new(Loader::default(), ScriptedEvents::new())
            .config(ProgramConfig::default().max_runtime(Duration::from_secs(5)))
            .run()
            .expect("program finishes");
        assert_eq!(outcome.exit, ExitReason::Idle);
        assert_eq!(outcome.model.loaded, vec![7]);
        assert_eq!(outcome.model.later, 1);
    }

    #[test]
    fn program_stops_on_navigation() {
        let events = ScriptedEvents::new().at(Duration::ZERO, PageEvent::Submit { form: "f".into() });
        let outcome = Program::new(Loader::default(), events)
            .config(ProgramConfig::default().max_runtime(Duration::from_secs(5)))
            .run()
            .expect("program finishes");
        assert_eq!(outcome.exit, ExitReason::Navigated("done.html".into()));
    }

    /// Declares one listener per opened form and records every declaration.
    #[derive(Default)]
    struct Opener {
        open: usize,
        declared: std::cell::RefCell<Vec<usize>>,
    }

    impl Model for Opener {
        type Message = Msg;

        fn init(&mut self) -> Cmd<Msg> {
            Cmd::batch(vec![Cmd::msg(Msg::Later), Cmd::msg(Msg::Later)])
        }

        fn update(&mut self, msg: Msg) -> Cmd<Msg> {
            if msg == Msg::Later {
                self.open += 1;
            }
            Cmd::none()
        }

        fn listeners(&self) -> Vec<Listen> {
            self.declared.borrow_mut().push(self.open);
            (0..self.open)
                .map(|i| Listen::new(Target::Form(format!("f{i}").as_str().into()), EventKind::Submit))
                .collect()
        }
    }

    #[test]
    fn nested_messages_reconcile_listeners_after_each_update() {
        let outcome = Program::new(Opener::default(), ScriptedEvents::new())
            .config(ProgramConfig::default().max_runtime(Duration::from_secs(5)))
            .run()
            .expect("program finishes");
        assert_eq!(outcome.exit, ExitReason::Idle);
        assert_eq!(*outcome.model.declared.borrow(), vec![1, 2, 2]);
    }

    #[test]
    fn panic_message_reads_common_payloads() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn std::any::Any + Send> = Box::new(3u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
