#![forbid(unsafe_code)]

//! Deterministic page simulator for testing.
//!
//! `PageSimulator` runs a [`Model`] against a [`ManualClock`]. Nothing
//! happens until the test injects an event or advances time, so every
//! interleaving of user input, timers and task completions can be
//! reproduced exactly.
//!
//! # Example
//!
//! ```ignore
//! let clock = ManualClock::new();
//! let mut sim = PageSimulator::new(page, clock.clone());
//! sim.init();
//! sim.inject(PageEvent::Submit { form: "contact".into() });
//! sim.settle_next_task();
//! sim.advance(Duration::from_millis(1000));
//! assert_eq!(sim.navigations(), ["thank_you.html"]);
//! ```
//!
//! # Invariants
//!
//! 1. `advance(dt)` visits every timer and model deadline inside the window
//!    in time order, with the clock set to that exact instant.
//! 2. Deferred tasks complete only when the test settles them, in spawn
//!    order unless settled by name.
//! 3. Events without an attached listener are recorded and dropped.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use pagekit_core::{Clock, ManualClock, PageEvent, TimerQueue};

use crate::listener::ListenerSet;
use crate::program::{Cmd, Model, TaskSpec};

/// Record of a command executed during simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmdRecord {
    None,
    Quit,
    Msg,
    Batch(usize),
    After(Duration),
    Task(Option<String>),
    Navigate(String),
    Log(String),
}

/// When simulated tasks complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskPolicy {
    /// Run the closure as soon as the command executes.
    #[default]
    Immediate,
    /// Queue the closure until the test settles it.
    Deferred,
}

struct PendingTask<Msg> {
    spec: TaskSpec,
    run: Box<dyn FnOnce() -> Msg + Send>,
}

/// Same-instant ticks tolerated before `advance` moves on.
const MAX_TICKS_PER_INSTANT: usize = 64;

/// Deterministic simulator for [`Model`] testing.
pub struct PageSimulator<M: Model> {
    model: M,
    clock: ManualClock,
    listeners: ListenerSet,
    timers: TimerQueue<u64>,
    delayed: HashMap<u64, M::Message>,
    next_timer: u64,
    task_policy: TaskPolicy,
    pending: VecDeque<PendingTask<M::Message>>,
    command_log: Vec<CmdRecord>,
    logs: Vec<String>,
    navigations: Vec<String>,
    dropped: Vec<PageEvent>,
    running: bool,
}

impl<M: Model> PageSimulator<M> {
    /// Create a simulator. `clock` must be the clock the model's components read.
    pub fn new(model: M, clock: ManualClock) -> Self {
        Self {
            model,
            clock,
            listeners: ListenerSet::new(),
            timers: TimerQueue::new(),
            delayed: HashMap::new(),
            next_timer: 0,
            task_policy: TaskPolicy::default(),
            pending: VecDeque::new(),
            command_log: Vec::new(),
            logs: Vec::new(),
            navigations: Vec::new(),
            dropped: Vec::new(),
            running: true,
        }
    }

    /// Choose when tasks complete.
    #[must_use]
    pub fn with_task_policy(mut self, policy: TaskPolicy) -> Self {
        self.task_policy = policy;
        self
    }

    /// Run `Model::init` and attach the initial listeners.
    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.execute_cmd(cmd);
        self.reconcile();
    }

    /// Deliver a host event.
    ///
    /// Returns `false` if no listener was attached for it (or the page has
    /// stopped) and the event was dropped.
    pub fn inject(&mut self, event: PageEvent) -> bool {
        if !self.running || !self.listeners.accepts(&event) {
            tracing::debug!(event = event.name(), "simulated event dropped");
            self.dropped.push(event);
            return false;
        }
        self.dispatch(M::Message::from(event));
        true
    }

    /// Deliver several host events in order.
    pub fn inject_all(&mut self, events: impl IntoIterator<Item = PageEvent>) {
        for event in events {
            self.inject(event);
        }
    }

    /// Send a message directly to the model.
    pub fn send(&mut self, msg: M::Message) {
        self.dispatch(msg);
    }

    /// Move time forward by `dt`, firing everything due along the way.
    pub fn advance(&mut self, dt: Duration) {
        let target = self.now() + dt;
        self.advance_to(target);
    }

    /// Move time forward to `target`, firing everything due along the way.
    pub fn advance_to(&mut self, target: Duration) {
        let mut last_instant = None;
        let mut ticks_at_instant = 0;
        while self.running {
            let Some(next) = self.next_wakeup().filter(|at| *at <= target) else {
                break;
            };
            let at = next.max(self.now());
            if last_instant == Some(at) {
                ticks_at_instant += 1;
                if ticks_at_instant >= MAX_TICKS_PER_INSTANT {
                    tracing::warn!(at_ms = at.as_millis() as u64, "deadline did not advance");
                    break;
                }
            } else {
                last_instant = Some(at);
                ticks_at_instant = 0;
            }
            self.clock.set(at);
            self.fire_due();
        }
        self.clock.set(target);
        if self.running {
            self.fire_due();
        }
    }

    /// Complete the oldest deferred task. Returns `false` if none was pending.
    pub fn settle_next_task(&mut self) -> bool {
        let Some(task) = self.pending.pop_front() else {
            return false;
        };
        self.complete(task);
        true
    }

    /// Complete the oldest deferred task with the given name.
    pub fn settle_task_named(&mut self, name: &str) -> bool {
        let Some(index) = self
            .pending
            .iter()
            .position(|t| t.spec.name.as_deref() == Some(name))
        else {
            return false;
        };
        match self.pending.remove(index) {
            Some(task) => {
                self.complete(task);
                true
            }
            None => false,
        }
    }

    /// Complete deferred tasks until none remain, including tasks spawned
    /// while settling.
    pub fn settle_all_tasks(&mut self) -> usize {
        let mut settled = 0;
        while self.settle_next_task() {
            settled += 1;
        }
        settled
    }

    /// Number of deferred tasks waiting to be settled.
    pub fn pending_tasks(&self) -> usize {
        self.pending.len()
    }

    /// Names of deferred tasks in spawn order.
    pub fn pending_task_names(&self) -> Vec<Option<&str>> {
        self.pending.iter().map(|t| t.spec.name.as_deref()).collect()
    }

    pub fn now(&self) -> Duration {
        self.clock.now_mono()
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Whether the page is still live. `false` after `Quit` or `Navigate`.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Every location passed to `Cmd::Navigate`.
    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    /// Log lines emitted via `Cmd::Log`.
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn command_log(&self) -> &[CmdRecord] {
        &self.command_log
    }

    /// Events dropped for lack of a listener.
    pub fn dropped_events(&self) -> &[PageEvent] {
        &self.dropped
    }

    /// Currently attached listeners.
    pub fn listeners(&self) -> &ListenerSet {
        &self.listeners
    }

    /// Number of `Cmd::After` messages not yet delivered.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    // -----------------------------------------------------------------------

    fn next_wakeup(&self) -> Option<Duration> {
        match (self.timers.next_deadline(), self.model.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn fire_due(&mut self) {
        let now = self.now();
        for key in self.timers.pop_due(now) {
            if let Some(msg) = self.delayed.remove(&key) {
                self.dispatch(msg);
            }
        }
        if self.running && self.model.next_deadline().is_some_and(|d| d <= now) {
            self.dispatch(M::Message::from(PageEvent::Tick));
        }
    }

    fn complete(&mut self, task: PendingTask<M::Message>) {
        tracing::debug!(task = task.spec.name.as_deref().unwrap_or("<unnamed>"), "settling task");
        let msg = (task.run)();
        self.dispatch(msg);
    }

    fn dispatch(&mut self, msg: M::Message) {
        if !self.running {
            return;
        }
        let cmd = self.model.update(msg);
        self.execute_cmd(cmd);
        self.reconcile();
    }

    fn reconcile(&mut self) {
        let declared = self.model.listeners();
        self.listeners.reconcile(declared);
    }

    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => self.command_log.push(CmdRecord::None),
            Cmd::Quit => {
                self.running = false;
                self.command_log.push(CmdRecord::Quit);
            }
            Cmd::Msg(m) => {
                self.command_log.push(CmdRecord::Msg);
                let cmd = self.model.update(m);
                self.execute_cmd(cmd);
                self.reconcile();
            }
            Cmd::Batch(cmds) => {
                self.command_log.push(CmdRecord::Batch(cmds.len()));
                for c in cmds {
                    self.execute_cmd(c);
                    if !self.running {
                        break;
                    }
                }
            }
            Cmd::After(delay, m) => {
                self.command_log.push(CmdRecord::After(delay));
                let key = self.next_timer;
                self.next_timer += 1;
                self.timers.schedule(key, self.now() + delay);
                self.delayed.insert(key, m);
            }
            Cmd::Task(spec, run) => {
                self.command_log.push(CmdRecord::Task(spec.name.clone()));
                let task = PendingTask { spec, run };
                match self.task_policy {
                    TaskPolicy::Immediate => self.complete(task),
                    TaskPolicy::Deferred => self.pending.push_back(task),
                }
            }
            Cmd::Navigate(location) => {
                self.command_log.push(CmdRecord::Navigate(location.clone()));
                self.navigations.push(location);
                self.running = false;
            }
            Cmd::Log(text) => {
                self.command_log.push(CmdRecord::Log(text.clone()));
                self.logs.push(text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekit_core::{EventKind, Listen, Target};

    #[derive(Debug)]
    enum Msg {
        Event(PageEvent),
        Fetched(&'static str),
        Redirect,
    }

    impl From<PageEvent> for Msg {
        fn from(event: PageEvent) -> Self {
            Self::Event(event)
        }
    }

    struct Page {
        clock: ManualClock,
        deadline: Option<Duration>,
        ticks: Vec<Duration>,
        fetched: Vec<&'static str>,
        listening: bool,
    }

    impl Page {
        fn new(clock: ManualClock) -> Self {
            Self {
                clock,
                deadline: Some(Duration::from_millis(300)),
                ticks: Vec::new(),
                fetched: Vec::new(),
                listening: true,
            }
        }
    }

    impl Model for Page {
        type Message = Msg;

        fn update(&mut self, msg: Msg) -> Cmd<Msg> {
            match msg {
                Msg::Event(PageEvent::Tick) => {
                    let now = self.clock.now_mono();
                    self.ticks.push(now);
                    self.deadline = (now < Duration::from_millis(900))
                        .then(|| now + Duration::from_millis(300));
                    Cmd::none()
                }
                Msg::Event(PageEvent::Submit { .. }) => {
                    self.listening = false;
                    Cmd::batch(vec![
                        Cmd::task_named("first", || Msg::Fetched("first")),
                        Cmd::task_named("second", || Msg::Fetched("second")),
                    ])
                }
                Msg::Event(_) => Cmd::none(),
                Msg::Fetched(what) => {
                    self.fetched.push(what);
                    Cmd::after(Duration::from_millis(1000), Msg::Redirect)
                }
                Msg::Redirect => Cmd::navigate("thank_you.html"),
            }
        }

        fn listeners(&self) -> Vec<Listen> {
            if self.listening {
                vec![Listen::new(Target::Form("f".into()), EventKind::Submit)]
            } else {
                vec![]
            }
        }

        fn next_deadline(&self) -> Option<Duration> {
            self.deadline
        }
    }

    fn submit() -> PageEvent {
        PageEvent::Submit { form: "f".into() }
    }

    #[test]
    fn advance_ticks_at_exact_deadlines() {
        let clock = ManualClock::new();
        let mut sim = PageSimulator::new(Page::new(clock.clone()), clock);
        sim.init();
        sim.advance(Duration::from_millis(1000));
        assert_eq!(
            sim.model().ticks,
            [300, 600, 900].map(Duration::from_millis).to_vec()
        );
        assert_eq!(sim.now(), Duration::from_millis(1000));
    }

    #[test]
    fn deferred_tasks_wait_for_settlement() {
        let clock = ManualClock::new();
        let mut sim = PageSimulator::new(Page::new(clock.clone()), clock)
            .with_task_policy(TaskPolicy::Deferred);
        sim.init();
        assert!(sim.inject(submit()));
        assert_eq!(sim.pending_tasks(), 2);
        assert_eq!(sim.pending_task_names(), vec![Some("first"), Some("second")]);

        assert!(sim.settle_task_named("second"));
        assert_eq!(sim.model().fetched, vec!["second"]);
        assert_eq!(sim.settle_all_tasks(), 1);
        assert_eq!(sim.model().fetched, vec!["second", "first"]);
        assert!(!sim.settle_next_task());
    }

    #[test]
    fn undeclared_listener_drops_event() {
        let clock = ManualClock::new();
        let mut sim = PageSimulator::new(Page::new(clock.clone()), clock)
            .with_task_policy(TaskPolicy::Deferred);
        sim.init();
        assert!(sim.inject(submit()));
        assert!(!sim.inject(submit()));
        assert_eq!(sim.dropped_events(), &[submit()]);
        assert_eq!(sim.pending_tasks(), 2);
    }

    #[test]
    fn navigation_stops_the_page() {
        let clock = ManualClock::new();
        let mut sim = PageSimulator::new(Page::new(clock.clone()), clock);
        sim.init();
        sim.inject(submit());
        assert_eq!(sim.pending_timers(), 2);
        sim.advance(Duration::from_millis(999));
        assert!(sim.navigations().is_empty());
        sim.advance(Duration::from_millis(1));
        assert_eq!(sim.navigations(), ["thank_you.html".to_string()]);
        assert!(!sim.is_running());
        assert!(sim.command_log().contains(&CmdRecord::Task(Some("first".into()))));
    }

    #[derive(Debug)]
    enum Step {
        Event(PageEvent),
        OpenOne,
        OpenTwo,
    }

    impl From<PageEvent> for Step {
        fn from(event: PageEvent) -> Self {
            Self::Event(event)
        }
    }

    #[derive(Default)]
    struct Forms {
        open: usize,
        declared: std::cell::RefCell<Vec<usize>>,
    }

    impl Model for Forms {
        type Message = Step;

        fn update(&mut self, msg: Step) -> Cmd<Step> {
            match msg {
                Step::OpenTwo => Cmd::batch(vec![Cmd::msg(Step::OpenOne), Cmd::msg(Step::OpenOne)]),
                Step::OpenOne => {
                    self.open += 1;
                    Cmd::none()
                }
                Step::Event(_) => Cmd::none(),
            }
        }

        fn listeners(&self) -> Vec<Listen> {
            self.declared.borrow_mut().push(self.open);
            (0..self.open)
                .map(|i| Listen::new(Target::Form(format!("f{i}").as_str().into()), EventKind::Submit))
                .collect()
        }
    }

    #[test]
    fn nested_messages_reconcile_after_each_update() {
        let mut sim = PageSimulator::new(Forms::default(), ManualClock::new());
        sim.init();
        sim.send(Step::OpenTwo);
        assert_eq!(*sim.model().declared.borrow(), vec![0, 1, 2, 2]);
        assert_eq!(sim.listeners().len(), 2);
        assert!(sim.inject(PageEvent::Submit { form: "f1".into() }));
    }
}
