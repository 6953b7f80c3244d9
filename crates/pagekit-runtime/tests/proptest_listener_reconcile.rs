//! Property-based tests for listener reconciliation and timer delivery.
//!
//! 1. After a reconcile the attached set equals the declared set.
//! 2. The diff accounts for exactly the keys that changed.
//! 3. `Cmd::After` messages arrive in deadline order regardless of the
//!    order they were scheduled in.

use std::collections::BTreeSet;
use std::time::Duration;

use pagekit_core::{EventKind, FormId, Listen, ManualClock, PageEvent, Target};
use pagekit_runtime::{Cmd, ListenerSet, Model, PageSimulator};
use proptest::prelude::*;

fn listen_strategy() -> impl Strategy<Value = Listen> {
    (0u8..6, 0u8..4).prop_map(|(form, kind)| {
        let kind = match kind {
            0 => EventKind::Blur,
            1 => EventKind::Input,
            2 => EventKind::Submit,
            _ => EventKind::Click,
        };
        Listen::new(
            Target::Field(FormId::new(format!("form-{form}")), "field".into()),
            kind,
        )
    })
}

proptest! {
    #[test]
    fn reconcile_matches_declaration(
        rounds in prop::collection::vec(prop::collection::vec(listen_strategy(), 0..10), 1..8)
    ) {
        let mut set = ListenerSet::new();
        let mut previous: BTreeSet<Listen> = BTreeSet::new();
        for declared in rounds {
            let wanted: BTreeSet<Listen> = declared.iter().cloned().collect();
            let diff = set.reconcile(declared);

            let attached: BTreeSet<Listen> = diff.attached.into_iter().collect();
            let detached: BTreeSet<Listen> = diff.detached.into_iter().collect();
            let added: BTreeSet<Listen> = wanted.difference(&previous).cloned().collect();
            let removed: BTreeSet<Listen> = previous.difference(&wanted).cloned().collect();
            prop_assert_eq!(&attached, &added);
            prop_assert_eq!(&detached, &removed);

            let active: BTreeSet<Listen> = set.iter().cloned().collect();
            prop_assert_eq!(&active, &wanted);
            previous = wanted;
        }
    }
}

// ── Delayed delivery ────────────────────────────────────────────────────

enum Msg {
    Event,
    Schedule(Vec<u64>),
    Fired(u64),
}

impl From<PageEvent> for Msg {
    fn from(_: PageEvent) -> Self {
        Self::Event
    }
}

#[derive(Default)]
struct Recorder {
    fired: Vec<u64>,
}

impl Model for Recorder {
    type Message = Msg;

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::Event => Cmd::none(),
            Msg::Schedule(delays) => Cmd::batch(
                delays
                    .into_iter()
                    .map(|ms| Cmd::after(Duration::from_millis(ms), Msg::Fired(ms)))
                    .collect(),
            ),
            Msg::Fired(ms) => {
                self.fired.push(ms);
                Cmd::none()
            }
        }
    }
}

proptest! {
    #[test]
    fn delayed_messages_arrive_in_deadline_order(delays in prop::collection::vec(0u64..5_000, 0..30)) {
        let clock = ManualClock::new();
        let mut sim = PageSimulator::new(Recorder::default(), clock);
        sim.init();
        sim.send(Msg::Schedule(delays.clone()));
        sim.advance(Duration::from_millis(5_000));

        let mut expected = delays;
        expected.sort_unstable();
        prop_assert_eq!(&sim.model().fired, &expected);
        prop_assert_eq!(sim.pending_timers(), 0);
    }
}
