//! Deterministic session doubles: a scripted interaction port and a store
//! that fails on demand. Compiled for tests and behind the `test-support`
//! feature so downstream crates can drive full sessions headlessly.

use std::collections::VecDeque;
use std::time::Duration;

use cogbat_core::{
    ArrowDirection, EngineError, InputEvent, InputFilter, InstrumentId, InteractionPort,
    MemoryStore, MetricsRecord, ParticipantId, Point, PortEvent, ResultStore, SaveRequest,
    StimulusView,
};
use cogbat_timing::VirtualTimer;

/// Interaction port that replays a fixed event script. Scripted inputs the
/// current filter rejects are dropped, a drained script reads as the
/// participant walking away, and deadlines are never synthesized: script a
/// `PortEvent::Elapsed` where the test needs one. Every presented view is
/// kept for assertions.
pub struct ScriptedPort {
    events: VecDeque<PortEvent>,
    clock: Option<(VirtualTimer, Duration)>,
    pub views: Vec<StimulusView>,
}

impl ScriptedPort {
    pub fn new<E>(events: E) -> Self
    where
        E: IntoIterator<Item = PortEvent>,
    {
        ScriptedPort {
            events: events.into_iter().collect(),
            clock: None,
            views: Vec::new(),
        }
    }

    /// Couples the port to a virtual clock: every wait advances the clock by
    /// `latency` before its event is delivered, so reaction times come out
    /// exact.
    pub fn with_latency<E>(events: E, clock: VirtualTimer, latency: Duration) -> Self
    where
        E: IntoIterator<Item = PortEvent>,
    {
        ScriptedPort {
            events: events.into_iter().collect(),
            clock: Some((clock, latency)),
            views: Vec::new(),
        }
    }

    pub fn remaining_events(&self) -> usize {
        self.events.len()
    }
}

impl InteractionPort for ScriptedPort {
    fn present(&mut self, view: StimulusView) {
        self.views.push(view);
    }

    fn await_input(&mut self, filter: InputFilter, _deadline: Option<Duration>) -> PortEvent {
        if let Some((clock, latency)) = &self.clock {
            clock.advance(*latency);
        }
        while let Some(event) = self.events.pop_front() {
            match &event {
                PortEvent::Input(input) if !filter.accepts(input) => continue,
                _ => return event,
            }
        }
        PortEvent::Abandoned
    }
}

pub fn click(x: f32, y: f32) -> PortEvent {
    click_at(Point::new(x, y))
}

pub fn click_at(point: Point) -> PortEvent {
    PortEvent::Input(InputEvent::Click { point })
}

pub fn arrow(direction: ArrowDirection) -> PortEvent {
    PortEvent::Input(InputEvent::Arrow { direction })
}

pub fn connect(from: u8, to: u8) -> PortEvent {
    PortEvent::Input(InputEvent::Connect { from, to })
}

pub fn end_design() -> PortEvent {
    PortEvent::Input(InputEvent::EndDesign)
}

pub fn retry() -> PortEvent {
    PortEvent::Input(InputEvent::Retry)
}

/// Store that rejects the first `failures` saves, then delegates to an
/// in-memory store.
pub struct FailingStore {
    inner: MemoryStore,
    failures: u32,
    pub attempts: u32,
}

impl FailingStore {
    pub fn failing(failures: u32) -> Self {
        FailingStore {
            inner: MemoryStore::new(),
            failures,
            attempts: 0,
        }
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

impl ResultStore for FailingStore {
    fn save(&mut self, request: &SaveRequest) -> Result<(), EngineError> {
        self.attempts += 1;
        if self.attempts <= self.failures {
            return Err(EngineError::PersistenceFailure(
                "simulated store outage".to_string(),
            ));
        }
        self.inner.save(request)
    }

    fn previous_result(
        &self,
        participant: &ParticipantId,
        instrument: InstrumentId,
    ) -> Option<MetricsRecord> {
        self.inner.previous_result(participant, instrument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogbat_timing::Timer;

    #[test]
    fn scripted_port_skips_events_the_filter_rejects() {
        let mut port = ScriptedPort::new([click(1.0, 2.0), arrow(ArrowDirection::Left)]);
        let event = port.await_input(InputFilter::Arrows, None);
        assert_eq!(
            event,
            PortEvent::Input(InputEvent::Arrow {
                direction: ArrowDirection::Left
            })
        );
        assert_eq!(port.remaining_events(), 0);
    }

    #[test]
    fn a_drained_script_reads_as_abandonment() {
        let mut port = ScriptedPort::new([]);
        assert_eq!(port.await_input(InputFilter::Clicks, None), PortEvent::Abandoned);
    }

    #[test]
    fn latency_coupling_advances_the_clock_per_wait() {
        let clock = VirtualTimer::new();
        let mut port = ScriptedPort::with_latency(
            [retry(), retry()],
            clock.clone(),
            Duration::from_millis(250),
        );
        let started = clock.now();
        port.await_input(InputFilter::Retry, None);
        port.await_input(InputFilter::Retry, None);
        assert_eq!(clock.elapsed(started), Duration::from_millis(500));
    }
}
