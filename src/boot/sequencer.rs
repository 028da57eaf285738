//! Boot sequencer state machine

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

use super::BootScript;

/// Where the sequence currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    Idle,
    /// Line `i` is on screen, waiting for its delay to elapse
    Playing(usize),
    Complete,
}

/// What the view should do after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootEvent {
    /// Display line `i` of the script
    Show(usize),
    /// Hide the boot screen and reveal the page
    Reveal,
}

/// Identifies one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Scheduling capability the sequencer drives
pub trait Timer {
    /// Arrange for `handle` to be fired after `delay`
    fn schedule(&mut self, delay: Duration) -> TimerHandle;

    /// Make sure `handle` never fires
    fn cancel(&mut self, handle: TimerHandle);
}

/// Plays a [`BootScript`] one line at a time.
///
/// At most one timer is pending at any moment. Only that handle is honoured
/// by [`fire`](Self::fire); anything else is stale and ignored. Unmounting (or
/// dropping) the sequencer cancels the pending timer.
pub struct BootSequencer<T: Timer> {
    script: BootScript,
    timer: T,
    state: BootState,
    pending: Option<TimerHandle>,
    rng: StdRng,
}

impl<T: Timer> BootSequencer<T> {
    pub fn new(script: BootScript, timer: T) -> Self {
        Self::with_rng(script, timer, StdRng::from_entropy())
    }

    /// Sequencer with reproducible random delays
    pub fn with_seed(script: BootScript, timer: T, seed: u64) -> Self {
        Self::with_rng(script, timer, StdRng::seed_from_u64(seed))
    }

    fn with_rng(script: BootScript, timer: T, rng: StdRng) -> Self {
        Self {
            script,
            timer,
            state: BootState::Idle,
            pending: None,
            rng,
        }
    }

    pub fn state(&self) -> BootState {
        self.state
    }

    pub fn script(&self) -> &BootScript {
        &self.script
    }

    /// The single timer currently awaited, if any
    pub fn pending(&self) -> Option<TimerHandle> {
        self.pending
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Start playing. Does nothing unless the sequencer is idle.
    pub fn mount(&mut self) -> Option<BootEvent> {
        if self.state != BootState::Idle {
            return None;
        }
        if self.script.lines.is_empty() {
            self.state = BootState::Complete;
            return Some(BootEvent::Reveal);
        }
        Some(self.enter(0))
    }

    /// A timer elapsed
    pub fn fire(&mut self, handle: TimerHandle) -> Option<BootEvent> {
        if self.pending != Some(handle) {
            tracing::trace!("Ignoring stale boot timer {:?}", handle);
            return None;
        }
        self.pending = None;

        match self.state {
            BootState::Playing(i) if i + 1 < self.script.lines.len() => Some(self.enter(i + 1)),
            BootState::Playing(_) => {
                self.state = BootState::Complete;
                Some(BootEvent::Reveal)
            }
            BootState::Idle | BootState::Complete => None,
        }
    }

    /// Tear down: cancel the pending timer and return to idle
    pub fn unmount(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.timer.cancel(handle);
        }
        self.state = BootState::Idle;
    }

    fn enter(&mut self, index: usize) -> BootEvent {
        self.state = BootState::Playing(index);
        let delay = self.script.delay_for(index, &mut self.rng);
        self.pending = Some(self.timer.schedule(delay));
        BootEvent::Show(index)
    }
}

impl<T: Timer> Drop for BootSequencer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.timer.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boot::{BootLine, Delay};
    use std::collections::BTreeMap;

    /// Timer driven by hand: tracks what is scheduled and what was cancelled
    #[derive(Default)]
    struct ManualTimer {
        next: u64,
        scheduled: BTreeMap<u64, Duration>,
        cancelled: Vec<TimerHandle>,
    }

    impl Timer for ManualTimer {
        fn schedule(&mut self, delay: Duration) -> TimerHandle {
            self.next += 1;
            self.scheduled.insert(self.next, delay);
            TimerHandle(self.next)
        }

        fn cancel(&mut self, handle: TimerHandle) {
            self.scheduled.remove(&handle.0);
            self.cancelled.push(handle);
        }
    }

    impl ManualTimer {
        /// Remove and return the only scheduled timer
        fn elapse(&mut self) -> TimerHandle {
            assert_eq!(self.scheduled.len(), 1, "exactly one timer must be pending");
            let id = *self.scheduled.keys().next().unwrap();
            self.scheduled.remove(&id);
            TimerHandle(id)
        }
    }

    fn script(n: usize) -> BootScript {
        BootScript {
            enabled: true,
            delay: Delay::Random {
                min_ms: 10,
                max_ms: 30,
            },
            lines: (0..n).map(|i| BootLine::new(&format!("line {}", i))).collect(),
        }
    }

    #[test]
    fn test_plays_all_lines_then_completes_once() {
        let n = 4;
        let mut seq = BootSequencer::with_seed(script(n), ManualTimer::default(), 42);
        assert_eq!(seq.state(), BootState::Idle);

        let mut events = vec![seq.mount().unwrap()];
        assert_eq!(seq.state(), BootState::Playing(0));

        let mut reveals = 0;
        for _ in 0..n {
            let handle = seq.timer.elapse();
            let event = seq.fire(handle).unwrap();
            if event == BootEvent::Reveal {
                reveals += 1;
            }
            events.push(event);
        }

        assert_eq!(
            events,
            vec![
                BootEvent::Show(0),
                BootEvent::Show(1),
                BootEvent::Show(2),
                BootEvent::Show(3),
                BootEvent::Reveal
            ]
        );
        assert_eq!(reveals, 1);
        assert_eq!(seq.state(), BootState::Complete);
        assert!(seq.pending().is_none());
        assert!(seq.timer().scheduled.is_empty());

        // Nothing brings it back to Playing
        assert_eq!(seq.fire(TimerHandle(1)), None);
        assert_eq!(seq.mount(), None);
        assert_eq!(seq.state(), BootState::Complete);
    }

    #[test]
    fn test_delays_within_bounds() {
        let mut seq = BootSequencer::with_seed(script(3), ManualTimer::default(), 3);
        seq.mount();
        loop {
            let delay = *seq.timer.scheduled.values().next().unwrap();
            assert!(delay >= Duration::from_millis(10) && delay <= Duration::from_millis(30));
            let handle = seq.timer.elapse();
            if seq.fire(handle) == Some(BootEvent::Reveal) {
                break;
            }
        }
    }

    #[test]
    fn test_empty_script_reveals_immediately() {
        let mut seq = BootSequencer::new(script(0), ManualTimer::default());
        assert_eq!(seq.mount(), Some(BootEvent::Reveal));
        assert_eq!(seq.state(), BootState::Complete);
        assert!(seq.timer().scheduled.is_empty());
    }

    #[test]
    fn test_stale_handle_ignored() {
        let mut seq = BootSequencer::new(script(3), ManualTimer::default());
        seq.mount();
        assert_eq!(seq.fire(TimerHandle(999)), None);
        assert_eq!(seq.state(), BootState::Playing(0));
    }

    #[test]
    fn test_unmount_cancels_pending_timer() {
        let mut seq = BootSequencer::new(script(3), ManualTimer::default());
        seq.mount();
        let first = seq.timer.elapse();
        seq.fire(first);
        let pending = seq.pending().unwrap();

        seq.unmount();
        assert_eq!(seq.state(), BootState::Idle);
        assert!(seq.pending().is_none());
        assert_eq!(seq.timer().cancelled, vec![pending]);
        assert!(seq.timer().scheduled.is_empty());

        // A callback that raced the teardown has no effect
        assert_eq!(seq.fire(pending), None);
        assert_eq!(seq.state(), BootState::Idle);

        // And the sequence replays from the top
        assert_eq!(seq.mount(), Some(BootEvent::Show(0)));
    }

    #[test]
    fn test_mount_twice_is_noop() {
        let mut seq = BootSequencer::new(script(2), ManualTimer::default());
        assert_eq!(seq.mount(), Some(BootEvent::Show(0)));
        assert_eq!(seq.mount(), None);
        assert_eq!(seq.timer().scheduled.len(), 1);
    }
}
