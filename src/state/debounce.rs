//! Debounce state machine for the level signal.
//!
//! ```text
//!            low                 low, elapsed >= debounce
//!  Normal ─────────► PendingLow ──────────────────────────► ConfirmedLow
//!    ▲                  │                                       │
//!    │       ok         │                ok (Restored)          │
//!    └──────────────────┴───────────────────────────────────────┘
//! ```
//!
//! A single ok sample while pending resets the timer completely.

use std::time::Duration;

use tokio::time::Instant;

/// A confirmed transition of the level signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The level has read low for at least `debounce`.
    LowConfirmed { debounce: Duration },
    /// A confirmed low episode ended with an ok reading.
    Restored,
}

/// Coarse view of [`MonitorState`] for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Normal,
    PendingLow,
    ConfirmedLow,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Normal => "normal",
            Phase::PendingLow => "pending-low",
            Phase::ConfirmedLow => "confirmed-low",
        }
    }
}

/// Debounced level state.
///
/// Created in [`Phase::Normal`] and updated once per sample with
/// [`transition`](Self::transition).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorState {
    confirmed_low: bool,
    pending_low_since: Option<Instant>,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a low level is currently confirmed.
    pub fn confirmed_low(&self) -> bool {
        self.confirmed_low
    }

    /// When the current low streak started, if one is active.
    ///
    /// Still set while confirmed low; cleared on restore.
    pub fn pending_low_since(&self) -> Option<Instant> {
        self.pending_low_since
    }

    pub fn phase(&self) -> Phase {
        match (self.confirmed_low, self.pending_low_since) {
            (true, _) => Phase::ConfirmedLow,
            (false, Some(_)) => Phase::PendingLow,
            (false, None) => Phase::Normal,
        }
    }

    /// Feed one sample into the machine.
    ///
    /// Returns an event only on a confirmed edge:
    ///
    /// | Phase | sample | Result |
    /// |-------|--------|--------|
    /// | Normal | ok | `None` |
    /// | Normal | low | `None`, timer starts (confirms at once if `debounce` is zero) |
    /// | PendingLow | ok | `None`, timer cleared |
    /// | PendingLow | low | `LowConfirmed` once `now - since >= debounce` |
    /// | ConfirmedLow | low | `None` |
    /// | ConfirmedLow | ok | `Restored` |
    pub fn transition(&mut self, ok: bool, now: Instant, debounce: Duration) -> Option<Event> {
        if ok {
            if self.confirmed_low {
                self.confirmed_low = false;
                self.pending_low_since = None;
                return Some(Event::Restored);
            }
            self.pending_low_since = None;
            return None;
        }

        if self.confirmed_low {
            return None;
        }

        let since = *self.pending_low_since.get_or_insert(now);
        if now.saturating_duration_since(since) >= debounce {
            self.confirmed_low = true;
            Some(Event::LowConfirmed { debounce })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    fn at(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    #[test]
    fn phase_labels() {
        assert_eq!(Phase::Normal.label(), "normal");
        assert_eq!(Phase::PendingLow.label(), "pending-low");
        assert_eq!(Phase::ConfirmedLow.label(), "confirmed-low");
    }

    #[test]
    fn starts_normal() {
        let state = MonitorState::new();
        assert_eq!(state.phase(), Phase::Normal);
        assert!(!state.confirmed_low());
        assert!(state.pending_low_since().is_none());
    }

    #[test]
    fn sustained_low_confirms_when_debounce_reached() {
        let t0 = Instant::now();
        let mut state = MonitorState::new();
        let debounce = 2 * SECOND;

        assert_eq!(state.transition(false, at(t0, 0), debounce), None);
        assert_eq!(state.phase(), Phase::PendingLow);
        assert_eq!(state.transition(false, at(t0, 1), debounce), None);
        assert_eq!(
            state.transition(false, at(t0, 2), debounce),
            Some(Event::LowConfirmed { debounce })
        );
        assert_eq!(state.phase(), Phase::ConfirmedLow);
        // The streak start is kept for the episode.
        assert_eq!(state.pending_low_since(), Some(t0));
    }

    #[test]
    fn blip_then_ok_never_fires() {
        let t0 = Instant::now();
        let mut state = MonitorState::new();
        let debounce = 5 * SECOND;

        assert_eq!(state.transition(false, at(t0, 0), debounce), None);
        assert_eq!(state.transition(true, at(t0, 1), debounce), None);
        assert_eq!(state.phase(), Phase::Normal);
        assert!(state.pending_low_since().is_none());
    }

    #[test]
    fn ok_sample_fully_resets_the_timer() {
        let t0 = Instant::now();
        let mut state = MonitorState::new();
        let debounce = 3 * SECOND;

        state.transition(false, at(t0, 0), debounce);
        state.transition(false, at(t0, 2), debounce);
        state.transition(true, at(t0, 3), debounce);
        // New streak starts at t=4; t=6 is only 2s in.
        assert_eq!(state.transition(false, at(t0, 4), debounce), None);
        assert_eq!(state.pending_low_since(), Some(at(t0, 4)));
        assert_eq!(state.transition(false, at(t0, 6), debounce), None);
        assert_eq!(
            state.transition(false, at(t0, 7), debounce),
            Some(Event::LowConfirmed { debounce })
        );
    }

    #[test]
    fn confirmed_low_fires_once() {
        let t0 = Instant::now();
        let mut state = MonitorState::new();
        let debounce = SECOND;

        state.transition(false, at(t0, 0), debounce);
        assert!(state.transition(false, at(t0, 1), debounce).is_some());
        for s in 2..50 {
            assert_eq!(state.transition(false, at(t0, s), debounce), None);
        }
        assert!(state.confirmed_low());
    }

    #[test]
    fn ok_after_confirmed_low_restores() {
        let t0 = Instant::now();
        let mut state = MonitorState::new();

        assert_eq!(
            state.transition(false, at(t0, 0), Duration::ZERO),
            Some(Event::LowConfirmed {
                debounce: Duration::ZERO
            })
        );
        assert_eq!(state.transition(true, at(t0, 1), Duration::ZERO), Some(Event::Restored));
        assert_eq!(state.phase(), Phase::Normal);
        assert!(state.pending_low_since().is_none());
    }

    #[test]
    fn restored_never_fires_from_normal_or_pending() {
        let t0 = Instant::now();
        let mut state = MonitorState::new();
        let debounce = 10 * SECOND;

        assert_eq!(state.transition(true, at(t0, 0), debounce), None);
        state.transition(false, at(t0, 1), debounce);
        assert_eq!(state.transition(true, at(t0, 2), debounce), None);
    }

    #[test]
    fn zero_debounce_confirms_on_first_low() {
        let t0 = Instant::now();
        let mut state = MonitorState::new();

        let event = state.transition(false, t0, Duration::ZERO);
        assert_eq!(
            event,
            Some(Event::LowConfirmed {
                debounce: Duration::ZERO
            })
        );
        assert_eq!(state.pending_low_since(), Some(t0));
    }

    #[test]
    fn repeated_ok_in_normal_is_a_no_op() {
        let t0 = Instant::now();
        let mut state = MonitorState::new();
        let before = state.clone();

        for s in 0..10 {
            assert_eq!(state.transition(true, at(t0, s), SECOND), None);
            assert_eq!(state, before);
        }
    }

    #[test]
    fn second_episode_confirms_again_after_restore() {
        let t0 = Instant::now();
        let mut state = MonitorState::new();
        let debounce = SECOND;

        state.transition(false, at(t0, 0), debounce);
        assert!(state.transition(false, at(t0, 1), debounce).is_some());
        assert_eq!(state.transition(true, at(t0, 2), debounce), Some(Event::Restored));

        assert_eq!(state.transition(false, at(t0, 3), debounce), None);
        assert!(matches!(
            state.transition(false, at(t0, 4), debounce),
            Some(Event::LowConfirmed { .. })
        ));
    }

    #[test]
    fn clock_going_backwards_does_not_confirm() {
        let t0 = Instant::now() + 10 * SECOND;
        let mut state = MonitorState::new();
        let debounce = SECOND;

        state.transition(false, t0, debounce);
        assert_eq!(state.transition(false, t0 - 5 * SECOND, debounce), None);
    }
}
