//! Notification cooldown.

use std::time::Duration;

use tokio::time::Instant;

/// Minimum spacing between outbound notifications.
///
/// One clock is shared by low and restored alerts. The gate never updates
/// itself: the caller decides to send, then calls [`record`](Self::record).
/// The monitor records on every send attempt, so a failing backend is
/// retried at most once per cooldown window.
#[derive(Debug, Clone, Default)]
pub struct CooldownGate {
    last_notified: Option<Instant>,
}

impl CooldownGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a notification may be sent at `now`.
    pub fn permit(&self, now: Instant, cooldown: Duration) -> bool {
        match self.last_notified {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= cooldown,
        }
    }

    /// Mark a notification as attempted at `now`.
    pub fn record(&mut self, now: Instant) {
        self.last_notified = Some(now);
    }

    pub fn last_notified(&self) -> Option<Instant> {
        self.last_notified
    }

    /// Time left until the gate opens again, zero if it is open.
    pub fn remaining(&self, now: Instant, cooldown: Duration) -> Duration {
        self.last_notified
            .map(|last| cooldown.saturating_sub(now.saturating_duration_since(last)))
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(30 * 60);

    #[test]
    fn open_when_never_notified() {
        let gate = CooldownGate::new();
        assert!(gate.permit(Instant::now(), COOLDOWN));
        assert!(gate.last_notified().is_none());
    }

    #[test]
    fn closed_inside_window() {
        let t0 = Instant::now();
        let mut gate = CooldownGate::new();
        gate.record(t0);

        assert!(!gate.permit(t0, COOLDOWN));
        assert!(!gate.permit(t0 + Duration::from_secs(29 * 60), COOLDOWN));
        assert_eq!(
            gate.remaining(t0 + Duration::from_secs(29 * 60), COOLDOWN),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn opens_exactly_at_cooldown() {
        let t0 = Instant::now();
        let mut gate = CooldownGate::new();
        gate.record(t0);

        assert!(gate.permit(t0 + COOLDOWN, COOLDOWN));
        assert_eq!(gate.remaining(t0 + COOLDOWN, COOLDOWN), Duration::ZERO);
    }

    #[test]
    fn permit_does_not_mutate() {
        let t0 = Instant::now();
        let gate = CooldownGate::new();
        for _ in 0..3 {
            assert!(gate.permit(t0, COOLDOWN));
        }
        assert!(gate.last_notified().is_none());
    }

    #[test]
    fn zero_cooldown_always_permits() {
        let t0 = Instant::now();
        let mut gate = CooldownGate::new();
        gate.record(t0);
        assert!(gate.permit(t0, Duration::ZERO));
    }

    #[test]
    fn record_moves_the_window() {
        let t0 = Instant::now();
        let mut gate = CooldownGate::new();
        gate.record(t0);
        gate.record(t0 + COOLDOWN);

        assert!(!gate.permit(t0 + COOLDOWN + Duration::from_secs(1), COOLDOWN));
        assert_eq!(gate.last_notified(), Some(t0 + COOLDOWN));
    }
}
