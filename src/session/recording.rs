use std::time::{Duration, Instant};

/// Tracks whether audio capture is live and when it must be forced to stop.
#[derive(Debug)]
pub struct RecordingGate {
    limit: Duration,
    started_at: Option<Instant>,
}

impl RecordingGate {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            started_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    /// Returns false if a recording is already running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        self.started_at = Some(now);
        true
    }

    /// Returns false if nothing was recording.
    pub fn stop(&mut self) -> bool {
        self.started_at.take().is_some()
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.started_at
            .is_some_and(|start| now.saturating_duration_since(start) >= self.limit)
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.started_at
            .map(|start| self.limit.saturating_sub(now.saturating_duration_since(start)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stop() {
        let mut gate = RecordingGate::new(Duration::from_secs(3));
        let now = Instant::now();
        assert!(gate.start(now));
        assert!(!gate.start(now));
        assert!(gate.is_active());
        assert!(gate.stop());
        assert!(!gate.stop());
    }

    #[test]
    fn test_expiry() {
        let mut gate = RecordingGate::new(Duration::from_secs(3));
        let now = Instant::now();
        gate.start(now);
        assert!(!gate.is_expired(now + Duration::from_millis(2999)));
        assert!(gate.is_expired(now + Duration::from_secs(3)));
        assert_eq!(
            gate.remaining(now + Duration::from_secs(1)),
            Some(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_idle_gate_never_expires() {
        let gate = RecordingGate::new(Duration::ZERO);
        assert!(!gate.is_expired(Instant::now()));
        assert_eq!(gate.remaining(Instant::now()), None);
    }
}
