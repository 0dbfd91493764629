//! Per-wristband sampling cadence and failure backoff.

use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;
use serde::Deserialize;
use tokio::time::Instant;

/// What to do when the provider cannot produce a position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationErrorPolicy {
    /// Give up on the wristband for this cycle.
    #[default]
    SkipCycle,
    /// Poll again straight away, up to `max_retries` more times.
    RetryImmediate,
    /// Stop polling the wristband for an exponentially growing delay.
    Backoff,
}

impl LocationErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkipCycle => "skip_cycle",
            Self::RetryImmediate => "retry_immediate",
            Self::Backoff => "backoff",
        }
    }
}

/// Whether a wristband should be sampled in the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Due,
    /// Sampled less than one interval ago.
    NotDue,
    /// Waiting out a failure backoff.
    BackingOff,
}

#[derive(Debug, Default)]
struct PaceState {
    last_sampled: Option<Instant>,
    consecutive_failures: u32,
    retry_at: Option<Instant>,
}

/// Sampling state for every monitored wristband.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    states: HashMap<String, PaceState>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            states: HashMap::new(),
        }
    }

    /// Checks `wristband_id` at cycle instant `now`, claiming the slot when due.
    ///
    /// Due once a full interval has passed since the last claimed slot.
    pub fn poll(&mut self, wristband_id: &str, now: Instant) -> Readiness {
        let state = self.states.entry(wristband_id.to_string()).or_default();

        if state.retry_at.is_some_and(|retry_at| now < retry_at) {
            return Readiness::BackingOff;
        }
        if state
            .last_sampled
            .is_some_and(|last| now.saturating_duration_since(last) < self.interval)
        {
            return Readiness::NotDue;
        }

        state.last_sampled = Some(now);
        Readiness::Due
    }

    pub fn record_success(&mut self, wristband_id: &str) {
        if let Some(state) = self.states.get_mut(wristband_id) {
            state.consecutive_failures = 0;
            state.retry_at = None;
        }
    }

    /// Counts a failure and returns the number of consecutive failures.
    pub fn record_failure(&mut self, wristband_id: &str) -> u32 {
        let state = self.states.entry(wristband_id.to_string()).or_default();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        state.consecutive_failures
    }

    /// Holds `wristband_id` back until `retry_at`.
    pub fn defer_until(&mut self, wristband_id: &str, retry_at: Instant) {
        self.states
            .entry(wristband_id.to_string())
            .or_default()
            .retry_at = Some(retry_at);
    }

    pub fn consecutive_failures(&self, wristband_id: &str) -> u32 {
        self.states
            .get(wristband_id)
            .map_or(0, |s| s.consecutive_failures)
    }

    /// Drops state for wristbands that are no longer monitored.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.states.retain(|wristband_id, _| keep(wristband_id));
    }
}

/// `min(base * 2^(failures - 1), max)`.
pub fn backoff_delay(failures: u32, base: Duration, max: Duration) -> Duration {
    let exponent = failures.saturating_sub(1).min(31);
    base.checked_mul(1u32 << exponent).unwrap_or(max).min(max)
}

/// Adds up to 10% random jitter to `delay`.
pub fn with_jitter(delay: Duration) -> Duration {
    let max_jitter_ms = (delay.as_millis() / 10) as u64;
    if max_jitter_ms == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::thread_rng().gen_range(0..=max_jitter_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(30);

    #[test]
    fn test_backoff_delay_doubles_then_caps() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(10);
        assert_eq!(backoff_delay(1, base, max), Duration::from_secs(1));
        assert_eq!(backoff_delay(2, base, max), Duration::from_secs(2));
        assert_eq!(backoff_delay(3, base, max), Duration::from_secs(4));
        assert_eq!(backoff_delay(4, base, max), Duration::from_secs(8));
        assert_eq!(backoff_delay(5, base, max), max);
        assert_eq!(backoff_delay(u32::MAX, base, max), max);
    }

    #[test]
    fn test_jitter_stays_within_ten_percent() {
        let delay = Duration::from_secs(10);
        for _ in 0..100 {
            let jittered = with_jitter(delay);
            assert!(jittered >= delay);
            assert!(jittered <= Duration::from_secs(11));
        }
        assert_eq!(with_jitter(Duration::from_millis(5)), Duration::from_millis(5));
    }

    #[test]
    fn test_policy_parses_from_config_names() {
        let policy: LocationErrorPolicy = serde_json::from_str("\"retry_immediate\"").unwrap();
        assert_eq!(policy, LocationErrorPolicy::RetryImmediate);
        assert_eq!(LocationErrorPolicy::Backoff.as_str(), "backoff");
        assert_eq!(LocationErrorPolicy::default(), LocationErrorPolicy::SkipCycle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wristband_sampled_once_per_interval() {
        let mut pacer = Pacer::new(INTERVAL);
        let start = Instant::now();

        assert_eq!(pacer.poll("w1", start), Readiness::Due);
        assert_eq!(pacer.poll("w1", start + Duration::from_secs(10)), Readiness::NotDue);
        assert_eq!(pacer.poll("w1", start + INTERVAL), Readiness::Due);
        // Other wristbands have their own pacing.
        assert_eq!(pacer.poll("w2", start + Duration::from_secs(10)), Readiness::Due);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_due_until_full_interval_elapsed() {
        let mut pacer = Pacer::new(INTERVAL);
        let start = Instant::now();

        assert_eq!(pacer.poll("w1", start), Readiness::Due);
        assert_eq!(pacer.poll("w1", start + Duration::from_millis(28_600)), Readiness::NotDue);
        assert_eq!(
            pacer.poll("w1", start + INTERVAL - Duration::from_millis(1)),
            Readiness::NotDue
        );
        assert_eq!(pacer.poll("w1", start + INTERVAL), Readiness::Due);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_slot_does_not_shift_next_deadline_early() {
        let mut pacer = Pacer::new(INTERVAL);
        let start = Instant::now();

        assert_eq!(pacer.poll("w1", start + Duration::from_millis(20)), Readiness::Due);
        assert_eq!(pacer.poll("w1", start + INTERVAL), Readiness::NotDue);
        assert_eq!(
            pacer.poll("w1", start + INTERVAL + Duration::from_millis(20)),
            Readiness::Due
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_holds_until_retry_and_success_resets() {
        let mut pacer = Pacer::new(Duration::from_millis(100));
        let start = Instant::now();

        assert_eq!(pacer.poll("w1", start), Readiness::Due);
        assert_eq!(pacer.record_failure("w1"), 1);
        assert_eq!(pacer.record_failure("w1"), 2);
        pacer.defer_until("w1", start + Duration::from_secs(5));

        assert_eq!(pacer.poll("w1", start + Duration::from_secs(1)), Readiness::BackingOff);
        assert_eq!(pacer.poll("w1", start + Duration::from_secs(5)), Readiness::Due);

        pacer.record_success("w1");
        assert_eq!(pacer.consecutive_failures("w1"), 0);
        assert_eq!(pacer.poll("w1", start + Duration::from_secs(6)), Readiness::Due);
    }

    #[test]
    fn test_retain_forgets_state() {
        let mut pacer = Pacer::new(INTERVAL);
        pacer.record_failure("w1");
        pacer.record_failure("w2");
        pacer.retain(|id| id == "w2");
        assert_eq!(pacer.consecutive_failures("w1"), 0);
        assert_eq!(pacer.consecutive_failures("w2"), 1);
    }
}
