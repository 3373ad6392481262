use std::time::{Duration, Instant};

/// Tracks the politeness state of a host during crawling
///
/// Send slots are reserved ahead of time: each reservation is spaced at
/// least `delay` after the previous one, so fetches dispatched concurrently
/// still hit the host one interval apart.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of requests reserved against this host in the current crawl
    pub request_count: u32,

    /// Send time of the most recently reserved request
    pub last_slot: Option<Instant>,
}

impl HostState {
    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let next = self.last_slot? + delay;
        if next > now {
            Some(next - now)
        } else {
            None
        }
    }

    /// Reserves the next send slot and returns when it opens
    pub fn reserve(&mut self, delay: Duration, now: Instant) -> Instant {
        let slot = now + self.time_until_next_request(delay, now).unwrap_or_default();
        self.last_slot = Some(slot);
        self.request_count += 1;
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(1000);

    #[test]
    fn test_fresh_host_can_request() {
        let state = HostState::default();
        assert!(state.time_until_next_request(DELAY, Instant::now()).is_none());
    }

    #[test]
    fn test_reserve_spaces_slots() {
        let mut state = HostState::default();
        let now = Instant::now();

        let first = state.reserve(DELAY, now);
        let second = state.reserve(DELAY, now);
        let third = state.reserve(DELAY, now);

        assert_eq!(first, now);
        assert_eq!(second, now + DELAY);
        assert_eq!(third, now + DELAY * 2);
        assert_eq!(state.request_count, 3);
    }

    #[test]
    fn test_wait_after_reservation() {
        let mut state = HostState::default();
        let now = Instant::now();
        state.reserve(DELAY, now);

        let wait = state.time_until_next_request(DELAY, now + Duration::from_millis(400));
        assert_eq!(wait, Some(Duration::from_millis(600)));
        assert!(state.time_until_next_request(DELAY, now + DELAY).is_none());
    }

    #[test]
    fn test_idle_host_reserves_immediately() {
        let mut state = HostState::default();
        let start = Instant::now();
        state.reserve(DELAY, start);

        let later = start + Duration::from_secs(5);
        assert_eq!(state.reserve(DELAY, later), later);
    }
}
