//! Per-room connection cap and accept-rate limiter (`spec.md` §4.9),
//! independent of the quiz's durable `MAX_PARTICIPANTS`. Written as a
//! small struct of counters on a shared handle, in the teacher's
//! `RoomHandle`-style idiom (`src/hosting/handle.rs`).

use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug)]
pub enum AdmissionDecision {
    Accept,
    CapacityExceeded,
    RateLimited,
}

pub struct AdmissionControl {
    connection_cap: usize,
    accepts_per_second: usize,
    live_connections: Mutex<usize>,
    recent_accepts: Mutex<VecDeque<i64>>,
}

impl AdmissionControl {
    pub fn new(connection_cap: usize, accepts_per_second: usize) -> Self {
        Self {
            connection_cap,
            accepts_per_second,
            live_connections: Mutex::new(0),
            recent_accepts: Mutex::new(VecDeque::new()),
        }
    }

    pub fn try_accept(&self, now_ms: i64) -> AdmissionDecision {
        let mut live = self.live_connections.lock().expect("admission lock poisoned");
        if *live >= self.connection_cap {
            return AdmissionDecision::CapacityExceeded;
        }

        let mut recent = self.recent_accepts.lock().expect("admission lock poisoned");
        while recent.front().is_some_and(|&t| now_ms - t >= 1_000) {
            recent.pop_front();
        }
        if recent.len() >= self.accepts_per_second {
            return AdmissionDecision::RateLimited;
        }

        recent.push_back(now_ms);
        *live += 1;
        AdmissionDecision::Accept
    }

    pub fn release(&self) {
        let mut live = self.live_connections.lock().expect("admission lock poisoned");
        *live = live.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn b4_capacity_cap_rejects_excess_without_affecting_existing() {
        let control = AdmissionControl::new(1, 100);
        assert!(matches!(control.try_accept(0), AdmissionDecision::Accept));
        assert!(matches!(control.try_accept(1), AdmissionDecision::CapacityExceeded));
        control.release();
        assert!(matches!(control.try_accept(2), AdmissionDecision::Accept));
    }

    #[test]
    fn rolling_second_rate_limiter_rejects_excess() {
        let control = AdmissionControl::new(100, 2);
        assert!(matches!(control.try_accept(0), AdmissionDecision::Accept));
        assert!(matches!(control.try_accept(10), AdmissionDecision::Accept));
        assert!(matches!(control.try_accept(20), AdmissionDecision::RateLimited));
        assert!(matches!(control.try_accept(1_100), AdmissionDecision::Accept));
    }
}
