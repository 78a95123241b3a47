//! Elapsed-time accounting for chain members and host overhead.

use std::time::{Duration, Instant};

/// Named accumulator of serial, non-overlapping time intervals.
///
/// Calling [`start`](Self::start) while already running closes the open
/// interval first, so intervals never nest.
#[derive(Debug, Clone)]
pub struct TaskTimer {
    component: String,
    subject: String,
    started_at: Option<Instant>,
    total: Duration,
}

impl TaskTimer {
    pub fn new(component: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            subject: subject.into(),
            started_at: None,
            total: Duration::ZERO,
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// `"component (subject)"`, used as the label in run reports.
    pub fn name(&self) -> String {
        if self.subject.is_empty() {
            self.component.clone()
        } else {
            format!("{} ({})", self.component, self.subject)
        }
    }

    pub fn start(&mut self) {
        if self.started_at.is_some() {
            self.stop();
        }
        self.started_at = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.total += started.elapsed();
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Runs `f` inside a start/stop pair.
    pub fn time<R>(&mut self, f: impl FnOnce() -> R) -> R {
        self.start();
        let result = f();
        self.stop();
        result
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn total_ms(&self) -> f64 {
        self.total.as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_accumulates_intervals() {
        let mut timer = TaskTimer::new("mrs_passthru", "Audio Processing");
        assert!(!timer.is_running());

        timer.start();
        assert!(timer.is_running());
        thread::sleep(Duration::from_millis(2));
        timer.stop();
        let first = timer.total();
        assert!(first >= Duration::from_millis(2));

        timer.start();
        thread::sleep(Duration::from_millis(2));
        timer.stop();
        assert!(timer.total() >= first + Duration::from_millis(2));
    }

    #[test]
    fn test_restart_does_not_nest() {
        let mut timer = TaskTimer::new("host", "");
        timer.start();
        thread::sleep(Duration::from_millis(1));
        timer.start();
        assert!(timer.is_running());
        assert!(timer.total() >= Duration::from_millis(1));
        timer.stop();
        timer.stop();
        assert!(!timer.is_running());
    }

    #[test]
    fn test_name() {
        assert_eq!(
            TaskTimer::new("mrs_gain", "MIDI Processing").name(),
            "mrs_gain (MIDI Processing)"
        );
        assert_eq!(TaskTimer::new("Host", "").name(), "Host");
    }

    #[test]
    fn test_time_closure() {
        let mut timer = TaskTimer::new("x", "y");
        let value = timer.time(|| 42);
        assert_eq!(value, 42);
        assert!(!timer.is_running());
    }
}
