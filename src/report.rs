use blockhost_core::TaskTimer;
use std::time::Duration;
use tracing::info;

/// Elapsed time of one timer and its share of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTime {
    pub name: String,
    pub elapsed: Duration,
    pub percent: f64,
}

/// What a finished run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub frames_read: u64,
    pub frames_written: u64,
    /// Frames written times output channels.
    pub samples_processed: u64,
    /// Tail frames requested after the end of input.
    pub tail_frames: u64,
    pub components: Vec<ComponentTime>,
}

impl RunReport {
    /// Collects timers into components with percentages of their sum.
    pub fn component_times<'a>(timers: impl IntoIterator<Item = &'a TaskTimer>) -> Vec<ComponentTime> {
        let totals: Vec<(String, Duration)> = timers
            .into_iter()
            .map(|timer| (timer.name(), timer.total()))
            .collect();
        let sum: f64 = totals.iter().map(|(_, elapsed)| elapsed.as_secs_f64()).sum();

        totals
            .into_iter()
            .map(|(name, elapsed)| ComponentTime {
                name,
                percent: if sum > 0.0 {
                    elapsed.as_secs_f64() * 100.0 / sum
                } else {
                    0.0
                },
                elapsed,
            })
            .collect()
    }

    pub fn total_time(&self) -> Duration {
        self.components.iter().map(|c| c.elapsed).sum()
    }

    pub fn log_summary(&self) {
        info!(
            "Read {} frames, wrote {} frames ({} samples, {} tail frames)",
            self.frames_read, self.frames_written, self.samples_processed, self.tail_frames
        );
        info!("Total processing time {:.3} ms:", self.total_time().as_secs_f64() * 1000.0);
        for component in &self.components {
            info!(
                "  {}: {:.3} ms ({:.1}%)",
                component.name,
                component.elapsed.as_secs_f64() * 1000.0,
                component.percent
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentages_of_idle_timers() {
        let timers = [
            TaskTimer::new("blockhost", "Host"),
            TaskTimer::new("mrs_passthru", "Audio Processing"),
        ];
        let components = RunReport::component_times(&timers);
        assert_eq!(components.len(), 2);
        assert_eq!(components[1].name, "mrs_passthru (Audio Processing)");
        assert!(components.iter().all(|c| c.percent == 0.0));
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let mut busy = TaskTimer::new("busy", "");
        busy.time(|| std::thread::sleep(Duration::from_millis(2)));
        let idle = TaskTimer::new("idle", "");
        let components = RunReport::component_times([&busy, &idle]);
        let sum: f64 = components.iter().map(|c| c.percent).sum();
        approx::assert_relative_eq!(sum, 100.0, epsilon = 1e-9);
        approx::assert_relative_eq!(components[0].percent, 100.0, epsilon = 1e-9);
    }
}
