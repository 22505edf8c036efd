use std::collections::VecDeque;

use crate::metrics::AnnotatedSample;

/// The recent samples shown by the terminal dashboard.
#[derive(Debug)]
pub struct SampleHistory {
    window: f64,
    samples: VecDeque<AnnotatedSample>,
}

impl SampleHistory {
    /// Keep samples no older than `window` seconds behind the newest one.
    pub fn new(window: f64) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    pub fn push(&mut self, sample: AnnotatedSample) {
        let newest = sample.sample.timestamp;
        self.samples.push_back(sample);
        while let Some(oldest) = self.samples.front() {
            if newest - oldest.sample.timestamp <= self.window {
                break;
            }
            self.samples.pop_front();
        }
    }

    pub fn set_window(&mut self, window: f64) {
        self.window = window;
    }

    pub fn window(&self) -> f64 {
        self.window
    }

    pub fn latest(&self) -> Option<&AnnotatedSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Network throughput in bytes per second `(sent, received)` between the
    /// two newest samples. Counter resets give a negative rate.
    pub fn network_rates(&self) -> Option<(f64, f64)> {
        let mut newest = self.samples.iter().rev();
        let last = &newest.next()?.sample;
        let previous = &newest.next()?.sample;
        let elapsed = last.timestamp - previous.timestamp;
        if elapsed <= 0.0 {
            return None;
        }
        let rate = |now: u64, before: u64| (now as f64 - before as f64) / elapsed;
        Some((
            rate(last.net_sent, previous.net_sent),
            rate(last.net_recv, previous.net_recv),
        ))
    }

    /// Timestamps and values of one metric, oldest first.
    pub fn series<F>(&self, metric: F) -> (Vec<f64>, Vec<f64>)
    where
        F: Fn(&AnnotatedSample) -> f64,
    {
        self.samples
            .iter()
            .map(|s| (s.sample.timestamp, metric(s)))
            .unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Sample;

    fn at(timestamp: f64, cpu: f64) -> AnnotatedSample {
        AnnotatedSample {
            sample: Sample {
                timestamp,
                cpu_percent: cpu,
                ..Sample::default()
            },
            recording_progress: 0.0,
            recording_finished: false,
            report: None,
        }
    }

    #[test]
    fn drops_samples_outside_window() {
        let mut history = SampleHistory::new(10.0);
        for t in 0..15 {
            history.push(at(t as f64, t as f64));
        }
        let (times, values) = history.series(|s| s.sample.cpu_percent);
        assert_eq!(times.first(), Some(&4.0));
        assert_eq!(times.last(), Some(&14.0));
        assert_eq!(values.len(), 11);
        assert_eq!(history.latest().map(|s| s.sample.cpu_percent), Some(14.0));
    }

    fn with_network(timestamp: f64, sent: u64, recv: u64) -> AnnotatedSample {
        let mut sample = at(timestamp, 0.0);
        sample.sample.net_sent = sent;
        sample.sample.net_recv = recv;
        sample
    }

    #[test]
    fn network_rates_use_two_newest_samples() {
        let mut history = SampleHistory::new(60.0);
        assert_eq!(history.network_rates(), None);
        history.push(with_network(10.0, 0, 0));
        assert_eq!(history.network_rates(), None);
        history.push(with_network(11.0, 1_000, 4_000));
        history.push(with_network(13.0, 5_000, 5_000));
        assert_eq!(history.network_rates(), Some((2_000.0, 500.0)));
    }

    #[test]
    fn network_rates_need_a_time_gap() {
        let mut history = SampleHistory::new(60.0);
        history.push(with_network(10.0, 0, 0));
        history.push(with_network(10.0, 1_000, 1_000));
        assert_eq!(history.network_rates(), None);
    }

    #[test]
    fn counter_reset_gives_negative_rate() {
        let mut history = SampleHistory::new(60.0);
        history.push(with_network(10.0, 3_000, 0));
        history.push(with_network(12.0, 1_000, 0));
        assert_eq!(history.network_rates(), Some((-1_000.0, 0.0)));
    }

    #[test]
    fn shrinking_window_applies_on_next_push() {
        let mut history = SampleHistory::new(100.0);
        for t in 0..5 {
            history.push(at(t as f64, 0.0));
        }
        history.set_window(1.0);
        assert_eq!(history.len(), 5);
        history.push(at(5.0, 0.0));
        assert_eq!(history.len(), 2);
    }
}
