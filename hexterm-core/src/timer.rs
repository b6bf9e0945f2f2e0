//! Elapsed-time helpers: per-phase timing and human readable intervals.

use std::time::Duration;

use tokio::time::Instant;

/// Records how long was spent in each named phase and logs a summary
/// when dropped.
///
/// Phases shorter than `min_log` are left out of the summary.
#[derive(Debug)]
pub struct PhaseTimer {
    title: String,
    min_log: Duration,
    current: &'static str,
    since: Instant,
    totals: Vec<(&'static str, Duration)>,
    log_enabled: bool,
}

impl PhaseTimer {
    pub fn new(title: impl Into<String>, start_phase: &'static str) -> Self {
        Self {
            title: title.into(),
            min_log: Duration::from_millis(1),
            current: start_phase,
            since: Instant::now(),
            totals: Vec::new(),
            log_enabled: true,
        }
    }

    pub fn with_min_log(mut self, min_log: Duration) -> Self {
        self.min_log = min_log;
        self
    }

    pub fn set_log_enabled(&mut self, enabled: bool) {
        self.log_enabled = enabled;
    }

    pub fn phase(&self) -> &'static str {
        self.current
    }

    /// Close the running phase and start timing `phase`.
    pub fn set_phase(&mut self, phase: &'static str) {
        if phase == self.current {
            return;
        }
        let now = Instant::now();
        self.add(self.current, now - self.since);
        self.current = phase;
        self.since = now;
    }

    /// Total time spent in `phase`, including the running stretch.
    pub fn elapsed(&self, phase: &str) -> Duration {
        let banked = self
            .totals
            .iter()
            .find(|(name, _)| *name == phase)
            .map_or(Duration::ZERO, |(_, d)| *d);
        if phase == self.current {
            banked + self.since.elapsed()
        } else {
            banked
        }
    }

    /// Phases at or above the logging threshold, in first-seen order.
    pub fn report(&self) -> Vec<(&'static str, Duration)> {
        let mut names: Vec<&'static str> = self.totals.iter().map(|(n, _)| *n).collect();
        if !names.contains(&self.current) {
            names.push(self.current);
        }
        names
            .into_iter()
            .map(|n| (n, self.elapsed(n)))
            .filter(|(_, d)| *d >= self.min_log)
            .collect()
    }

    fn add(&mut self, phase: &'static str, d: Duration) {
        match self.totals.iter_mut().find(|(name, _)| *name == phase) {
            Some((_, total)) => *total += d,
            None => self.totals.push((phase, d)),
        }
    }
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        if !self.log_enabled {
            return;
        }
        for (phase, d) in self.report() {
            tracing::debug!("{}: {} took {:.3}ms", self.title, phase, d.as_secs_f64() * 1000.0);
        }
    }
}

// ── Intervals ────────────────────────────────────────────────────

const UNITS: [(&str, u128); 6] = [
    ("day", 86_400_000_000),
    ("hour", 3_600_000_000),
    ("minute", 60_000_000),
    ("second", 1_000_000),
    ("millisecond", 1_000),
    ("microsecond", 1),
];

/// Largest whole unit of `d`, e.g. `"2 seconds"` or `"1 minute"`.
pub fn human_interval(d: Duration) -> String {
    let micros = d.as_micros();
    for (unit, size) in UNITS {
        if micros >= size {
            let n = micros / size;
            let plural = if n == 1 { "" } else { "s" };
            return format!("{n} {unit}{plural}");
        }
    }
    "0 microseconds".to_string()
}

/// Gap between two receives as shown next to a dump.
pub fn gap_text(d: Duration) -> String {
    if d < Duration::from_millis(1) {
        "<1 millisecond".to_string()
    } else {
        human_interval(d)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_use_largest_unit() {
        assert_eq!(human_interval(Duration::from_micros(1500)), "1 millisecond");
        assert_eq!(human_interval(Duration::from_millis(250)), "250 milliseconds");
        assert_eq!(human_interval(Duration::from_secs(2)), "2 seconds");
        assert_eq!(human_interval(Duration::from_secs(61)), "1 minute");
        assert_eq!(human_interval(Duration::from_secs(7200)), "2 hours");
        assert_eq!(human_interval(Duration::ZERO), "0 microseconds");
    }

    #[test]
    fn sub_millisecond_gaps() {
        assert_eq!(gap_text(Duration::from_micros(999)), "<1 millisecond");
        assert_eq!(gap_text(Duration::from_micros(1000)), "1 millisecond");
    }

    #[tokio::test(start_paused = true)]
    async fn phases_accumulate() {
        let mut timer = PhaseTimer::new("test", "wait");
        timer.set_log_enabled(false);

        tokio::time::advance(Duration::from_millis(30)).await;
        timer.set_phase("work");
        tokio::time::advance(Duration::from_millis(5)).await;
        timer.set_phase("wait");
        tokio::time::advance(Duration::from_millis(10)).await;

        assert_eq!(timer.elapsed("wait"), Duration::from_millis(40));
        assert_eq!(timer.elapsed("work"), Duration::from_millis(5));
        assert_eq!(timer.elapsed("idle"), Duration::ZERO);
        assert_eq!(timer.phase(), "wait");
    }

    #[tokio::test(start_paused = true)]
    async fn report_skips_short_phases() {
        let mut timer = PhaseTimer::new("test", "wait").with_min_log(Duration::from_millis(10));
        timer.set_log_enabled(false);

        tokio::time::advance(Duration::from_millis(20)).await;
        timer.set_phase("work");
        tokio::time::advance(Duration::from_millis(2)).await;

        let report = timer.report();
        assert_eq!(report, vec![("wait", Duration::from_millis(20))]);
    }
}
