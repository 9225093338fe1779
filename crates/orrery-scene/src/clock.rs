//! Simulation time in days.

/// Monotonic day counter driven by real elapsed time.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationClock {
    day: f64,
    days_per_second: f64,
    paused: bool,
}

impl SimulationClock {
    pub fn new(days_per_second: f64) -> Self {
        Self {
            day: 0.0,
            days_per_second: sanitize_rate(days_per_second),
            paused: false,
        }
    }

    pub fn starting_at(mut self, day: f64) -> Self {
        if day.is_finite() {
            self.day = day.max(0.0);
        }
        self
    }

    /// Current simulated day.
    pub fn day(&self) -> f64 {
        self.day
    }

    pub fn days_per_second(&self) -> f64 {
        self.days_per_second
    }

    pub fn set_days_per_second(&mut self, days_per_second: f64) {
        self.days_per_second = sanitize_rate(days_per_second);
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Advance by `elapsed_seconds` of real time and return the new day.
    ///
    /// Negative or non-finite input leaves the clock where it is.
    pub fn advance(&mut self, elapsed_seconds: f64) -> f64 {
        if !self.paused && elapsed_seconds.is_finite() && elapsed_seconds > 0.0 {
            self.day += self.days_per_second * elapsed_seconds;
        }
        self.day
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(10.0)
    }
}

/// Rates must be finite and non-negative, otherwise the clock could run backwards.
fn sanitize_rate(days_per_second: f64) -> f64 {
    if days_per_second.is_finite() && days_per_second >= 0.0 {
        days_per_second
    } else {
        log::warn!("ignoring invalid simulation rate {days_per_second}, using 0");
        0.0
    }
}
