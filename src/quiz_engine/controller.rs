use crate::quiz_engine::{config::ControllerConfig, tracker::UserPerformanceTracker};

/// Proportional controller steering the next quiz's difficulty towards a
/// fixed success-rate setpoint.
///
/// A user beating the setpoint gets harder questions next time; a user below
/// it gets easier ones. The result always lies within the configured bounds.
#[derive(Debug, Clone)]
pub struct TargetDifficultyController {
    config: ControllerConfig,
}

impl TargetDifficultyController {
    pub fn new(config: &ControllerConfig) -> Self {
        Self { config: config.clone() }
    }

    pub fn suggest_next_difficulty(&self, tracker: &UserPerformanceTracker) -> f64 {
        let window = self.config.window;
        self.suggest_from(
            tracker.recent_average_difficulty(window),
            tracker.recent_performance(window),
        )
    }

    /// Target for anonymous requests.
    pub fn default_target(&self) -> f64 {
        self.clamp(self.config.default_target)
    }

    fn suggest_from(&self, current_difficulty: f64, recent_performance: f64) -> f64 {
        let target = current_difficulty
            + (recent_performance - self.config.setpoint) * self.config.adaptation_factor;
        self.clamp(target)
    }

    fn clamp(&self, value: f64) -> f64 {
        if value.is_finite() {
            value.clamp(self.config.min_target, self.config.max_target)
        } else {
            self.config.min_target.max(self.config.default_target.min(self.config.max_target))
        }
    }
}
