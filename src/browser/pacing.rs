// src/browser/pacing.rs
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{DelayRange, PacingConfig};

/// Randomized pauses between page interactions.
#[derive(Debug, Clone)]
pub struct Pacer {
    config: PacingConfig,
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    pub fn disabled() -> Self {
        Self {
            config: PacingConfig {
                enabled: false,
                ..PacingConfig::default()
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// A duration drawn uniformly from the range; zero when pacing is off.
    pub fn draw(&self, range: DelayRange) -> Duration {
        if !self.config.enabled {
            return Duration::ZERO;
        }
        let (low, high) = if range.min_ms <= range.max_ms {
            (range.min_ms, range.max_ms)
        } else {
            (range.max_ms, range.min_ms)
        };
        Duration::from_millis(rand::thread_rng().gen_range(low..=high))
    }

    async fn pause(&self, range: DelayRange) {
        let delay = self.draw(range);
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }

    pub async fn keystroke(&self) {
        self.pause(self.config.keystroke).await
    }

    pub async fn scroll(&self) {
        self.pause(self.config.scroll).await
    }

    pub async fn after_write(&self) {
        self.pause(self.config.after_write).await
    }

    pub async fn menu_step(&self) {
        self.pause(self.config.menu_step).await
    }

    pub async fn after_advance(&self) {
        self.pause(self.config.after_advance).await
    }

    pub async fn before_detect(&self) {
        self.pause(self.config.before_detect).await
    }

    pub async fn after_submit(&self) {
        self.pause(self.config.after_submit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_stays_in_range() {
        let pacer = Pacer::new(PacingConfig::default());
        for _ in 0..50 {
            let d = pacer.draw(DelayRange::new(30, 80));
            assert!(d >= Duration::from_millis(30) && d <= Duration::from_millis(80));
        }
        // Inverted bounds are tolerated.
        let d = pacer.draw(DelayRange::new(10, 5));
        assert!(d >= Duration::from_millis(5) && d <= Duration::from_millis(10));
    }

    #[test]
    fn test_disabled_pacer_never_waits() {
        let pacer = Pacer::disabled();
        assert!(!pacer.is_enabled());
        assert_eq!(pacer.draw(DelayRange::new(1000, 3000)), Duration::ZERO);
    }
}
