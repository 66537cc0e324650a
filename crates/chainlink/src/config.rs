//! Analysis parameters.

use chrono::{Days, NaiveDate, Utc};

/// Default multiplier over the average impact count for bottlenecks
pub const DEFAULT_BOTTLENECK_FACTOR: f64 = 1.5;

/// Parameters shared by the critical path and impact computations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// Day the first root item starts
    pub start_date: NaiveDate,

    /// A node is a bottleneck when its impact count exceeds this many
    /// times the average
    pub bottleneck_factor: f64,
}

impl AnalysisConfig {
    /// Config starting on `start_date` with the default bottleneck factor
    pub fn starting(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            bottleneck_factor: DEFAULT_BOTTLENECK_FACTOR,
        }
    }

    /// Builder-style factor override
    #[must_use]
    pub fn with_bottleneck_factor(mut self, factor: f64) -> Self {
        self.bottleneck_factor = factor;
        self
    }

    /// `start_date + days`, saturating at the last representable date
    pub fn project_date(&self, days: u64) -> NaiveDate {
        self.start_date
            .checked_add_days(Days::new(days))
            .unwrap_or(NaiveDate::MAX)
    }
}

impl Default for AnalysisConfig {
    /// Starts today (UTC)
    fn default() -> Self {
        Self::starting(Utc::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_date_adds_calendar_days() {
        let config = AnalysisConfig::starting(NaiveDate::from_ymd_opt(2026, 1, 30).unwrap());
        assert_eq!(
            config.project_date(3),
            NaiveDate::from_ymd_opt(2026, 2, 2).unwrap()
        );
        assert_eq!(config.project_date(0), config.start_date);
    }

    #[test]
    fn test_project_date_saturates() {
        let config = AnalysisConfig::starting(NaiveDate::MAX);
        assert_eq!(config.project_date(10), NaiveDate::MAX);
    }

    #[test]
    fn test_builder() {
        let config = AnalysisConfig::default().with_bottleneck_factor(2.0);
        assert!((config.bottleneck_factor - 2.0).abs() < f64::EPSILON);
    }
}
