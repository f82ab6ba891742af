use serde::{Deserialize, Serialize};

use crate::classification::domain::gender::Gender;
use crate::shared::constants::{ALERT_MALES_ABOVE, ALERT_MIN_FEMALES};

/// Per-frame head count. Starts at zero for every frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameTally {
    pub male: u32,
    pub female: u32,
}

impl FrameTally {
    pub fn new(male: u32, female: u32) -> Self {
        Self { male, female }
    }

    pub fn record(&mut self, gender: Gender) {
        match gender {
            Gender::Man => self.male += 1,
            Gender::Woman => self.female += 1,
        }
    }

    pub fn faces(&self) -> u32 {
        self.male + self.female
    }

    /// Male/female ratio; `0.0` when no females are counted.
    pub fn ratio(&self) -> f64 {
        if self.female == 0 {
            0.0
        } else {
            self.male as f64 / self.female as f64
        }
    }
}

/// Crowd-composition threshold that raises the on-screen alert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertRule {
    /// Male count must be strictly greater than this.
    pub males_above: u32,
    pub min_females: u32,
}

impl Default for AlertRule {
    fn default() -> Self {
        Self {
            males_above: ALERT_MALES_ABOVE,
            min_females: ALERT_MIN_FEMALES,
        }
    }
}

impl AlertRule {
    pub fn triggered(&self, tally: &FrameTally) -> bool {
        tally.male > self.males_above && tally.female >= self.min_females
    }

    pub fn message(&self) -> String {
        let noun = if self.min_females == 1 { "female" } else { "females" };
        format!(
            "ALERT: More than {} males and {} {noun}!",
            self.males_above, self.min_females
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_record_counts_each_label() {
        let mut tally = FrameTally::default();
        tally.record(Gender::Man);
        tally.record(Gender::Woman);
        tally.record(Gender::Man);
        assert_eq!(tally, FrameTally::new(2, 1));
        assert_eq!(tally.faces(), 3);
    }

    #[rstest]
    #[case::no_faces(0, 0, 0.0)]
    #[case::no_females(6, 0, 0.0)]
    #[case::two_to_one(4, 2, 2.0)]
    #[case::only_females(0, 3, 0.0)]
    #[case::fractional(1, 4, 0.25)]
    fn test_ratio(#[case] male: u32, #[case] female: u32, #[case] expected: f64) {
        let ratio = FrameTally::new(male, female).ratio();
        assert!(ratio.is_finite());
        assert_relative_eq!(ratio, expected);
    }

    #[rstest]
    #[case::males_without_female(6, 0, false)]
    #[case::threshold_crossed(6, 1, true)]
    #[case::males_at_threshold(5, 5, false)]
    #[case::many_of_both(9, 4, true)]
    #[case::empty(0, 0, false)]
    fn test_default_alert_rule(#[case] male: u32, #[case] female: u32, #[case] expected: bool) {
        assert_eq!(
            AlertRule::default().triggered(&FrameTally::new(male, female)),
            expected
        );
    }

    #[test]
    fn test_default_message() {
        assert_eq!(
            AlertRule::default().message(),
            "ALERT: More than 5 males and 1 female!"
        );
    }

    #[test]
    fn test_custom_rule() {
        let rule = AlertRule {
            males_above: 2,
            min_females: 2,
        };
        assert!(!rule.triggered(&FrameTally::new(3, 1)));
        assert!(rule.triggered(&FrameTally::new(3, 2)));
        assert_eq!(rule.message(), "ALERT: More than 2 males and 2 females!");
    }
}
