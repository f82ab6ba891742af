use std::fmt;

use thiserror::Error;

/// The two labels the classifier scores, in model output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gender {
    Man,
    Woman,
}

impl Gender {
    /// Label set in the order the classifier emits its scores.
    pub const ALL: [Gender; 2] = [Gender::Man, Gender::Woman];

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Man => "man",
            Gender::Woman => "woman",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ClassificationError {
    #[error("classifier returned {actual} scores, expected {expected}")]
    UnexpectedScores { expected: usize, actual: usize },
}

/// A label chosen for one face in one frame, with its confidence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    pub gender: Gender,
    pub confidence: f32,
}

impl Classification {
    /// Picks the label with the highest score.
    ///
    /// Only a strictly greater score replaces the current best, so on an
    /// exact tie the earlier label (`Man`) is kept.
    pub fn from_scores(scores: &[f32]) -> Result<Self, ClassificationError> {
        if scores.len() != Gender::ALL.len() {
            return Err(ClassificationError::UnexpectedScores {
                expected: Gender::ALL.len(),
                actual: scores.len(),
            });
        }

        let mut best = 0;
        for (i, &score) in scores.iter().enumerate().skip(1) {
            if score > scores[best] {
                best = i;
            }
        }

        Ok(Self {
            gender: Gender::ALL[best],
            confidence: scores[best],
        })
    }

    /// Overlay text, e.g. `"man: 90.00%"`.
    pub fn label_text(&self) -> String {
        format!("{}: {:.2}%", self.gender, self.confidence * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::man_wins(&[0.9, 0.1], Gender::Man, 0.9)]
    #[case::woman_wins(&[0.2, 0.8], Gender::Woman, 0.8)]
    #[case::exact_tie_picks_first(&[0.5, 0.5], Gender::Man, 0.5)]
    #[case::unnormalized(&[1.5, 3.0], Gender::Woman, 3.0)]
    fn test_from_scores(#[case] scores: &[f32], #[case] gender: Gender, #[case] conf: f32) {
        let c = Classification::from_scores(scores).unwrap();
        assert_eq!(c.gender, gender);
        assert_relative_eq!(c.confidence, conf);
    }

    #[rstest]
    #[case::empty(&[])]
    #[case::single(&[1.0])]
    #[case::three(&[0.1, 0.2, 0.7])]
    fn test_from_scores_rejects_wrong_length(#[case] scores: &[f32]) {
        let err = Classification::from_scores(scores).unwrap_err();
        assert_eq!(
            err,
            ClassificationError::UnexpectedScores {
                expected: 2,
                actual: scores.len()
            }
        );
    }

    #[test]
    fn test_labels_follow_model_order() {
        assert_eq!(Gender::ALL[0].label(), "man");
        assert_eq!(Gender::ALL[1].label(), "woman");
        assert_eq!(Gender::Woman.to_string(), "woman");
    }

    #[test]
    fn test_label_text_formats_percentage() {
        let c = Classification {
            gender: Gender::Man,
            confidence: 0.9,
        };
        assert_eq!(c.label_text(), "man: 90.00%");

        let c = Classification {
            gender: Gender::Woman,
            confidence: 0.8,
        };
        assert_eq!(c.label_text(), "woman: 80.00%");
    }
}
