use crate::data::analytics::QuestionPerformance;

/// Below this a question counts as difficult.
pub const DIFFICULT_BELOW: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn of(correct_percentage: f64) -> Difficulty {
        if correct_percentage >= 70.0 {
            Difficulty::Easy
        } else if correct_percentage >= 50.0 {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

/// Question counts per correct-rate band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bands {
    /// above 80
    pub excellent: usize,
    /// 60 to 80
    pub good: usize,
    /// 40 up to 60
    pub fair: usize,
    /// below 40
    pub poor: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSummary {
    pub total_questions: usize,
    /// Mean correct rate rounded to one decimal; `0.0` without data.
    pub average_correct_rate: f64,
    pub total_attempts: u32,
    pub difficult_questions: usize,
    pub bands: Bands,
}

impl AnalyticsSummary {
    pub fn new(performance: &[QuestionPerformance]) -> AnalyticsSummary {
        let mut bands = Bands::default();
        for p in performance {
            let rate = p.correct_percentage;
            if rate > 80.0 {
                bands.excellent += 1;
            } else if rate >= 60.0 {
                bands.good += 1;
            } else if rate >= 40.0 {
                bands.fair += 1;
            } else {
                bands.poor += 1;
            }
        }

        let average_correct_rate = if performance.is_empty() {
            0.0
        } else {
            let sum: f64 = performance.iter().map(|it| it.correct_percentage).sum();
            (sum / performance.len() as f64 * 10.0).round() / 10.0
        };

        AnalyticsSummary {
            total_questions: performance.len(),
            average_correct_rate,
            total_attempts: performance.iter().map(|it| it.total_attempts).sum(),
            difficult_questions: performance
                .iter()
                .filter(|it| it.correct_percentage < DIFFICULT_BELOW)
                .count(),
            bands,
        }
    }

    /// Worth suggesting the quiz content be reviewed.
    pub fn needs_review(&self) -> bool {
        self.total_questions > 0 && self.average_correct_rate < 60.0
    }
}
