//! Difficulty scoring: weighted factor formula, optional learned predictor,
//! and per-user personalisation.
//!
//! The predictor is a two-state component. It starts `Enabled` when one is
//! attached and moves to `Disabled` on its first failure; there is no way
//! back, so one bad model cannot make scores flip between the two formulas
//! within a process.

use tracing::warn;

use crate::quiz_engine::{
    config::{DifficultyConfig, DifficultyWeights},
    error::PredictorError,
    factors::{compute_factors, DifficultyFactors},
    helpers::{is_numeric_option, season_format, SeasonFormat},
    models::{CandidateQuestion, QuestionType},
    tracker::UserPerformanceTracker,
};

pub const FEATURE_COUNT: usize = 10;

/// obscurity, time distance, stat complexity, ambiguity, significance,
/// text length, stat-term density, complexity indicators, category
/// difficulty, answer-format complexity.
pub type FeatureVector = [f64; FEATURE_COUNT];

const STAT_TERMS: &[&str] = &[
    "goals", "assists", "appearances", "minutes", "passes", "progressive", "xg",
    "tackles", "interceptions", "clean", "sheets", "cards", "shots", "carries",
];

const COMPLEXITY_INDICATORS: &[&str] = &[
    "first", "most recent", "how many", "more", "per 90", "percentage", "final score",
    "how old",
];

/// A learned difficulty model with a fixed input/output contract.
pub trait DifficultyPredictor {
    /// Returns a difficulty already normalised to [0, 1].
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictorError>;
}

impl<F> DifficultyPredictor for F
where
    F: Fn(&FeatureVector) -> Result<f64, PredictorError>,
{
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictorError> {
        self(features)
    }
}

enum PredictorState {
    Enabled(Box<dyn DifficultyPredictor>),
    Disabled,
}

/// Weighted sum of the five factors, clamped to [0, 1].
pub fn score(factors: &DifficultyFactors, weights: &DifficultyWeights) -> f64 {
    factors.weighted(weights)
}

pub struct DifficultyScorer {
    weights: DifficultyWeights,
    familiarity_weight: f64,
    current_year: i32,
    predictor: PredictorState,
}

impl DifficultyScorer {
    pub fn new(config: &DifficultyConfig, current_year: i32) -> Self {
        Self {
            weights: config.weights.clone(),
            familiarity_weight: config.user_familiarity_weight,
            current_year,
            predictor: PredictorState::Disabled,
        }
    }

    pub fn with_predictor(mut self, predictor: Box<dyn DifficultyPredictor>) -> Self {
        self.predictor = PredictorState::Enabled(predictor);
        self
    }

    pub fn predictor_enabled(&self) -> bool {
        matches!(self.predictor, PredictorState::Enabled(_))
    }

    /// Unpersonalised difficulty of a question.
    pub fn base_difficulty(&mut self, question: &CandidateQuestion) -> f64 {
        let factors = compute_factors(&question.context, self.current_year);

        let predicted = match &self.predictor {
            PredictorState::Enabled(predictor) => {
                let features = feature_vector(question, &factors);
                Some(predictor.predict(&features).and_then(|v| {
                    if v.is_finite() {
                        Ok(v)
                    } else {
                        Err(PredictorError::NonFinite(v))
                    }
                }))
            }
            PredictorState::Disabled => None,
        };

        match predicted {
            Some(Ok(value)) => return value.clamp(0.0, 1.0),
            Some(Err(error)) => {
                warn!(%error, question_type = %question.question_type, "difficulty predictor failed; using weighted formula from now on");
                self.predictor = PredictorState::Disabled;
            }
            None => {}
        }
        score(&factors, &self.weights)
    }

    /// `base * (1 - familiarity * weight)`, clamped to [0, 1].
    pub fn personalize(&self, base: f64, familiarity: f64) -> f64 {
        let familiarity = familiarity.clamp(0.0, 1.0);
        (base * (1.0 - familiarity * self.familiarity_weight)).clamp(0.0, 1.0)
    }

    /// Base difficulty adjusted for the user's familiarity with the category.
    pub fn difficulty_for(
        &mut self,
        question: &CandidateQuestion,
        tracker: Option<&UserPerformanceTracker>,
    ) -> f64 {
        let base = self.base_difficulty(question);
        let familiarity = tracker
            .map(|t| t.familiarity(&question.context.category))
            .unwrap_or(0.0);
        self.personalize(base, familiarity)
    }
}

// ---------------------------------------------------------------------------
// Feature extraction
// ---------------------------------------------------------------------------

pub fn category_difficulty(question_type: QuestionType) -> f64 {
    match question_type {
        QuestionType::AwardSeason      => 0.5,
        QuestionType::AwardWinner      => 0.4,
        QuestionType::AwardTeam        => 0.45,
        QuestionType::AwardNationality => 0.3,
        QuestionType::AwardAge         => 0.7,
        QuestionType::StatValue        => 0.75,
        QuestionType::StatLeader       => 0.5,
        QuestionType::StatComparison   => 0.35,
        QuestionType::MatchWinner      => 0.3,
        QuestionType::MatchScore       => 0.65,
    }
}

fn answer_format_complexity(answer: &str) -> f64 {
    let answer = answer.trim();
    if is_numeric_option(answer) {
        return if answer.contains('.') { 0.5 } else { 0.3 };
    }
    match season_format(answer) {
        SeasonFormat::Range => return 0.6,
        SeasonFormat::Year => return 0.4,
        SeasonFormat::Other => {}
    }
    let is_scoreline = answer
        .split_once('-')
        .map(|(a, b)| is_numeric_option(a) && is_numeric_option(b))
        .unwrap_or(false);
    if is_scoreline {
        0.5
    } else if answer.split_whitespace().count() > 1 {
        0.4
    } else {
        0.2
    }
}

/// Build the predictor's fixed-length input for one question.
pub fn feature_vector(question: &CandidateQuestion, factors: &DifficultyFactors) -> FeatureVector {
    let text = question.question_text.to_ascii_lowercase();
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let stat_terms = words.iter().filter(|w| STAT_TERMS.contains(*w)).count();
    let stat_density = if words.is_empty() {
        0.0
    } else {
        stat_terms as f64 / words.len() as f64
    };
    let indicators = COMPLEXITY_INDICATORS
        .iter()
        .filter(|phrase| text.contains(*phrase))
        .count();

    let [obscurity, time, complexity, ambiguity, significance] = factors.as_array();
    [
        obscurity,
        time,
        complexity,
        ambiguity,
        significance,
        (question.question_text.chars().count() as f64 / 200.0).min(1.0),
        stat_density,
        (indicators as f64 / 5.0).min(1.0),
        category_difficulty(question.question_type),
        answer_format_complexity(&question.correct_answer),
    ]
}
