//! Composite quality score used as an acceptance gate.
//!
//! Six metrics, each in [0, 1], are combined by weight. Metrics without a
//! configured weight are left out and the composite is normalised by the
//! weights actually present.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::quiz_engine::{
    config::QualityConfig,
    factors::answer_ambiguity,
    helpers::{clean_distractors, is_numeric_option, same_option},
    models::{CandidateQuestion, QuestionType},
};

const MIN_TEXT_LEN: usize = 20;
const MAX_TEXT_LEN: usize = 200;
/// Difficulty gap at which appropriateness reaches zero.
const APPROPRIATE_GAP: f64 = 0.5;
const VAGUE_WORDS: &[&str] = &[
    "something", "stuff", "thing", "things", "etc", "maybe", "whatever", "probably",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMetric {
    DistractorPlausibility,
    QuestionClarity,
    AnswerUniqueness,
    DifficultyAppropriateness,
    FactualCorrectness,
    OverallCoherence,
}

impl QualityMetric {
    pub const ALL: [QualityMetric; 6] = [
        QualityMetric::DistractorPlausibility,
        QualityMetric::QuestionClarity,
        QualityMetric::AnswerUniqueness,
        QualityMetric::DifficultyAppropriateness,
        QualityMetric::FactualCorrectness,
        QualityMetric::OverallCoherence,
    ];

    pub fn default_weight(self) -> f64 {
        match self {
            QualityMetric::DistractorPlausibility    => 0.25,
            QualityMetric::QuestionClarity           => 0.20,
            QualityMetric::AnswerUniqueness          => 0.15,
            QualityMetric::DifficultyAppropriateness => 0.15,
            QualityMetric::FactualCorrectness        => 0.20,
            QualityMetric::OverallCoherence          => 0.05,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QualityMetric::DistractorPlausibility    => "distractor_plausibility",
            QualityMetric::QuestionClarity           => "question_clarity",
            QualityMetric::AnswerUniqueness          => "answer_uniqueness",
            QualityMetric::DifficultyAppropriateness => "difficulty_appropriateness",
            QualityMetric::FactualCorrectness        => "factual_correctness",
            QualityMetric::OverallCoherence          => "overall_coherence",
        }
    }
}

impl std::fmt::Display for QualityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-metric breakdown of one question's quality.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub metrics: BTreeMap<QualityMetric, f64>,
    pub composite: f64,
    /// Metrics below their configured minimum.
    pub failed_minimums: Vec<QualityMetric>,
}

#[derive(Debug, Clone)]
pub struct QualityScorer {
    config: QualityConfig,
}

impl QualityScorer {
    pub fn new(config: &QualityConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Composite score in [0, 1].
    pub fn score_question(&self, question: &CandidateQuestion, difficulty: f64, target: f64) -> f64 {
        self.quality_report(question, difficulty, target).composite
    }

    pub fn quality_report(&self, question: &CandidateQuestion, difficulty: f64, target: f64) -> QualityReport {
        let distractors = clean_distractors(&question.correct_answer, &question.raw_distractors);
        let metrics: BTreeMap<QualityMetric, f64> = QualityMetric::ALL
            .into_iter()
            .map(|metric| {
                let value = match metric {
                    QualityMetric::DistractorPlausibility    => distractor_plausibility(distractors.len()),
                    QualityMetric::QuestionClarity           => question_clarity(&question.question_text),
                    QualityMetric::AnswerUniqueness          => answer_uniqueness(question),
                    QualityMetric::DifficultyAppropriateness => difficulty_appropriateness(difficulty, target),
                    QualityMetric::FactualCorrectness        => factual_correctness(question),
                    QualityMetric::OverallCoherence          => overall_coherence(question, &distractors),
                };
                (metric, value.clamp(0.0, 1.0))
            })
            .collect();

        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for (metric, weight) in &self.config.weights {
            if let Some(value) = metrics.get(metric) {
                weighted += value * weight;
                total_weight += weight;
            }
        }
        let composite = if total_weight > 0.0 {
            (weighted / total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let failed_minimums = self
            .config
            .minimums
            .iter()
            .filter(|(metric, min)| metrics.get(*metric).map_or(true, |v| v < *min))
            .map(|(metric, _)| *metric)
            .collect();

        QualityReport { metrics, composite, failed_minimums }
    }

    pub fn is_high_quality(&self, report: &QualityReport) -> bool {
        report.composite >= self.config.high_quality_threshold && report.failed_minimums.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

fn distractor_plausibility(valid: usize) -> f64 {
    match valid {
        0 => 0.0,
        1 => 0.4,
        2 => 0.8,
        _ => 1.0,
    }
}

fn question_clarity(text: &str) -> f64 {
    let text = text.trim();
    let mut score: f64 = 1.0;
    if !text.ends_with('?') {
        score -= 0.3;
    }
    let len = text.chars().count();
    if !(MIN_TEXT_LEN..=MAX_TEXT_LEN).contains(&len) {
        score -= 0.2;
    }
    let lower = text.to_lowercase();
    let vague = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| VAGUE_WORDS.contains(w))
        .count();
    score - 0.1 * vague as f64
}

fn answer_uniqueness(question: &CandidateQuestion) -> f64 {
    let repeated = question
        .raw_distractors
        .iter()
        .flatten()
        .any(|d| same_option(d, &question.correct_answer));
    if repeated {
        0.0
    } else {
        1.0 - 0.5 * answer_ambiguity(&question.context)
    }
}

fn difficulty_appropriateness(difficulty: f64, target: f64) -> f64 {
    let gap = (difficulty - target).abs();
    if gap.is_finite() {
        1.0 - gap / APPROPRIATE_GAP
    } else {
        0.0
    }
}

fn factual_correctness(question: &CandidateQuestion) -> f64 {
    let answer = question.correct_answer.trim();
    if answer.is_empty() {
        return 0.0;
    }
    let context = &question.context;
    let mut score: f64 = 1.0;
    if context.season.is_none() && context.year.is_none() {
        score -= 0.3;
    }
    if context.subject.is_none() {
        score -= 0.1;
    }
    let numeric_type = matches!(
        question.question_type,
        QuestionType::AwardAge | QuestionType::StatValue
    );
    if numeric_type && !is_numeric_option(answer) {
        score -= 0.3;
    }
    if question.question_type == QuestionType::AwardAge && !context.has_exact_date {
        score -= 0.2;
    }
    score
}

fn overall_coherence(question: &CandidateQuestion, distractors: &[String]) -> f64 {
    let mut score: f64 = 1.0;
    let numeric = std::iter::once(question.correct_answer.as_str())
        .chain(distractors.iter().map(String::as_str))
        .filter(|o| is_numeric_option(o))
        .count();
    let total = distractors.len() + 1;
    if numeric != 0 && numeric != total {
        score -= 0.5;
    }
    if !question.question_type.options_named_in_text()
        && mentions(&question.question_text, &question.correct_answer)
    {
        score -= 0.5;
    }
    score
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '/'
}

/// True when `needle` appears in `text` as a whole token, ignoring case.
fn mentions(text: &str, needle: &str) -> bool {
    let text = text.to_lowercase();
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    text.match_indices(&needle).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + needle.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}
