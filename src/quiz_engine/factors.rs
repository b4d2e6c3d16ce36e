//! Five-factor difficulty model.
//!
//! Each factor is a bounded [0, 1] reading of one source of difficulty:
//! how obscure the subject is, how long ago the event happened, how
//! specialised the statistic is, how fuzzy the answer is and how significant
//! the event was. Inputs are always defaulted, never rejected.

use serde::{Deserialize, Serialize};

use crate::quiz_engine::{config::DifficultyWeights, models::QuestionContext};

/// Unknown subjects count as famous, which biases towards easier scores.
pub const DEFAULT_POPULARITY: f64 = 0.8;
pub const DEFAULT_STAT_COMPLEXITY: f64 = 0.5;
pub const DEFAULT_SIGNIFICANCE: f64 = 0.5;
pub const DEFAULT_AMBIGUITY: f64 = 0.2;
/// Minimum ambiguity for fuzzy categories without an exact date.
pub const FUZZY_AMBIGUITY_FLOOR: f64 = 0.4;
/// Events this many years old reach full time distance.
pub const TIME_HORIZON_YEARS: f64 = 50.0;

/// Categories whose answers are approximations unless backed by an exact date.
pub const FUZZY_CATEGORIES: &[&str] = &["award_age"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyFactors {
    pub player_obscurity: f64,
    pub time_period_distance: f64,
    pub statistical_complexity: f64,
    pub answer_ambiguity: f64,
    pub historical_significance: f64,
}

impl DifficultyFactors {
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.player_obscurity,
            self.time_period_distance,
            self.statistical_complexity,
            self.answer_ambiguity,
            self.historical_significance,
        ]
    }

    /// Weighted sum of the factors, clamped to [0, 1].
    pub fn weighted(&self, weights: &DifficultyWeights) -> f64 {
        let score = self.player_obscurity * weights.player_obscurity
            + self.time_period_distance * weights.time_period_distance
            + self.statistical_complexity * weights.statistical_complexity
            + self.answer_ambiguity * weights.answer_ambiguity
            + self.historical_significance * weights.historical_significance;
        score.clamp(0.0, 1.0)
    }
}

/// Compute all five factors for one question context.
pub fn compute_factors(context: &QuestionContext, current_year: i32) -> DifficultyFactors {
    let popularity = unit_or(context.popularity, DEFAULT_POPULARITY);
    let event_year = context.year.unwrap_or(current_year);
    let years_ago = f64::from((current_year - event_year).max(0));

    DifficultyFactors {
        player_obscurity: 1.0 - popularity,
        time_period_distance: (years_ago / TIME_HORIZON_YEARS).min(1.0),
        statistical_complexity: unit_or(context.stat_complexity, DEFAULT_STAT_COMPLEXITY),
        answer_ambiguity: answer_ambiguity(context),
        historical_significance: unit_or(context.significance, DEFAULT_SIGNIFICANCE),
    }
}

/// The ambiguity factor on its own; also read by the quality scorer.
pub fn answer_ambiguity(context: &QuestionContext) -> f64 {
    let ambiguity = unit_or(context.answer_ambiguity, DEFAULT_AMBIGUITY);
    if FUZZY_CATEGORIES.contains(&context.category.as_str()) && !context.has_exact_date {
        ambiguity.max(FUZZY_AMBIGUITY_FLOOR)
    } else {
        ambiguity
    }
}

fn unit_or(value: Option<f64>, default: f64) -> f64 {
    value
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
        .unwrap_or(default)
}

// ---------------------------------------------------------------------------
// Static per-category tables
// ---------------------------------------------------------------------------

fn normalise_key(name: &str) -> String {
    name.trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}

/// How specialised a statistic is; headline numbers are easy, advanced metrics hard.
pub fn stat_complexity(stat: &str) -> f64 {
    match normalise_key(stat).as_str() {
        "goals" => 0.2,
        "appearances" | "matches_played" => 0.25,
        "assists" => 0.3,
        "minutes" | "minutes_played" => 0.35,
        "yellow_cards" | "red_cards" => 0.35,
        "clean_sheets" => 0.4,
        "penalty_goals" => 0.45,
        "tackles_won" | "interceptions" => 0.5,
        "shots_on_target" => 0.5,
        "key_passes" => 0.6,
        "xg" | "expected_goals" => 0.7,
        "xa" | "expected_assists" => 0.75,
        "pass_completion" | "pass_completion_pct" => 0.7,
        "progressive_carries" => 0.85,
        "progressive_passes" => 0.9,
        _ => DEFAULT_STAT_COMPLEXITY,
    }
}

pub fn award_significance(award: &str) -> f64 {
    let key = normalise_key(award);
    if key.contains("ballon") {
        0.9
    } else if key.contains("young") {
        0.4
    } else if key.contains("golden_boot") || key.contains("top_scorer") {
        0.7
    } else if key.contains("player_of_the_season") || key.contains("player_of_the_year") {
        0.6
    } else {
        DEFAULT_SIGNIFICANCE
    }
}

pub fn match_significance(stage: Option<&str>) -> f64 {
    let Some(stage) = stage else {
        return 0.4;
    };
    let key = normalise_key(stage);
    if key == "final" {
        0.9
    } else if key.contains("semi") {
        0.7
    } else if key.contains("quarter") {
        0.6
    } else {
        0.4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz_engine::models::QuestionType;

    fn ctx(question_type: QuestionType) -> QuestionContext {
        QuestionContext::new(question_type, "premier-league")
    }

    #[test]
    fn unknown_inputs_fall_back_to_defaults() {
        let f = compute_factors(&ctx(QuestionType::AwardSeason), 2024);
        assert!((f.player_obscurity - 0.2).abs() < 1e-9);
        assert_eq!(f.time_period_distance, 0.0);
        assert_eq!(f.statistical_complexity, DEFAULT_STAT_COMPLEXITY);
        assert_eq!(f.answer_ambiguity, DEFAULT_AMBIGUITY);
        assert_eq!(f.historical_significance, DEFAULT_SIGNIFICANCE);
    }

    #[test]
    fn time_distance_saturates_after_fifty_years() {
        let mut c = ctx(QuestionType::MatchWinner);
        c.year = Some(1999);
        assert!((compute_factors(&c, 2024).time_period_distance - 0.5).abs() < 1e-9);
        c.year = Some(1950);
        assert_eq!(compute_factors(&c, 2024).time_period_distance, 1.0);
        c.year = Some(2030);
        assert_eq!(compute_factors(&c, 2024).time_period_distance, 0.0);
    }

    #[test]
    fn age_without_exact_date_is_fuzzy() {
        let mut c = ctx(QuestionType::AwardAge);
        assert_eq!(compute_factors(&c, 2024).answer_ambiguity, FUZZY_AMBIGUITY_FLOOR);
        c.has_exact_date = true;
        assert_eq!(compute_factors(&c, 2024).answer_ambiguity, DEFAULT_AMBIGUITY);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let mut c = ctx(QuestionType::StatValue);
        c.popularity = Some(1.7);
        c.stat_complexity = Some(-3.0);
        c.significance = Some(f64::NAN);
        let f = compute_factors(&c, 2024);
        assert_eq!(f.player_obscurity, 0.0);
        assert_eq!(f.statistical_complexity, 0.0);
        assert_eq!(f.historical_significance, DEFAULT_SIGNIFICANCE);
    }

    #[test]
    fn weighted_score_is_clamped() {
        let f = DifficultyFactors {
            player_obscurity: 1.0,
            time_period_distance: 1.0,
            statistical_complexity: 1.0,
            answer_ambiguity: 1.0,
            historical_significance: 1.0,
        };
        let heavy = DifficultyWeights {
            player_obscurity: 1.0,
            time_period_distance: 1.0,
            statistical_complexity: 1.0,
            answer_ambiguity: 1.0,
            historical_significance: 1.0,
        };
        assert_eq!(f.weighted(&heavy), 1.0);
        assert!((f.weighted(&DifficultyWeights::default()) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn stat_table_orders_headline_below_advanced() {
        assert_eq!(stat_complexity("Goals"), 0.2);
        assert_eq!(stat_complexity("progressive passes"), 0.9);
        assert_eq!(stat_complexity("Progressive-Passes"), 0.9);
        assert_eq!(stat_complexity("throw ins"), DEFAULT_STAT_COMPLEXITY);
        assert!(award_significance("Ballon d'Or") > award_significance("Young Player of the Year"));
        assert_eq!(match_significance(Some("Final")), 0.9);
        assert_eq!(match_significance(None), 0.4);
    }
}
