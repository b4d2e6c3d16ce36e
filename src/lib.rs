//! # football_quiz_gen
//!
//! An offline, deterministic football trivia quiz generator with per-user
//! difficulty calibration.
//!
//! The library turns read-only competition records (award winners, season
//! stat leaders, match results) into multiple-choice questions. Every
//! question that reaches a user has exactly one defensible answer and
//! plausible distractors, and each quiz is pitched at a difficulty that
//! follows the user's recent success rate.
//!
//! ## How it works
//!
//! 1. Build a [`QuizEngine`] from a [`ContentSource`], a [`HistoryStore`] and
//!    an [`EngineConfig`].
//! 2. Call [`QuizEngine::generate_quiz`] with a [`QuizRequest`]. The engine
//!    asks the target controller for a difficulty, runs every generator over
//!    the competition's records, drops candidates the validator or the
//!    quality floor reject, scores the rest and picks the ones closest to the
//!    target.
//! 3. After the user answers, call [`QuizEngine::track_question_performance`]
//!    so the next quiz can adapt.
//!
//! ## Key features
//!
//! - **Deterministic**: `QuizRequest::seeded(u64)` reproduces the same quiz
//!   for the same content, which is what the tests rely on.
//! - **Ambiguity guards**: repeat award winners get "first win", "most recent
//!   win" or "win count" questions instead of an ambiguous "which season".
//! - **Pluggable predictor**: attach a learned [`DifficultyPredictor`]; its
//!   first failure switches the engine to the weighted formula for good.
//!
//! ## Quick start
//!
//! ```rust
//! use football_quiz_gen::{
//!     ContentRecord, EngineConfig, InMemoryContent, InMemoryHistoryStore, QuizEngine,
//!     QuizRequest, RecordCategory,
//! };
//!
//! let mut content = InMemoryContent::new();
//! content.insert(
//!     "premier-league",
//!     RecordCategory::MatchResults,
//!     [ContentRecord::new()
//!         .with("home_team", "Liverpool")
//!         .with("away_team", "Manchester City")
//!         .with("home_score", 3)
//!         .with("away_score", 2)
//!         .with("season", "2013-14")
//!         .with("date", "2014-04-13")],
//! );
//!
//! let mut engine = QuizEngine::new(content, InMemoryHistoryStore::new(), EngineConfig::default());
//! let quiz = engine
//!     .generate_quiz(QuizRequest::new("premier-league", 2).seeded(42))
//!     .unwrap();
//!
//! for q in &quiz {
//!     println!("{} {:?} (answer: {})", q.question_text, q.options, q.correct_answer);
//! }
//! ```

pub mod quiz_engine;

// Convenience re-exports so callers can use `football_quiz_gen::QuizEngine`
// directly without reaching into `quiz_engine::`.
pub use quiz_engine::{
    CachedContentSource, CandidateQuestion, ConfigError, ContentError, ContentRecord,
    ContentSource, DifficultyLevel, DifficultyPredictor, EngineConfig, EngineError,
    FinalQuestion, HistoryStore, InMemoryContent, InMemoryHistoryStore, PredictorError,
    QuestionType, QuizEngine, QuizRequest, RecordCategory, RecordFilter,
    UserPerformanceTracker,
};

#[cfg(test)]
mod tests;
