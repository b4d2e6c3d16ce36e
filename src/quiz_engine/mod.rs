//! Core quiz engine: candidate generation, validation, difficulty calibration
//! and selection.
//!
//! ## Module overview
//!
//! | Module       | Purpose |
//! |--------------|---------|
//! | `models`     | Shared types: content records, question types, candidates, final questions, requests |
//! | `config`     | `EngineConfig` and its per-component sections, TOML loading |
//! | `error`      | Error enums for content, config, predictor and engine failures |
//! | `helpers`    | Distractor cleaning, numeric offsets, season parsing, squad tokens |
//! | `factors`    | Five-factor difficulty model and its static per-category tables |
//! | `scorer`     | Weighted difficulty score, pluggable predictor, personalisation |
//! | `tracker`    | Per-user answer history, familiarity, blob persistence |
//! | `controller` | Proportional controller proposing the next target difficulty |
//! | `generators` | Ten question generators grouped by record family (awards, stats, matches) |
//! | `validator`  | Distractor and answer checks with severity-weighted penalties |
//! | `quality`    | Six-metric composite quality score |
//! | `selection`  | Closest-to-target selection with text dedupe and backfill |
//! | `content`    | Content store seam, in-memory store, TTL cache decorator |
//! | `engine`     | `QuizEngine`: `generate_quiz` and `track_question_performance` |

pub mod config;
pub mod content;
pub mod controller;
pub mod engine;
pub mod error;
pub mod factors;
pub mod generators;
pub mod helpers;
pub mod models;
pub mod quality;
pub mod scorer;
pub mod selection;
pub mod tracker;
pub mod validator;

pub use config::EngineConfig;
pub use content::{CachedContentSource, ContentSource, InMemoryContent, RecordFilter};
pub use controller::TargetDifficultyController;
pub use engine::QuizEngine;
pub use error::{ConfigError, ContentError, EngineError, PredictorError};
pub use factors::{compute_factors, DifficultyFactors};
pub use models::{
    CandidateQuestion, ContentRecord, DifficultyLevel, FinalQuestion, QuestionContext,
    QuestionType, QuestionVariant, QuizRequest, RecordCategory,
};
pub use quality::{QualityMetric, QualityReport, QualityScorer};
pub use scorer::{DifficultyPredictor, DifficultyScorer, FeatureVector};
pub use selection::SelectionEngine;
pub use tracker::{HistoryStore, InMemoryHistoryStore, UserPerformanceTracker};
pub use validator::{DistractorValidator, Severity, ValidationResult};
