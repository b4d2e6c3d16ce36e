//! End-to-end demo of the quiz engine on bundled Premier League data.
//!
//! Run with: `cargo run --example demo`
//! (set `RUST_LOG=debug` to watch skipped and rejected candidates)
//!
//! 1. **Anonymous quiz**: no user history, so the target difficulty is the
//!    configured default.
//! 2. **Feedback loop**: a simulated user answers the quiz; answers are
//!    recorded and the next quiz is pitched at a new target.
//! 3. **Cached content**: the same engine over a TTL-cached source.
//!
//! ## Key concepts demonstrated
//!
//! - `QuizRequest::seeded(u64)` makes the output fully deterministic.
//! - `track_question_performance` feeds the controller and familiarity model.
//! - Every question carries its difficulty score, level and quality score.

use std::time::Duration;

use football_quiz_gen::{
    CachedContentSource, EngineConfig, FinalQuestion, InMemoryContent, InMemoryHistoryStore,
    QuizEngine, QuizRequest,
};
use tracing_subscriber::EnvFilter;

const DATA: &str = include_str!("../data/premier_league.json");
const CONFIG: &str = include_str!("../quiz_engine.toml");
const COMPETITION: &str = "premier-league";

fn print_question(index: usize, q: &FinalQuestion) {
    println!(
        "  {:>2}. [{}] {}  ({} {:.2}, quality {:.2})",
        index + 1,
        q.question_id,
        q.question_text,
        q.difficulty_level,
        q.difficulty_score,
        q.quality_score,
    );
    for option in &q.options {
        let marker = if *option == q.correct_answer { "✓" } else { " " };
        println!("        {marker} {option}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = EngineConfig::from_toml_str(CONFIG)?;
    let content = InMemoryContent::from_json(DATA)?;
    let mut engine = QuizEngine::new(content.clone(), InMemoryHistoryStore::new(), config.clone());

    // ── 1. Anonymous quiz ──────────────────────────────────────────────────
    println!();
    println!("══ Anonymous quiz ══");
    let quiz = engine.generate_quiz(QuizRequest::new(COMPETITION, 6).seeded(42))?;
    for (i, q) in quiz.iter().enumerate() {
        print_question(i, q);
    }

    // ── 2. Feedback loop ───────────────────────────────────────────────────
    // The simulated user gets every easy question right and misses the rest.
    println!();
    println!("══ Feedback loop for user \"sam\" ══");
    for round in 1..=3u64 {
        let quiz = engine.generate_quiz(QuizRequest::new(COMPETITION, 5).seeded(round).for_user("sam"))?;
        let mut correct = 0;
        for q in &quiz {
            let is_correct = q.difficulty_score < 0.4;
            if is_correct {
                correct += 1;
            }
            engine.track_question_performance("sam", &q.question_id, q.question_type.slug(), q.difficulty_score, is_correct)?;
        }
        let mean = quiz.iter().map(|q| q.difficulty_score).sum::<f64>() / quiz.len().max(1) as f64;
        println!("  round {round}: {} questions, mean difficulty {mean:.2}, {correct} correct", quiz.len());
    }

    // ── 3. Cached content ──────────────────────────────────────────────────
    println!();
    println!("══ Cached content source ══");
    let cached = CachedContentSource::new(content, Duration::from_secs(300));
    let mut cached_engine = QuizEngine::new(cached, InMemoryHistoryStore::new(), config);
    let quiz = cached_engine.generate_quiz(QuizRequest::new(COMPETITION, 3).seeded(7))?;
    for (i, q) in quiz.iter().enumerate() {
        print_question(i, q);
    }

    match engine.generate_quiz(QuizRequest::new("serie-a", 3)) {
        Ok(_) => println!("unexpected quiz for unknown competition"),
        Err(error) => println!("\n  unknown competition rejected: {error}"),
    }
    println!();
    Ok(())
}
