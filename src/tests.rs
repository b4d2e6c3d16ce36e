//! End-to-end tests for the `football_quiz_gen` crate.
//!
//! Included from `lib.rs` under `#[cfg(test)]`.
//!
//! # Coverage
//!
//! | Group | What is tested |
//! |-------|----------------|
//! | Structural | Answer among options, never among distractors; no duplicate options; scores in [0, 1] |
//! | Determinism | Same seed → identical quiz; factor model is pure |
//! | Multiple winners | Repeat winners never get an ambiguous season question or their own seasons as distractors |
//! | Selection | Closest-first ordering, the 20-candidate scenario, short pools |
//! | Validation | Blank/None/duplicate pool is rejected before selection |
//! | Calibration | Controller step, familiarity discount, predictor disable |
//! | Plumbing | Sample config and data load; cached source behaves like the raw one |

use std::collections::HashSet;
use std::time::Duration;

use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

use crate::quiz_engine::{
    config::{ControllerConfig, EngineConfig},
    content::{CachedContentSource, ContentSource, InMemoryContent, RecordFilter},
    controller::TargetDifficultyController,
    engine::QuizEngine,
    error::PredictorError,
    factors::compute_factors,
    generators::{awards, generate_candidates, GeneratorContext},
    helpers::{clean_distractors, same_option},
    models::{
        CandidateQuestion, ContentRecord, FinalQuestion, QuestionContext, QuestionType,
        QuestionVariant, QuizRequest, RecordCategory,
    },
    scorer::{DifficultyScorer, FeatureVector},
    selection::{ScoredCandidate, SelectionEngine},
    tracker::{load_tracker, InMemoryHistoryStore, UserPerformanceTracker},
    validator::DistractorValidator,
};

// ── helpers ──────────────────────────────────────────────────────────────────

const SAMPLE_DATA: &str = include_str!("../data/premier_league.json");
const COMPETITION: &str = "premier-league";

/// Five seeds that span different RNG states.
const SEEDS: [u64; 5] = [1, 42, 999, 0xDEAD_BEEF, 7];

fn sample_content() -> InMemoryContent {
    InMemoryContent::from_json(SAMPLE_DATA).expect("sample data parses")
}

fn config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.generation.current_year = Some(2024);
    config
}

fn engine() -> QuizEngine<InMemoryContent, InMemoryHistoryStore> {
    QuizEngine::new(sample_content(), InMemoryHistoryStore::new(), config())
}

fn quiz(seed: u64, n: usize) -> Vec<FinalQuestion> {
    engine()
        .generate_quiz(QuizRequest::new(COMPETITION, n).seeded(seed))
        .expect("quiz generates")
}

fn award_ctx(name: &str) -> GeneratorContext<'_> {
    GeneratorContext {
        competition_id: COMPETITION,
        name,
        min_age: 16,
        max_age: 45,
    }
}

fn golden_boot_records() -> Vec<ContentRecord> {
    sample_content()
        .get_records(COMPETITION, RecordCategory::AwardWinners, &RecordFilter::named("Golden Boot"))
        .expect("golden boot records")
}

fn scored(i: usize, difficulty: f64) -> ScoredCandidate {
    let mut context = QuestionContext::new(QuestionType::StatValue, COMPETITION);
    context.season = Some("2022-23".into());
    ScoredCandidate {
        candidate: CandidateQuestion::new(
            QuestionType::StatValue,
            format!("How many goals did player {i} record in the 2022-23 season?"),
            "20",
            vec!["16".into(), "24".into(), "30".into()],
            context,
        ),
        difficulty,
        quality: 0.8,
    }
}

// ── structural ───────────────────────────────────────────────────────────────

#[test]
fn every_question_is_well_formed() {
    for seed in SEEDS {
        let questions = quiz(seed, 12);
        assert!(!questions.is_empty(), "seed {seed} produced nothing");
        for q in &questions {
            assert!(q.options.contains(&q.correct_answer), "{q:?}");
            assert!(!q.distractors.iter().any(|d| same_option(d, &q.correct_answer)), "{q:?}");
            let unique: HashSet<String> = q.options.iter().map(|o| o.to_lowercase()).collect();
            assert_eq!(unique.len(), q.options.len(), "duplicate options in {q:?}");
            assert!((2..=4).contains(&q.options.len()));
            assert!((0.0..=1.0).contains(&q.difficulty_score));
            assert!((0.0..=1.0).contains(&q.quality_score));
        }
    }
}

#[test]
fn question_text_is_never_repeated_in_one_quiz() {
    for seed in SEEDS {
        let questions = quiz(seed, 30);
        let texts: HashSet<&str> = questions.iter().map(|q| q.question_text.as_str()).collect();
        assert_eq!(texts.len(), questions.len());
    }
}

#[test]
fn ids_carry_type_prefix() {
    for q in quiz(3, 20) {
        let prefix = format!("{}-", q.question_type.prefix());
        assert!(q.question_id.starts_with(&prefix), "{}", q.question_id);
        assert_eq!(q.question_id.len(), prefix.len() + 8);
    }
}

#[test]
fn serialised_question_exposes_flat_context() {
    let q = &quiz(5, 1)[0];
    let json = serde_json::to_value(q).unwrap();
    assert_eq!(json["type"], serde_json::json!(q.question_type.slug()));
    assert_eq!(json["question"], serde_json::json!(q.question_text));
    assert_eq!(json["answer"], serde_json::json!(q.correct_answer));
    assert_eq!(json["category"], serde_json::json!(q.question_type.slug()));
    assert_eq!(json["competition_id"], serde_json::json!(COMPETITION));
}

// ── determinism ──────────────────────────────────────────────────────────────

#[test]
fn same_seed_same_quiz() {
    for seed in SEEDS {
        let a = serde_json::to_value(quiz(seed, 8)).unwrap();
        let b = serde_json::to_value(quiz(seed, 8)).unwrap();
        assert_eq!(a, b, "seed {seed} diverged");
    }
}

#[test]
fn different_seeds_vary_the_quiz() {
    let ids: HashSet<String> = SEEDS.iter().map(|s| quiz(*s, 5)[0].question_id.clone()).collect();
    assert!(ids.len() > 1);
}

proptest! {
    #[test]
    fn factors_are_pure_and_bounded(
        popularity in proptest::option::of(-1.0f64..2.0),
        year in proptest::option::of(1900i32..2100),
        complexity in proptest::option::of(-1.0f64..2.0),
        significance in proptest::option::of(-1.0f64..2.0),
        ambiguity in proptest::option::of(-1.0f64..2.0),
        exact_date in any::<bool>(),
        type_index in 0usize..QuestionType::ALL.len(),
    ) {
        let mut context = QuestionContext::new(QuestionType::ALL[type_index], COMPETITION);
        context.popularity = popularity;
        context.year = year;
        context.stat_complexity = complexity;
        context.significance = significance;
        context.answer_ambiguity = ambiguity;
        context.has_exact_date = exact_date;

        let first = compute_factors(&context, 2024);
        let second = compute_factors(&context, 2024);
        prop_assert_eq!(first, second);
        for factor in first.as_array() {
            prop_assert!((0.0..=1.0).contains(&factor));
        }
    }

    #[test]
    fn primary_walk_is_closest_first(
        difficulties in proptest::collection::vec(0.0f64..=1.0, 1..40),
        target in 0.1f64..=0.9,
        n in 1usize..15,
    ) {
        let engine = SelectionEngine::new(&EngineConfig::default());
        let pool: Vec<ScoredCandidate> = difficulties.iter().enumerate().map(|(i, d)| scored(i, *d)).collect();
        let mut rng = StdRng::seed_from_u64(0);
        let out = engine.pick(pool, target, n, &mut rng);

        prop_assert_eq!(out.len(), n.min(difficulties.len()));
        let gaps: Vec<f64> = out.iter().map(|q| (q.difficulty_score - target).abs()).collect();
        for pair in gaps.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn controller_target_stays_in_bounds(
        results in proptest::collection::vec((0.0f64..=1.0, any::<bool>()), 0..30),
        adaptation_factor in 0.0f64..5.0,
    ) {
        let mut tracker = UserPerformanceTracker::new("u");
        for (i, (difficulty, correct)) in results.iter().enumerate() {
            tracker.track_response(format!("q{i}"), "award_winner", *difficulty, *correct);
        }
        let controller = TargetDifficultyController::new(&ControllerConfig {
            adaptation_factor,
            ..ControllerConfig::default()
        });
        let target = controller.suggest_next_difficulty(&tracker);
        prop_assert!((0.1..=0.9).contains(&target));
    }
}

// ── multiple winners ─────────────────────────────────────────────────────────

#[test]
fn repeat_winner_seasons_never_appear_as_distractors() {
    let records = golden_boot_records();
    let ctx = award_ctx("Golden Boot");
    for seed in 0..30 {
        let mut rng = StdRng::seed_from_u64(seed);
        for q in generate_candidates(QuestionType::AwardSeason, &records, &ctx, &mut rng) {
            let Some(subject) = q.context.subject.clone() else { continue };
            let own: Vec<String> = records
                .iter()
                .filter(|r| r.text("player").is_some_and(|p| same_option(&p, &subject)))
                .filter_map(|r| r.text("season"))
                .collect();
            let distractors = clean_distractors(&q.correct_answer, &q.raw_distractors);
            if own.len() > 1 {
                assert!(q.context.variant.is_some(), "plain question for repeat winner: {}", q.question_text);
                assert!(!q.question_text.starts_with(&format!("In which season did {subject} win")));
            }
            for d in &distractors {
                assert!(!own.iter().any(|s| same_option(s, d)), "{subject}'s own season {d} offered");
            }
        }
    }
}

#[test]
fn two_time_winner_variants_have_expected_answers() {
    let records = vec![
        ContentRecord::new().with("player", "Lionel Messi").with("season", "2010-11").with("award", "Pichichi"),
        ContentRecord::new().with("player", "Lionel Messi").with("season", "2015-16").with("award", "Pichichi"),
        ContentRecord::new().with("player", "Cristiano Ronaldo").with("season", "2013-14").with("award", "Pichichi"),
        ContentRecord::new().with("player", "Luis Suarez").with("season", "2016-17").with("award", "Pichichi"),
        ContentRecord::new().with("player", "Karim Benzema").with("season", "2021-22").with("award", "Pichichi"),
    ];
    let ctx = award_ctx("Pichichi");
    let mut seen = HashSet::new();
    for seed in 0..60 {
        let mut rng = StdRng::seed_from_u64(seed);
        let q = awards::season(&records[0], &records, &ctx, &mut rng).expect("variant question");
        let variant = q.context.variant.expect("variant set");
        let expected = match variant {
            QuestionVariant::FirstWin => "2010-11",
            QuestionVariant::LatestWin => "2015-16",
            QuestionVariant::WinCount => "2",
        };
        assert_eq!(q.correct_answer, expected);
        seen.insert(variant);
    }
    assert_eq!(seen.len(), 3, "all three variants should appear across seeds");
}

// ── selection ────────────────────────────────────────────────────────────────

#[test]
fn twenty_spread_candidates_yield_five_closest() {
    let pool: Vec<ScoredCandidate> = (0..20).map(|i| scored(i, i as f64 / 20.0)).collect();
    let engine = SelectionEngine::new(&EngineConfig::default());
    let mut rng = StdRng::seed_from_u64(1);
    let out = engine.pick(pool, 0.5, 5, &mut rng);

    let picked: HashSet<String> = out.iter().map(|q| q.question_text.clone()).collect();
    let expected: HashSet<String> = [8, 9, 10, 11, 12]
        .iter()
        .map(|i| format!("How many goals did player {i} record in the 2022-23 season?"))
        .collect();
    assert_eq!(picked, expected);
    assert_eq!(out[0].question_text, "How many goals did player 10 record in the 2022-23 season?");
}

#[test]
fn distant_pool_is_ranked_not_shuffled() {
    let engine = SelectionEngine::new(&EngineConfig::default());
    for seed in 0..20 {
        let pool: Vec<ScoredCandidate> = [0.0, 0.88, 0.14, 0.95, 1.0]
            .iter()
            .enumerate()
            .map(|(i, d)| scored(i, *d))
            .collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let out = engine.pick(pool, 0.5, 3, &mut rng);
        let difficulties: Vec<f64> = out.iter().map(|q| q.difficulty_score).collect();
        assert_eq!(difficulties, vec![0.14, 0.88, 0.95], "seed {seed}");
    }
}

#[test]
fn thin_pool_returns_short_quiz() {
    let questions = quiz(9, 500);
    assert!(!questions.is_empty());
    assert!(questions.len() < 500);
}

#[test]
fn empty_competition_returns_empty_quiz() {
    let mut content = sample_content();
    content.insert("empty-league", RecordCategory::MatchResults, Vec::new());
    let mut engine = QuizEngine::new(content, InMemoryHistoryStore::new(), config());
    let questions = engine.generate_quiz(QuizRequest::new("empty-league", 5).seeded(1)).unwrap();
    assert!(questions.is_empty());
}

// ── validation ───────────────────────────────────────────────────────────────

#[test]
fn degenerate_pool_is_rejected_before_selection() {
    let context = QuestionContext::new(QuestionType::AwardWinner, COMPETITION);
    let mut candidate = CandidateQuestion::new(
        QuestionType::AwardWinner,
        "Who won the Golden Boot in the 2015-16 season?",
        "B",
        Vec::new(),
        context,
    );
    candidate.raw_distractors = vec![Some(String::new()), None, Some("A".into()), Some("A".into())];

    assert_eq!(clean_distractors("B", &candidate.raw_distractors), vec!["A".to_string()]);
    let result = DistractorValidator::new(&config().validator).validate_candidate(&candidate);
    assert!(!result.is_valid);

    let mut scorer = DifficultyScorer::new(&config().difficulty, 2024);
    let survivors = SelectionEngine::new(&config()).evaluate(vec![candidate], 0.5, &mut scorer, None);
    assert!(survivors.is_empty());
}

// ── calibration ──────────────────────────────────────────────────────────────

#[test]
fn controller_scenario_step() {
    let mut tracker = UserPerformanceTracker::new("u1");
    for i in 0..10 {
        tracker.track_response(format!("q{i}"), "award_season", 0.4, i < 9);
    }
    let controller = TargetDifficultyController::new(&ControllerConfig::default());
    let target = controller.suggest_next_difficulty(&tracker);
    assert!((target - 0.415).abs() < 1e-9, "got {target}");
}

#[test]
fn familiar_category_is_discounted() {
    let mut engine = engine();
    for i in 0..10 {
        engine
            .track_question_performance("fan", &format!("AW-{i:08X}"), "award_winner", 0.5, true)
            .unwrap();
    }
    let tracker = load_tracker(engine.history(), "fan").unwrap();
    assert_eq!(tracker.familiarity("award_winner"), 1.0);

    let mut rng = StdRng::seed_from_u64(4);
    let candidates = engine.candidates(COMPETITION, &mut rng).unwrap();
    let mut scorer = DifficultyScorer::new(&config().difficulty, 2024);
    for c in &candidates {
        let base = scorer.difficulty_for(c, None);
        let personal = scorer.difficulty_for(c, Some(&tracker));
        if c.question_type == QuestionType::AwardWinner {
            // familiarity 1.0 * weight 0.3
            assert!((personal - base * 0.7).abs() < 1e-9);
        } else {
            assert_eq!(personal, base);
        }
    }
}

#[test]
fn predictor_is_used_until_it_fails() {
    use std::cell::Cell;
    use std::rc::Rc;

    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    let predictor = move |features: &FeatureVector| -> Result<f64, PredictorError> {
        seen.set(seen.get() + 1);
        if seen.get() > 3 {
            Err(PredictorError::Failed("model crashed".into()))
        } else {
            Ok(features[0])
        }
    };
    let mut engine = engine().with_predictor(Box::new(predictor));
    engine.generate_quiz(QuizRequest::new(COMPETITION, 10).seeded(1)).unwrap();
    assert!(!engine.predictor_enabled());
    assert_eq!(calls.get(), 4);

    engine.generate_quiz(QuizRequest::new(COMPETITION, 10).seeded(2)).unwrap();
    assert_eq!(calls.get(), 4);
}

// ── plumbing ─────────────────────────────────────────────────────────────────

#[test]
fn sample_config_drives_the_engine() {
    let config = EngineConfig::from_toml_str(include_str!("../quiz_engine.toml")).unwrap();
    let mut engine = QuizEngine::new(sample_content(), InMemoryHistoryStore::new(), config);
    let questions = engine.generate_quiz(QuizRequest::new(COMPETITION, 6).seeded(8)).unwrap();
    assert!(!questions.is_empty());
}

#[test]
fn cached_source_matches_raw_source() {
    let cached = CachedContentSource::new(sample_content(), Duration::from_secs(300));
    let mut raw_engine = engine();
    let mut cached_engine = QuizEngine::new(cached, InMemoryHistoryStore::new(), config());

    let raw = raw_engine.generate_quiz(QuizRequest::new(COMPETITION, 8).seeded(21)).unwrap();
    let first = cached_engine.generate_quiz(QuizRequest::new(COMPETITION, 8).seeded(21)).unwrap();
    let second = cached_engine.generate_quiz(QuizRequest::new(COMPETITION, 8).seeded(21)).unwrap();
    assert_eq!(serde_json::to_value(&raw).unwrap(), serde_json::to_value(&first).unwrap());
    assert_eq!(serde_json::to_value(&first).unwrap(), serde_json::to_value(&second).unwrap());
}

#[test]
fn every_question_type_is_reachable_from_sample_data() {
    let engine = engine();
    let mut rng = StdRng::seed_from_u64(17);
    let candidates = engine.candidates(COMPETITION, &mut rng).unwrap();
    for question_type in QuestionType::ALL {
        assert!(
            candidates.iter().any(|c| c.question_type == question_type),
            "{question_type} missing"
        );
    }
}
