//! Picks the final questions of one quiz.
//!
//! Candidates go through validation, difficulty scoring and the quality
//! floor in that order. Survivors are stable-sorted by distance to the
//! target difficulty and taken closest-first, skipping repeated question
//! text. Any slots left are backfilled from the remaining survivors in random
//! order. Running short is not an error; the quiz is simply shorter.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::RngCore;
use tracing::debug;

use crate::quiz_engine::{
    config::{EngineConfig, SelectionConfig},
    helpers::{clean_distractors, sample_distractors},
    models::{CandidateQuestion, DifficultyLevel, FinalQuestion},
    quality::QualityScorer,
    scorer::DifficultyScorer,
    tracker::UserPerformanceTracker,
    validator::DistractorValidator,
};

/// A candidate that passed validation and the quality floor.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: CandidateQuestion,
    /// Personalised difficulty in [0, 1].
    pub difficulty: f64,
    pub quality: f64,
}

impl ScoredCandidate {
    fn gap(&self, target: f64) -> f64 {
        (self.difficulty - target).abs()
    }
}

#[derive(Debug, Clone)]
pub struct SelectionEngine {
    validator: DistractorValidator,
    quality: QualityScorer,
    config: SelectionConfig,
}

impl SelectionEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            validator: DistractorValidator::new(&config.validator),
            quality: QualityScorer::new(&config.quality),
            config: config.selection.clone(),
        }
    }

    /// Full pipeline: [`evaluate`](Self::evaluate) then [`pick`](Self::pick).
    pub fn select(
        &self,
        candidates: Vec<CandidateQuestion>,
        target: f64,
        num_questions: usize,
        scorer: &mut DifficultyScorer,
        tracker: Option<&UserPerformanceTracker>,
        rng: &mut StdRng,
    ) -> Vec<FinalQuestion> {
        let survivors = self.evaluate(candidates, target, scorer, tracker);
        self.pick(survivors, target, num_questions, rng)
    }

    /// Validate, score and filter candidates, keeping generation order.
    pub fn evaluate(
        &self,
        candidates: Vec<CandidateQuestion>,
        target: f64,
        scorer: &mut DifficultyScorer,
        tracker: Option<&UserPerformanceTracker>,
    ) -> Vec<ScoredCandidate> {
        let mut survivors = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let validation = self.validator.validate_candidate(&candidate);
            if !validation.is_valid {
                debug!(
                    question_type = %candidate.question_type,
                    score = validation.quality_score,
                    worst = ?validation.worst_severity(),
                    "validation rejected candidate"
                );
                continue;
            }

            let difficulty = scorer.difficulty_for(&candidate, tracker);
            let quality = self.quality.score_question(&candidate, difficulty, target);
            if quality < self.config.quality_floor {
                debug!(question_type = %candidate.question_type, quality, "below quality floor");
                continue;
            }
            survivors.push(ScoredCandidate { candidate, difficulty, quality });
        }
        survivors
    }

    /// Closest-first walk, then shuffled backfill.
    pub fn pick(
        &self,
        survivors: Vec<ScoredCandidate>,
        target: f64,
        num_questions: usize,
        rng: &mut StdRng,
    ) -> Vec<FinalQuestion> {
        let mut ranked: Vec<usize> = (0..survivors.len()).collect();
        // stable: equal gaps keep generation order
        ranked.sort_by(|a, b| survivors[*a].gap(target).total_cmp(&survivors[*b].gap(target)));

        let mut seen_text: HashSet<&str> = HashSet::new();
        let mut chosen: Vec<usize> = Vec::with_capacity(num_questions);
        let mut taken = vec![false; survivors.len()];

        for &index in &ranked {
            if chosen.len() >= num_questions {
                break;
            }
            if seen_text.insert(survivors[index].candidate.question_text.as_str()) {
                chosen.push(index);
                taken[index] = true;
            }
        }

        if chosen.len() < num_questions {
            let mut leftovers: Vec<usize> = (0..survivors.len()).filter(|i| !taken[*i]).collect();
            leftovers.shuffle(rng);
            for index in leftovers {
                if chosen.len() >= num_questions {
                    break;
                }
                if seen_text.insert(survivors[index].candidate.question_text.as_str()) {
                    chosen.push(index);
                }
            }
        }

        let mut slots: Vec<Option<ScoredCandidate>> = survivors.into_iter().map(Some).collect();
        chosen
            .into_iter()
            .filter_map(|index| slots[index].take())
            .map(|scored| self.finalize(scored, rng))
            .collect()
    }

    fn finalize(&self, scored: ScoredCandidate, rng: &mut StdRng) -> FinalQuestion {
        let ScoredCandidate { candidate, difficulty, quality } = scored;
        let cleaned = clean_distractors(&candidate.correct_answer, &candidate.raw_distractors);
        let distractors = sample_distractors(rng, &cleaned, self.config.max_distractors);

        let mut options = distractors.clone();
        options.push(candidate.correct_answer.clone());
        options.shuffle(rng);

        let difficulty = difficulty.clamp(0.0, 1.0);
        FinalQuestion {
            question_id: format!("{}-{:08X}", candidate.question_type.prefix(), rng.next_u32()),
            question_type: candidate.question_type,
            question_text: candidate.question_text,
            correct_answer: candidate.correct_answer,
            options,
            distractors,
            difficulty_score: difficulty,
            difficulty_level: DifficultyLevel::from_score(difficulty),
            quality_score: quality.clamp(0.0, 1.0),
            context: candidate.context,
        }
    }
}
