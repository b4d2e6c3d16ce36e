//! Entry points: build a quiz for a competition, record how a user did.

use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, warn};

use crate::quiz_engine::{
    config::EngineConfig,
    content::{name_field, ContentSource, RecordFilter},
    controller::TargetDifficultyController,
    error::{ContentError, EngineError},
    generators::{generate_candidates, GeneratorContext},
    models::{CandidateQuestion, FinalQuestion, QuestionType, QuizRequest, RecordCategory},
    scorer::{DifficultyPredictor, DifficultyScorer},
    selection::SelectionEngine,
    tracker::{load_tracker, save_tracker, HistoryStore},
};

/// Owns one content source, one history store and the scoring pipeline.
///
/// The difficulty scorer lives as long as the engine, so a predictor that
/// fails once stays off for every later quiz.
pub struct QuizEngine<S: ContentSource, H: HistoryStore> {
    content: S,
    history: H,
    config: EngineConfig,
    scorer: DifficultyScorer,
    controller: TargetDifficultyController,
    selection: SelectionEngine,
}

impl<S: ContentSource, H: HistoryStore> QuizEngine<S, H> {
    pub fn new(content: S, history: H, config: EngineConfig) -> Self {
        Self {
            scorer: DifficultyScorer::new(&config.difficulty, config.generation.resolved_year()),
            controller: TargetDifficultyController::new(&config.controller),
            selection: SelectionEngine::new(&config),
            content,
            history,
            config,
        }
    }

    pub fn with_predictor(mut self, predictor: Box<dyn DifficultyPredictor>) -> Self {
        self.scorer = self.scorer.with_predictor(predictor);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn content(&self) -> &S {
        &self.content
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn predictor_enabled(&self) -> bool {
        self.scorer.predictor_enabled()
    }

    /// Build up to `num_questions` questions for the request's competition.
    ///
    /// A thin content pool yields a shorter quiz, never an error. Only an
    /// unknown competition or a history store failure is reported.
    pub fn generate_quiz(&mut self, request: QuizRequest) -> Result<Vec<FinalQuestion>, EngineError> {
        let mut rng = match request.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let tracker = match &request.user_id {
            Some(user_id) => Some(load_tracker(&self.history, user_id)?),
            None => None,
        };
        let target = match &tracker {
            Some(t) => self.controller.suggest_next_difficulty(t),
            None => self.controller.default_target(),
        };

        let candidates = self.candidates(&request.competition_id, &mut rng)?;
        let candidate_count = candidates.len();
        let survivors = self
            .selection
            .evaluate(candidates, target, &mut self.scorer, tracker.as_ref());
        let survivor_count = survivors.len();
        let questions = self
            .selection
            .pick(survivors, target, request.num_questions, &mut rng);

        info!(
            competition = %request.competition_id,
            user = request.user_id.as_deref().unwrap_or("-"),
            candidates = candidate_count,
            survivors = survivor_count,
            selected = questions.len(),
            requested = request.num_questions,
            target_difficulty = target,
            "generated quiz"
        );
        Ok(questions)
    }

    /// Append one answer to the user's stored history.
    pub fn track_question_performance(
        &mut self,
        user_id: &str,
        question_id: &str,
        category: &str,
        difficulty_score: f64,
        is_correct: bool,
    ) -> Result<(), EngineError> {
        let mut tracker = load_tracker(&self.history, user_id)?;
        tracker.track_response(question_id, category, difficulty_score, is_correct);
        save_tracker(&mut self.history, &tracker)
    }

    /// Every candidate the competition's content can produce, across all
    /// record categories and award/stat names.
    pub fn candidates(
        &self,
        competition_id: &str,
        rng: &mut StdRng,
    ) -> Result<Vec<CandidateQuestion>, EngineError> {
        let mut out = Vec::new();
        for category in RecordCategory::ALL {
            let filters = match self.filters_for(competition_id, category)? {
                Some(filters) => filters,
                None => continue,
            };
            for filter in filters {
                let mut records = match self.content.get_records(competition_id, category, &filter) {
                    Ok(records) => records,
                    Err(error @ ContentError::UnknownCompetition(_)) => return Err(error.into()),
                    Err(error) => {
                        warn!(%error, %category, name = ?filter.name, "content query failed; skipping");
                        continue;
                    }
                };
                if let Some(limit) = self.config.generation.max_records_per_query {
                    records.truncate(limit);
                }

                let ctx = GeneratorContext {
                    competition_id,
                    name: filter.name.as_deref().unwrap_or(""),
                    min_age: self.config.generation.min_age,
                    max_age: self.config.generation.max_age,
                };
                for question_type in QuestionType::for_category(category) {
                    out.extend(generate_candidates(question_type, &records, &ctx, rng));
                }
            }
        }
        Ok(out)
    }

    /// One filter per award/stat name, or a single unfiltered query for
    /// categories without names. `None` skips the category after a
    /// recoverable failure.
    fn filters_for(
        &self,
        competition_id: &str,
        category: RecordCategory,
    ) -> Result<Option<Vec<RecordFilter>>, EngineError> {
        match self.content.list_names(competition_id, category) {
            Ok(_) if name_field(category).is_none() => Ok(Some(vec![RecordFilter::default()])),
            Ok(names) => Ok(Some(names.into_iter().map(RecordFilter::named).collect())),
            Err(error @ ContentError::UnknownCompetition(_)) => Err(error.into()),
            Err(error) => {
                warn!(%error, %category, "listing names failed; skipping category");
                Ok(None)
            }
        }
    }
}
