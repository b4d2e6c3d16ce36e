//! Candidate question generators grouped by record family.
//!
//! Every generator has the same shape:
//!
//! ```ignore
//! fn generate(
//!     record: &ContentRecord,
//!     related: &[ContentRecord],
//!     ctx: &GeneratorContext<'_>,
//!     rng: &mut StdRng,
//! ) -> Option<CandidateQuestion>
//! ```
//!
//! `related` is every record returned by the same query (same competition and
//! award/stat name), which is where distractors and ambiguity checks come
//! from. `None` means the record cannot produce a sound question; it is a
//! skip, not an error.

use rand::rngs::StdRng;
use tracing::debug;

use crate::quiz_engine::models::{CandidateQuestion, ContentRecord, QuestionType};

/// AS, AW, AT, AN, AA
pub mod awards;
/// SV, SL, SC
pub mod stats;
/// MW, MS
pub mod matches;

/// What a generator knows beyond its records.
#[derive(Debug, Clone)]
pub struct GeneratorContext<'a> {
    pub competition_id: &'a str,
    /// Award or statistic name the records were queried by; empty for matches.
    pub name: &'a str,
    pub min_age: i64,
    pub max_age: i64,
}

pub type GeneratorFn = fn(
    &ContentRecord,
    &[ContentRecord],
    &GeneratorContext<'_>,
    &mut StdRng,
) -> Option<CandidateQuestion>;

/// Lookup table from question type to its generator.
pub fn generator_for(question_type: QuestionType) -> GeneratorFn {
    match question_type {
        QuestionType::AwardSeason      => awards::season,
        QuestionType::AwardWinner      => awards::winner,
        QuestionType::AwardTeam        => awards::team,
        QuestionType::AwardNationality => awards::nationality,
        QuestionType::AwardAge         => awards::age,
        QuestionType::StatValue        => stats::value,
        QuestionType::StatLeader       => stats::leader,
        QuestionType::StatComparison   => stats::comparison,
        QuestionType::MatchWinner      => matches::winner,
        QuestionType::MatchScore       => matches::score,
    }
}

/// Run one generator over every record of a query result, in record order.
pub fn generate_candidates(
    question_type: QuestionType,
    records: &[ContentRecord],
    ctx: &GeneratorContext<'_>,
    rng: &mut StdRng,
) -> Vec<CandidateQuestion> {
    let generate = generator_for(question_type);
    let mut out = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match generate(record, records, ctx, rng) {
            Some(candidate) => out.push(candidate),
            None => debug!(%question_type, index, name = ctx.name, "generator skipped record"),
        }
    }
    out
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::fixtures;
    use rand::SeedableRng;

    #[test]
    fn dispatch_covers_every_type() {
        let mut rng = StdRng::seed_from_u64(1);
        let records = fixtures::golden_boot();
        let ctx = fixtures::ctx("Golden Boot");
        for question_type in QuestionType::for_category(crate::quiz_engine::models::RecordCategory::AwardWinners) {
            let out = generate_candidates(question_type, &records, &ctx, &mut rng);
            assert!(!out.is_empty(), "{question_type:?} produced nothing");
            assert!(out.iter().all(|c| c.question_type == question_type));
        }
    }

    #[test]
    fn skipped_records_do_not_abort_the_batch() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut records = fixtures::golden_boot();
        records.push(ContentRecord::new().with("season", "2019-20"));
        let ctx = fixtures::ctx("Golden Boot");
        let out = generate_candidates(QuestionType::AwardWinner, &records, &ctx, &mut rng);
        assert_eq!(out.len(), 6);
    }
}
