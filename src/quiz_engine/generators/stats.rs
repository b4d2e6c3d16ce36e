use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::quiz_engine::{
    factors::stat_complexity,
    generators::GeneratorContext,
    helpers::{format_number, offset_distractors, same_option, scaled_distractors, season_event_year, unique_pool},
    models::{CandidateQuestion, ContentRecord, QuestionContext, QuestionType},
};

const SMALL_VALUE_DELTAS: &[i64] = &[-3, -2, -1, 1, 2, 3];
const SCALE_FACTORS: &[f64] = &[0.8, 1.2, 1.5];
/// Integer stats below this use additive offsets; multiplicative ones would collide.
const SMALL_VALUE_LIMIT: f64 = 10.0;

fn stat_name(record: &ContentRecord, ctx: &GeneratorContext<'_>) -> String {
    record.text("stat").unwrap_or_else(|| ctx.name.to_string())
}

/// "progressive_passes" → "progressive passes"
fn display_stat(stat: &str) -> String {
    stat.replace('_', " ").to_lowercase()
}

fn stat_context(
    question_type: QuestionType,
    record: &ContentRecord,
    ctx: &GeneratorContext<'_>,
    stat: &str,
) -> QuestionContext {
    let mut context = QuestionContext::new(question_type, ctx.competition_id);
    context.season = record.text("season");
    context.year = context.season.as_deref().and_then(season_event_year);
    context.subject = record.text("player");
    context.popularity = record.number("popularity");
    context.stat_complexity = Some(stat_complexity(stat));
    context.extra.insert("stat".into(), stat.into());
    if let Some(squad) = record.text("squad") {
        context.extra.insert("squad".into(), squad.into());
    }
    context
}

fn in_season<'a>(related: &'a [ContentRecord], season: &'a str) -> impl Iterator<Item = &'a ContentRecord> {
    related.iter().filter(move |r| {
        r.text("season").map(|s| same_option(&s, season)).unwrap_or(false)
    })
}

fn is_integral(value: f64) -> bool {
    (value - value.round()).abs() < 1e-9
}

/// True when `related` holds another figure for the same player, stat and
/// season, e.g. split across two clubs after a transfer.
fn has_split_figure(
    related: &[ContentRecord],
    ctx: &GeneratorContext<'_>,
    player: &str,
    season: &str,
    stat: &str,
    value: f64,
) -> bool {
    in_season(related, season).any(|r| {
        r.text("player").map_or(false, |p| same_option(&p, player))
            && same_option(&stat_name(r, ctx), stat)
            && r.number("value").map_or(false, |v| v != value)
    })
}

/// "How many X did P record in S?" Skipped when P has more than one figure
/// for X in S.
pub fn value(
    record: &ContentRecord,
    related: &[ContentRecord],
    ctx: &GeneratorContext<'_>,
    _rng: &mut StdRng,
) -> Option<CandidateQuestion> {
    let player = record.text("player")?;
    let season = record.text("season")?;
    let value = record.number("value")?;
    if value < 0.0 {
        return None;
    }
    let stat = stat_name(record, ctx);
    if has_split_figure(related, ctx, &player, &season, &stat, value) {
        return None;
    }
    let label = display_stat(&stat);

    let (text, answer, distractors) = if is_integral(value) {
        let distractors = if value < SMALL_VALUE_LIMIT {
            offset_distractors(value.round() as i64, SMALL_VALUE_DELTAS, 0..=i64::MAX)
        } else {
            scaled_distractors(value, SCALE_FACTORS, 0.0)
        };
        (
            format!("How many {label} did {player} record in the {season} season?"),
            format_number(value),
            distractors,
        )
    } else {
        (
            format!("What was {player}'s {label} figure in the {season} season?"),
            format!("{:.1}", value),
            scaled_distractors(value, SCALE_FACTORS, 0.0),
        )
    };

    if distractors.len() < QuestionType::StatValue.min_distractors() {
        return None;
    }
    let context = stat_context(QuestionType::StatValue, record, ctx, &stat);
    Some(CandidateQuestion::new(QuestionType::StatValue, text, answer, distractors, context))
}

/// "Who recorded the most X in S?" Asked from the leader's record only, and
/// skipped when the top value is shared.
pub fn leader(
    record: &ContentRecord,
    related: &[ContentRecord],
    ctx: &GeneratorContext<'_>,
    _rng: &mut StdRng,
) -> Option<CandidateQuestion> {
    let player = record.text("player")?;
    let season = record.text("season")?;
    let top = record.number("value")?;

    let mut rivals: Vec<(f64, String)> = in_season(related, &season)
        .filter_map(|r| Some((r.number("value")?, r.text("player")?)))
        .filter(|(_, p)| !same_option(p, &player))
        .collect();
    if rivals.iter().any(|(v, _)| *v >= top) {
        return None;
    }
    rivals.sort_by(|a, b| b.0.total_cmp(&a.0));

    let distractors = unique_pool(&player, rivals.into_iter().map(|(_, p)| p));
    if distractors.len() < QuestionType::StatLeader.min_distractors() {
        return None;
    }
    let stat = stat_name(record, ctx);
    let mut context = stat_context(QuestionType::StatLeader, record, ctx, &stat);
    context.significance = Some(0.6);
    Some(CandidateQuestion::new(
        QuestionType::StatLeader,
        format!("Who recorded the most {} in the {season} season?", display_stat(&stat)),
        player,
        distractors,
        context,
    ))
}

/// "Who recorded more X in S: A or B?" The only distractor is the other name.
pub fn comparison(
    record: &ContentRecord,
    related: &[ContentRecord],
    ctx: &GeneratorContext<'_>,
    rng: &mut StdRng,
) -> Option<CandidateQuestion> {
    let player = record.text("player")?;
    let season = record.text("season")?;
    let mine = record.number("value")?;

    let partners: Vec<(String, f64)> = in_season(related, &season)
        .filter_map(|r| Some((r.text("player")?, r.number("value")?)))
        .filter(|(p, v)| !same_option(p, &player) && (v - mine).abs() > 1e-9)
        .collect();
    let (partner, theirs) = partners.choose(rng)?.clone();

    let (winner, loser) = if mine > theirs {
        (player.clone(), partner.clone())
    } else {
        (partner.clone(), player.clone())
    };
    let (first, second) = if rng.gen_bool(0.5) {
        (player, partner)
    } else {
        (partner, player)
    };

    let stat = stat_name(record, ctx);
    let mut context = stat_context(QuestionType::StatComparison, record, ctx, &stat);
    context.extra.insert("compared_with".into(), loser.clone().into());
    Some(CandidateQuestion::new(
        QuestionType::StatComparison,
        format!(
            "Who recorded more {} in the {season} season: {first} or {second}?",
            display_stat(&stat)
        ),
        winner,
        vec![loser],
        context,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz_engine::generators::fixtures::{ctx, stat};
    use crate::quiz_engine::helpers::clean_distractors;
    use rand::SeedableRng;

    fn goals() -> Vec<ContentRecord> {
        vec![
            stat("Erling Haaland", "2022-23", "goals", 36.0),
            stat("Harry Kane", "2022-23", "goals", 30.0),
            stat("Ivan Toney", "2022-23", "goals", 20.0),
            stat("Mohamed Salah", "2022-23", "goals", 19.0),
            stat("Mohamed Salah", "2021-22", "goals", 23.0),
        ]
    }

    #[test]
    fn large_values_use_multiplicative_offsets() {
        let records = goals();
        let mut rng = StdRng::seed_from_u64(1);
        let q = value(&records[0], &records, &ctx("goals"), &mut rng).unwrap();
        assert_eq!(q.correct_answer, "36");
        assert_eq!(clean_distractors("36", &q.raw_distractors), vec!["29", "43", "54"]);
        assert_eq!(q.context.stat_complexity, Some(0.2));
    }

    #[test]
    fn small_values_use_additive_offsets() {
        let records = vec![stat("Kevin De Bruyne", "2019-20", "red_cards", 1.0)];
        let mut rng = StdRng::seed_from_u64(1);
        let q = value(&records[0], &records, &ctx("red_cards"), &mut rng).unwrap();
        assert_eq!(q.question_text, "How many red cards did Kevin De Bruyne record in the 2019-20 season?");
        assert_eq!(clean_distractors("1", &q.raw_distractors), vec!["0", "2", "3", "4"]);
    }

    #[test]
    fn split_season_figures_are_skipped() {
        let inter = stat("Romelu Lukaku", "2022-23", "goals", 14.0).with("squad", "Inter");
        let chelsea = stat("Romelu Lukaku", "2022-23", "goals", 3.0).with("squad", "Chelsea");
        let records = vec![inter, chelsea, stat("Romelu Lukaku", "2021-22", "goals", 8.0)];
        let mut rng = StdRng::seed_from_u64(1);
        assert!(value(&records[0], &records, &ctx("goals"), &mut rng).is_none());
        assert!(value(&records[1], &records, &ctx("goals"), &mut rng).is_none());
        // another season is unaffected
        let q = value(&records[2], &records, &ctx("goals"), &mut rng).unwrap();
        assert_eq!(q.correct_answer, "8");
    }

    #[test]
    fn fractional_values_keep_one_decimal() {
        let records = vec![stat("Mohamed Salah", "2021-22", "xg", 24.2)];
        let mut rng = StdRng::seed_from_u64(1);
        let q = value(&records[0], &records, &ctx("xg"), &mut rng).unwrap();
        assert_eq!(q.correct_answer, "24.2");
        assert_eq!(clean_distractors("24.2", &q.raw_distractors), vec!["19.4", "29.0", "36.3"]);
    }

    #[test]
    fn leader_question_only_from_leader() {
        let records = goals();
        let mut rng = StdRng::seed_from_u64(1);
        let c = ctx("goals");
        let q = leader(&records[0], &records, &c, &mut rng).unwrap();
        assert_eq!(q.correct_answer, "Erling Haaland");
        assert_eq!(
            clean_distractors(&q.correct_answer, &q.raw_distractors),
            vec!["Harry Kane", "Ivan Toney", "Mohamed Salah"]
        );
        assert!(leader(&records[1], &records, &c, &mut rng).is_none());
    }

    #[test]
    fn shared_lead_is_skipped() {
        let mut records = goals();
        records.push(stat("Son Heung-min", "2022-23", "goals", 36.0));
        let mut rng = StdRng::seed_from_u64(1);
        assert!(leader(&records[0], &records, &ctx("goals"), &mut rng).is_none());
    }

    #[test]
    fn comparison_offers_exactly_the_losing_option() {
        let records = goals();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let q = comparison(&records[1], &records, &ctx("goals"), &mut rng).unwrap();
            let distractors = clean_distractors(&q.correct_answer, &q.raw_distractors);
            assert_eq!(distractors.len(), 1);
            assert!(q.question_text.contains("Harry Kane"));
            if distractors[0] == "Harry Kane" {
                assert_eq!(q.correct_answer, "Erling Haaland");
            } else {
                assert_eq!(q.correct_answer, "Harry Kane");
            }
        }
    }

    #[test]
    fn comparison_ignores_other_seasons_and_ties() {
        let records = vec![
            stat("Mohamed Salah", "2021-22", "goals", 23.0),
            stat("Son Heung-min", "2021-22", "goals", 23.0),
            stat("Harry Kane", "2020-21", "goals", 23.0),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        assert!(comparison(&records[0], &records, &ctx("goals"), &mut rng).is_none());
    }
}
