use crate::models::{AnalyticsEvent, Game, Recommendation, Strategy, Variant};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

// --- Recommendation heuristics ---
//
// Deliberately simple scoring over catalog metadata and recorded plays.
// These are toy heuristics, not numerical systems: every score lands in
// 0.0..=1.0 and ties break on title so the output is deterministic.

/// content_score
///
/// Similarity between two catalog games: genre match (0.45), tag overlap as
/// Jaccard (0.45), and a small nudge from the candidate's own popularity
/// (0.10) so blockbusters win ties.
pub fn content_score(reference: &Game, candidate: &Game) -> f64 {
    let genre = if reference.genre == candidate.genre {
        0.45
    } else {
        0.0
    };

    let a: HashSet<&str> = reference.tags.iter().map(String::as_str).collect();
    let b: HashSet<&str> = candidate.tags.iter().map(String::as_str).collect();
    let union = a.union(&b).count();
    let jaccard = if union == 0 {
        0.0
    } else {
        a.intersection(&b).count() as f64 / union as f64
    };

    (genre + 0.45 * jaccard + 0.10 * candidate.popularity).clamp(0.0, 1.0)
}

/// collaborative_scores
///
/// "Players like you also played": for every game the target player has not
/// played, count how many co-players (players sharing at least one game with
/// the target) played it, normalized by the largest such count.
pub fn collaborative_scores(
    player_id: Uuid,
    plays: &[(Uuid, Uuid)],
) -> HashMap<Uuid, f64> {
    let mine: HashSet<Uuid> = plays
        .iter()
        .filter(|(p, _)| *p == player_id)
        .map(|(_, g)| *g)
        .collect();

    let neighbours: HashSet<Uuid> = plays
        .iter()
        .filter(|(p, g)| *p != player_id && mine.contains(g))
        .map(|(p, _)| *p)
        .collect();

    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for (p, g) in plays {
        if neighbours.contains(p) && !mine.contains(g) {
            *counts.entry(*g).or_insert(0) += 1;
        }
    }

    let max = counts.values().copied().max().unwrap_or(0) as f64;
    counts
        .into_iter()
        .map(|(g, c)| (g, if max > 0.0 { c as f64 / max } else { 0.0 }))
        .collect()
}

/// recommend
///
/// Runs the selected strategy over the catalog and the developer's play
/// pairs, excluding games the player already played. Output is sorted by
/// score descending with title as the tiebreaker, truncated to `limit`.
///
/// A player with no play history gets popularity-ranked results for every
/// strategy: with nothing to correlate against there is nothing better to do.
pub fn recommend(
    catalog: &[Game],
    plays: &[(Uuid, Uuid)],
    player_id: Uuid,
    strategy: Strategy,
    limit: usize,
) -> Vec<Recommendation> {
    let played: HashSet<Uuid> = plays
        .iter()
        .filter(|(p, _)| *p == player_id)
        .map(|(_, g)| *g)
        .collect();

    let played_games: Vec<&Game> = catalog.iter().filter(|g| played.contains(&g.id)).collect();
    let collab = collaborative_scores(player_id, plays);

    let mut scored: Vec<Recommendation> = catalog
        .iter()
        .filter(|g| !played.contains(&g.id))
        .map(|candidate| {
            let content = played_games
                .iter()
                .map(|p| content_score(p, candidate))
                .fold(0.0_f64, f64::max);
            let collaborative = collab.get(&candidate.id).copied().unwrap_or(0.0);

            let score = if played.is_empty() {
                candidate.popularity
            } else {
                match strategy {
                    Strategy::Collaborative => collaborative,
                    Strategy::Content => content,
                    Strategy::Hybrid => 0.6 * collaborative + 0.4 * content,
                }
            };

            Recommendation {
                game_id: candidate.id,
                title: candidate.title.clone(),
                score: score.clamp(0.0, 1.0),
                strategy,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.title.cmp(&b.title))
    });
    scored.truncate(limit);
    scored
}

// --- Churn heuristic ---

/// churn_probability
///
/// The fabricated churn formula: a weighted blend of three normalized risk
/// components — recency (days since last session over a 30-day horizon),
/// inverse frequency (fewer than 20 lifetime sessions is risky) and inverse
/// session length (short sessions under an hour are risky).
pub fn churn_probability(
    days_since_last_session: i64,
    total_sessions: i64,
    avg_session_minutes: f64,
) -> f64 {
    let recency = (days_since_last_session as f64 / 30.0).clamp(0.0, 1.0);
    let infrequency = 1.0 - (total_sessions as f64 / 20.0).clamp(0.0, 1.0);
    let brevity = 1.0 - (avg_session_minutes / 60.0).clamp(0.0, 1.0);

    (0.5 * recency + 0.3 * infrequency + 0.2 * brevity).clamp(0.0, 1.0)
}

/// risk_band
///
/// Coarse banding of a churn probability for dashboard display.
pub fn risk_band(probability: f64) -> &'static str {
    if probability < 0.33 {
        "low"
    } else if probability < 0.66 {
        "medium"
    } else {
        "high"
    }
}

// --- Experiment assignment ---

/// variant_for
///
/// Deterministic bucket assignment: the player id modulo 100 lands in the
/// cumulative-weight range of one variant. Weights are validated to sum to
/// 100 at experiment creation, so the walk always terminates.
pub fn variant_for(player_id: Uuid, variants: &[Variant]) -> &Variant {
    let bucket = (player_id.as_u128() % 100) as u32;
    let mut cumulative = 0;
    for variant in variants {
        cumulative += variant.weight;
        if bucket < cumulative {
            return variant;
        }
    }
    // Unreachable when weights sum to 100; the last variant absorbs rounding.
    variants.last().expect("experiment has no variants")
}

// --- Funnel evaluation ---

/// funnel_counts
///
/// Per-step entrant counts. Each player walks their own events in timestamp
/// order and advances one step at a time; later steps can only be entered
/// after all earlier ones, so counts are monotonically non-increasing.
///
/// `events` must already be sorted by `occurred_at` (the store's
/// `events_for` guarantees this).
pub fn funnel_counts(steps: &[String], events: &[AnalyticsEvent]) -> Vec<i64> {
    let mut progress: HashMap<Uuid, usize> = HashMap::new();
    let mut counts = vec![0i64; steps.len()];

    for event in events {
        let reached = progress.entry(event.player_id).or_insert(0);
        if *reached < steps.len() && steps[*reached] == event.name {
            counts[*reached] += 1;
            *reached += 1;
        }
    }

    counts
}

/// percentage
///
/// Shared percent-of helper, rounded to two decimals. Zero denominators
/// yield 0.0 rather than NaN.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 * 100.0 / whole as f64 * 100.0).round() / 100.0
    }
}
