use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// Game
///
/// A catalog entry. The catalog is seeded from static fixture data at startup;
/// it is the substrate both for the public browsing endpoints and for the
/// recommendation scoring heuristics.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Game {
    pub id: Uuid,
    pub title: String,
    // Single primary genre, e.g. "rpg" or "strategy". Lowercase by convention.
    pub genre: String,
    // Free-form descriptive tags used by the content-similarity score.
    pub tags: Vec<String>,
    /// Normalized popularity in 0.0..=1.0, part of the fixture data.
    pub popularity: f64,
    pub released_year: i32,
}

/// Strategy
///
/// Which scoring heuristic the recommendation endpoint should run.
/// Deserialized directly from the `strategy` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Strategy {
    /// Co-play overlap with other players ("players like you also played").
    #[default]
    Collaborative,
    /// Genre/tag similarity to the player's own play history.
    Content,
    /// Weighted blend of the two above.
    Hybrid,
}

/// Recommendation
///
/// One scored catalog entry in a recommendation response. Scores are clamped
/// to 0.0..=1.0 and the list is sorted descending (title as the tiebreaker).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Recommendation {
    pub game_id: Uuid,
    pub title: String,
    pub score: f64,
    pub strategy: Strategy,
}

/// SimilarGame
///
/// One entry in the `/games/{id}/similar` response: a catalog neighbour with
/// its content-similarity score against the reference game.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SimilarGame {
    pub game_id: Uuid,
    pub title: String,
    pub score: f64,
}
