use crate::{
    AppState,
    auth::AuthDev,
    error::ApiError,
    models::{Game, Recommendation, SimilarGame, Strategy},
    scoring,
    store::paginate,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use uuid::Uuid;

/// GameFilter
///
/// Accepted query parameters for the public catalog listing (GET /games).
#[derive(Deserialize, utoipa::IntoParams)]
pub struct GameFilter {
    /// Optional exact genre filter (case-insensitive).
    pub genre: Option<String>,
    /// Optional case-insensitive substring match on the title.
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// RecommendQuery
///
/// Accepted query parameters for the recommendation endpoint.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct RecommendQuery {
    /// Scoring strategy; defaults to collaborative.
    pub strategy: Option<Strategy>,
    pub limit: Option<usize>,
}

/// SimilarQuery
#[derive(Deserialize, utoipa::IntoParams)]
pub struct SimilarQuery {
    pub limit: Option<usize>,
}

/// get_games
///
/// [Public Route] Lists the game catalog with genre filtering, title search
/// and pagination, ordered by popularity descending.
#[utoipa::path(
    get,
    path = "/games",
    params(GameFilter),
    responses((status = 200, description = "Catalog games", body = [Game]))
)]
pub async fn get_games(
    State(state): State<AppState>,
    Query(filter): Query<GameFilter>,
) -> Json<Vec<Game>> {
    let games = state
        .store
        .list_games(filter.genre.as_deref(), filter.search.as_deref());
    Json(paginate(games, filter.limit, filter.offset))
}

/// get_game
///
/// [Public Route] Retrieves a single catalog entry by id.
#[utoipa::path(
    get,
    path = "/games/{id}",
    params(("id" = Uuid, Path, description = "Game ID")),
    responses(
        (status = 200, description = "Found", body = Game),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Game>, ApiError> {
    state.store.games.get(id).map(Json).ok_or(ApiError::NotFound)
}

/// get_similar_games
///
/// [Authenticated Route] Content-similarity neighbours of a catalog game,
/// scored by genre and tag overlap.
#[utoipa::path(
    get,
    path = "/games/{id}/similar",
    params(("id" = Uuid, Path, description = "Game ID"), SimilarQuery),
    responses(
        (status = 200, description = "Similar games", body = [SimilarGame]),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_similar_games(
    _auth: AuthDev,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SimilarQuery>,
) -> Result<Json<Vec<SimilarGame>>, ApiError> {
    let reference = state.store.games.get(id).ok_or(ApiError::NotFound)?;

    let mut similar: Vec<SimilarGame> = state
        .store
        .games
        .filter(|g| g.id != reference.id)
        .into_iter()
        .map(|candidate| SimilarGame {
            game_id: candidate.id,
            score: scoring::content_score(&reference, &candidate),
            title: candidate.title,
        })
        .collect();

    similar.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.title.cmp(&b.title))
    });
    similar.truncate(query.limit.unwrap_or(5).min(50));
    Ok(Json(similar))
}

/// get_recommendations
///
/// [Authenticated Route] Personalized recommendations for one of the
/// caller's players. The strategy query parameter selects the heuristic;
/// games the player already played are always excluded.
#[utoipa::path(
    get,
    path = "/recommendations/{player_id}",
    params(("player_id" = Uuid, Path, description = "Player ID"), RecommendQuery),
    responses(
        (status = 200, description = "Scored recommendations", body = [Recommendation]),
        (status = 404, description = "Unknown player")
    )
)]
pub async fn get_recommendations(
    AuthDev { developer_id, .. }: AuthDev,
    State(state): State<AppState>,
    Path(player_id): Path<Uuid>,
    Query(query): Query<RecommendQuery>,
) -> Result<Json<Vec<Recommendation>>, ApiError> {
    // Ownership-scoped lookup: another developer's player is a 404.
    state
        .store
        .player_of(developer_id, player_id)
        .ok_or(ApiError::NotFound)?;

    let catalog = state.store.games.all();
    let plays = state.store.plays_for(developer_id);
    let strategy = query.strategy.unwrap_or_default();
    let limit = query.limit.unwrap_or(10).min(50);

    Ok(Json(scoring::recommend(
        &catalog, &plays, player_id, strategy, limit,
    )))
}
