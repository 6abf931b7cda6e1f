use crate::collection::Collection;
use crate::models::{
    AdminStats, AnalyticsEvent, ApiKey, Assignment, Dashboard, Developer, DocPage, Experiment,
    Funnel, Game, Player, Sandbox, Sdk, Session, Webhook,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Store
///
/// The process-local "database": one typed `Collection` per record kind,
/// plus the domain query helpers handlers rely on. Everything is cloned out
/// on read and last-write-wins on write; there is no consistency guarantee
/// beyond that. Shared across requests as `Arc<Store>`.
pub struct Store {
    pub developers: Collection<Developer>,
    pub api_keys: Collection<ApiKey>,
    pub webhooks: Collection<Webhook>,
    pub sdks: Collection<Sdk>,
    pub sandboxes: Collection<Sandbox>,
    pub doc_pages: Collection<DocPage>,
    pub games: Collection<Game>,
    pub players: Collection<Player>,
    pub sessions: Collection<Session>,
    pub events: Collection<AnalyticsEvent>,
    pub funnels: Collection<Funnel>,
    pub experiments: Collection<Experiment>,
    pub assignments: Collection<Assignment>,
    pub dashboards: Collection<Dashboard>,
}

/// StoreState
///
/// The concrete type used to share the collection store across the
/// application state.
pub type StoreState = Arc<Store>;

impl Store {
    /// Creates an empty store and seeds the game catalog fixture.
    pub fn new() -> Self {
        let store = Self {
            developers: Collection::new(),
            api_keys: Collection::new(),
            webhooks: Collection::new(),
            sdks: Collection::new(),
            sandboxes: Collection::new(),
            doc_pages: Collection::new(),
            games: Collection::new(),
            players: Collection::new(),
            sessions: Collection::new(),
            events: Collection::new(),
            funnels: Collection::new(),
            experiments: Collection::new(),
            assignments: Collection::new(),
            dashboards: Collection::new(),
        };
        store.seed_catalog();
        store
    }

    /// seed_catalog
    ///
    /// Loads the static game fixtures the recommendation heuristics score
    /// against. Ids are fixed so tests and seeded sandboxes can refer to them.
    fn seed_catalog(&self) {
        for (n, title, genre, tags, popularity, year) in [
            (1u128, "Starforge Tactics", "strategy", vec!["sci-fi", "turn-based", "multiplayer"], 0.82, 2021),
            (2, "Ember Vale", "rpg", vec!["fantasy", "open-world", "story-rich"], 0.91, 2022),
            (3, "Neon Drift", "racing", vec!["arcade", "multiplayer", "synthwave"], 0.67, 2020),
            (4, "Hollow Depths", "roguelike", vec!["dungeon", "permadeath", "pixel-art"], 0.74, 2019),
            (5, "Skybound Saga", "rpg", vec!["fantasy", "co-op", "open-world"], 0.88, 2023),
            (6, "Circuit Breakers", "strategy", vec!["sci-fi", "real-time", "esports"], 0.59, 2021),
            (7, "Meadow Keepers", "simulation", vec!["cozy", "farming", "relaxing"], 0.79, 2022),
            (8, "Iron Vanguard", "shooter", vec!["sci-fi", "multiplayer", "esports"], 0.85, 2020),
            (9, "Whispering Isles", "adventure", vec!["story-rich", "puzzle", "atmospheric"], 0.63, 2018),
            (10, "Gravity Well", "puzzle", vec!["physics", "minimalist", "relaxing"], 0.51, 2023),
        ] {
            let id = Uuid::from_u128(n);
            self.games.insert(
                id,
                Game {
                    id,
                    title: title.to_string(),
                    genre: genre.to_string(),
                    tags: tags.into_iter().map(str::to_string).collect(),
                    popularity,
                    released_year: year,
                },
            );
        }
    }

    /// bootstrap_admin
    ///
    /// Ensures the platform admin account exists with an enterprise key whose
    /// secret comes from configuration. Idempotent: called at every startup.
    pub fn bootstrap_admin(&self, email: &str, key_secret: &str) {
        if self.developer_by_email(email).is_some() {
            return;
        }
        let dev_id = Uuid::new_v4();
        self.developers.insert(
            dev_id,
            Developer {
                id: dev_id,
                email: email.to_string(),
                studio_name: "GameVerse Platform".to_string(),
                role: "admin".to_string(),
                plan: "enterprise".to_string(),
                created_at: Utc::now(),
            },
        );
        let key_id = Uuid::new_v4();
        self.api_keys.insert(
            key_id,
            ApiKey {
                id: key_id,
                developer_id: dev_id,
                name: "bootstrap".to_string(),
                secret: key_secret.to_string(),
                tier: "enterprise".to_string(),
                revoked: false,
                created_at: Utc::now(),
            },
        );
    }

    // --- Identity lookups ---

    pub fn developer_by_email(&self, email: &str) -> Option<Developer> {
        self.developers
            .filter(|d| d.email.eq_ignore_ascii_case(email))
            .into_iter()
            .next()
    }

    /// Resolves the bearer secret from the `x-api-key` header. Revoked keys
    /// resolve to `None`, so they are indistinguishable from unknown ones.
    pub fn find_key_by_secret(&self, secret: &str) -> Option<ApiKey> {
        self.api_keys
            .filter(|k| !k.revoked && k.secret == secret)
            .into_iter()
            .next()
    }

    // --- Catalog ---

    /// Public game listing with optional genre filter and case-insensitive
    /// title search, ordered by popularity descending.
    pub fn list_games(&self, genre: Option<&str>, search: Option<&str>) -> Vec<Game> {
        let needle = search.map(str::to_lowercase);
        let mut games = self.games.filter(|g| {
            let genre_ok = genre.is_none_or(|f| g.genre.eq_ignore_ascii_case(f));
            let search_ok = needle
                .as_deref()
                .is_none_or(|n| g.title.to_lowercase().contains(n));
            genre_ok && search_ok
        });
        games.sort_by(|a, b| {
            b.popularity
                .partial_cmp(&a.popularity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.title.cmp(&b.title))
        });
        games
    }

    // --- Portal scoping ---

    pub fn keys_for(&self, developer_id: Uuid) -> Vec<ApiKey> {
        let mut keys = self.api_keys.filter(|k| k.developer_id == developer_id);
        keys.sort_by_key(|k| k.created_at);
        keys
    }

    pub fn webhooks_for(&self, developer_id: Uuid) -> Vec<Webhook> {
        let mut hooks = self.webhooks.filter(|w| w.developer_id == developer_id);
        hooks.sort_by_key(|w| w.created_at);
        hooks
    }

    /// Ownership-scoped lookup: absence and someone-else's record both
    /// come back `None`.
    pub fn webhook_of(&self, developer_id: Uuid, id: Uuid) -> Option<Webhook> {
        self.webhooks
            .get(id)
            .filter(|w| w.developer_id == developer_id)
    }

    pub fn sandboxes_for(&self, developer_id: Uuid) -> Vec<Sandbox> {
        let mut boxes = self.sandboxes.filter(|s| s.developer_id == developer_id);
        boxes.sort_by_key(|s| s.created_at);
        boxes
    }

    pub fn sandbox_of(&self, developer_id: Uuid, id: Uuid) -> Option<Sandbox> {
        self.sandboxes
            .get(id)
            .filter(|s| s.developer_id == developer_id)
    }

    pub fn published_sdks(&self) -> Vec<Sdk> {
        let mut sdks = self.sdks.filter(|s| s.published);
        sdks.sort_by(|a, b| a.name.cmp(&b.name));
        sdks
    }

    pub fn published_docs(&self) -> Vec<DocPage> {
        let mut pages = self.doc_pages.filter(|p| p.published);
        pages.sort_by(|a, b| a.slug.cmp(&b.slug));
        pages
    }

    pub fn doc_by_slug(&self, slug: &str) -> Option<DocPage> {
        self.doc_pages
            .filter(|p| p.slug == slug)
            .into_iter()
            .next()
    }

    // --- Analytics scoping ---

    pub fn player_of(&self, developer_id: Uuid, id: Uuid) -> Option<Player> {
        self.players
            .get(id)
            .filter(|p| p.developer_id == developer_id)
    }

    pub fn players_for(
        &self,
        developer_id: Uuid,
        platform: Option<&str>,
        country: Option<&str>,
    ) -> Vec<Player> {
        let mut players = self.players.filter(|p| {
            p.developer_id == developer_id
                && platform.is_none_or(|f| p.platform.eq_ignore_ascii_case(f))
                && country.is_none_or(|f| {
                    p.country
                        .as_deref()
                        .is_some_and(|c| c.eq_ignore_ascii_case(f))
                })
        });
        players.sort_by_key(|p| p.created_at);
        players
    }

    pub fn session_of(&self, developer_id: Uuid, id: Uuid) -> Option<Session> {
        self.sessions
            .get(id)
            .filter(|s| s.developer_id == developer_id)
    }

    pub fn sessions_for(&self, developer_id: Uuid, player_id: Option<Uuid>) -> Vec<Session> {
        let mut sessions = self.sessions.filter(|s| {
            s.developer_id == developer_id && player_id.is_none_or(|p| s.player_id == p)
        });
        sessions.sort_by_key(|s| s.started_at);
        sessions
    }

    pub fn events_for(
        &self,
        developer_id: Uuid,
        name: Option<&str>,
        player_id: Option<Uuid>,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Vec<AnalyticsEvent> {
        let mut events = self.events.filter(|e| {
            e.developer_id == developer_id
                && name.is_none_or(|n| e.name == n)
                && player_id.is_none_or(|p| e.player_id == p)
                && since.is_none_or(|t| e.occurred_at >= t)
                && until.is_none_or(|t| e.occurred_at <= t)
        });
        events.sort_by_key(|e| e.occurred_at);
        events
    }

    pub fn funnel_of(&self, developer_id: Uuid, id: Uuid) -> Option<Funnel> {
        self.funnels
            .get(id)
            .filter(|f| f.developer_id == developer_id)
    }

    pub fn experiment_of(&self, developer_id: Uuid, id: Uuid) -> Option<Experiment> {
        self.experiments
            .get(id)
            .filter(|e| e.developer_id == developer_id)
    }

    pub fn assignments_for(&self, experiment_id: Uuid) -> Vec<Assignment> {
        self.assignments
            .filter(|a| a.experiment_id == experiment_id)
    }

    pub fn dashboard_of(&self, developer_id: Uuid, id: Uuid) -> Option<Dashboard> {
        self.dashboards
            .get(id)
            .filter(|d| d.developer_id == developer_id)
    }

    // --- Recommendation inputs ---

    /// All (player, game) play pairs for a developer, extracted from
    /// "game_played" events whose `properties.game_id` parses as a UUID.
    pub fn plays_for(&self, developer_id: Uuid) -> Vec<(Uuid, Uuid)> {
        self.events
            .filter(|e| e.developer_id == developer_id && e.name == "game_played")
            .into_iter()
            .filter_map(|e| {
                let game_id = e
                    .properties
                    .get("game_id")
                    .and_then(|v| v.as_str())
                    .and_then(|s| Uuid::parse_str(s).ok())?;
                Some((e.player_id, game_id))
            })
            .collect()
    }

    /// The set of catalog games a single player has played.
    pub fn played_games(&self, developer_id: Uuid, player_id: Uuid) -> HashSet<Uuid> {
        self.plays_for(developer_id)
            .into_iter()
            .filter(|(p, _)| *p == player_id)
            .map(|(_, g)| g)
            .collect()
    }

    // --- Aggregates ---

    /// Compiles the platform-wide counters for the admin dashboard.
    pub fn admin_stats(&self) -> AdminStats {
        AdminStats {
            total_developers: self.developers.len() as i64,
            total_keys: self.api_keys.len() as i64,
            total_webhooks: self.webhooks.len() as i64,
            total_players: self.players.len() as i64,
            total_sessions: self.sessions.len() as i64,
            total_events: self.events.len() as i64,
            unpublished_sdks: self.sdks.filter(|s| !s.published).len() as i64,
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// paginate
///
/// Shared listing pagination: `limit` defaults to 50 and is capped at 200,
/// `offset` defaults to 0. Applied after filtering and sorting.
pub fn paginate<T>(records: Vec<T>, limit: Option<usize>, offset: Option<usize>) -> Vec<T> {
    let limit = limit.unwrap_or(50).min(200);
    let offset = offset.unwrap_or(0);
    records.into_iter().skip(offset).take(limit).collect()
}
