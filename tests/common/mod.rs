#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use serde_json::json;

use vault_api::{
    api::{create_router, AppState},
    error::{AppError, AppResult},
    models::{
        CatalogItem, FavoriteRecord, Identity, MediaKind, MediaSnapshot, MovieId, SeasonDetails,
        Session, TitleDetails, UserId,
    },
    services::{
        AuthProvider, CatalogProvider, Category, FavoritesStore, InMemoryFavorites,
        ListenerHandle, PlaybackService, RetryPolicy, SessionContext, SignOutScope,
        SignUpOutcome,
    },
};

pub const PASSWORD: &str = "hunter22";

/// Auth provider backed by a fixed account table
pub struct FakeAuth {
    session: SessionContext,
    accounts: Mutex<HashMap<String, (String, UserId)>>,
}

impl FakeAuth {
    pub fn new(session: SessionContext) -> Self {
        let accounts = HashMap::from([
            ("u1@example.com".to_string(), (PASSWORD.to_string(), UserId::new("u1"))),
            ("u2@example.com".to_string(), (PASSWORD.to_string(), UserId::new("u2"))),
        ]);
        Self {
            session,
            accounts: Mutex::new(accounts),
        }
    }

    fn open(&self, email: &str, user_id: UserId, recovery: bool) -> Identity {
        let identity = Identity {
            user_id: user_id.clone(),
            email: Some(email.to_string()),
            created_at: None,
        };
        self.session.set_session(Session {
            identity: identity.clone(),
            access_token: format!("access-{}", user_id),
            refresh_token: format!("refresh-{}", user_id),
            expires_at: None,
            recovery,
        });
        identity
    }
}

#[async_trait::async_trait]
impl AuthProvider for FakeAuth {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<SignUpOutcome> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(AppError::Auth("User already registered".to_string()));
        }
        let user_id = UserId::new(format!("user-{}", accounts.len() + 1));
        accounts.insert(email.to_string(), (password.to_string(), user_id));
        Ok(SignUpOutcome::ConfirmationSent)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity> {
        let account = self.accounts.lock().unwrap().get(email).cloned();
        match account {
            Some((stored, user_id)) if stored == password => Ok(self.open(email, user_id, false)),
            _ => Err(AppError::Auth("Invalid login credentials".to_string())),
        }
    }

    async fn sign_out(&self, _scope: SignOutScope) -> AppResult<()> {
        self.session.clear();
        Ok(())
    }

    async fn restore_session(&self, _refresh_token: &str) -> AppResult<Identity> {
        self.session.clear();
        Err(AppError::Auth("Invalid refresh token".to_string()))
    }

    async fn open_recovery_session(
        &self,
        access_token: &str,
        _refresh_token: &str,
    ) -> AppResult<Identity> {
        let user = access_token
            .strip_prefix("recovery-")
            .ok_or_else(|| AppError::Auth("Invalid recovery link".to_string()))?;
        Ok(self.open(&format!("{}@example.com", user), UserId::new(user), true))
    }

    async fn refresh(&self) -> AppResult<Identity> {
        self.session.identity().ok_or(AppError::Unauthenticated)
    }

    async fn update_password(
        &self,
        current_password: Option<String>,
        new_password: &str,
    ) -> AppResult<()> {
        let identity = self.session.identity().ok_or(AppError::Unauthenticated)?;
        let email = identity.email.unwrap_or_default();
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(&email)
            .ok_or_else(|| AppError::Auth("Unknown account".to_string()))?;

        if !self.session.is_recovery() && current_password.as_deref() != Some(account.0.as_str()) {
            return Err(AppError::Auth("Current password is incorrect".to_string()));
        }
        account.0 = new_password.to_string();
        Ok(())
    }

    async fn reset_password(&self, _email: &str) -> AppResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub fn catalog_item(id: u64, title: &str, kind: MediaKind) -> CatalogItem {
    let mut value = json!({
        "id": id,
        "overview": format!("About {}", title),
        "poster_path": format!("/poster-{}.jpg", id),
        "backdrop_path": format!("/backdrop-{}.jpg", id),
        "media_type": kind.as_str(),
    });
    match kind {
        MediaKind::Movie => value["title"] = json!(title),
        MediaKind::Tv => value["name"] = json!(title),
    }
    serde_json::from_value(value).unwrap()
}

/// Catalog with a handful of fixed titles
pub struct FakeCatalog {
    items: Vec<CatalogItem>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            items: vec![
                catalog_item(603, "The Matrix", MediaKind::Movie),
                catalog_item(7, "Seven", MediaKind::Movie),
                catalog_item(42, "The Answer", MediaKind::Movie),
                catalog_item(1396, "Breaking Bad", MediaKind::Tv),
            ],
        }
    }
}

#[async_trait::async_trait]
impl CatalogProvider for FakeCatalog {
    async fn fetch_category(&self, category: Category) -> AppResult<Vec<CatalogItem>> {
        Ok(match category {
            Category::Originals => vec![catalog_item(66732, "Stranger Things", MediaKind::Tv)],
            Category::Documentaries => vec![],
            _ => self.items.clone(),
        })
    }

    async fn search(&self, query: &str) -> AppResult<Vec<CatalogItem>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Err(AppError::InvalidInput("Search query cannot be empty".to_string()));
        }
        Ok(self
            .items
            .iter()
            .filter(|item| {
                let snapshot = MediaSnapshot::from(*item);
                snapshot.display_title().to_lowercase().contains(&query)
            })
            .cloned()
            .collect())
    }

    async fn fetch_details(&self, kind: MediaKind, id: MovieId) -> AppResult<TitleDetails> {
        let item = self
            .items
            .iter()
            .find(|item| item.id == id)
            .ok_or_else(|| AppError::NotFound(format!("No {} {}", kind, id)))?;

        Ok(TitleDetails {
            id,
            kind,
            title: MediaSnapshot::from(item).display_title().to_string(),
            overview: item.overview.clone(),
            poster_path: item.poster_path.clone(),
            backdrop_path: item.backdrop_path.clone(),
            release_date: None,
            runtime: None,
            vote_average: None,
            genres: vec![],
            number_of_seasons: (kind == MediaKind::Tv).then_some(5),
            seasons: vec![],
            trailer_key: (id == MovieId(603)).then(|| "vKQi3bBA1y8".to_string()),
        })
    }

    async fn fetch_season(&self, series_id: MovieId, season: u32) -> AppResult<SeasonDetails> {
        if season == 0 {
            return Err(AppError::InvalidInput("Season numbers start at 1".to_string()));
        }
        if series_id != MovieId(1396) {
            return Err(AppError::NotFound(format!("No series {}", series_id)));
        }
        Ok(serde_json::from_value(json!({
            "season_number": season,
            "name": format!("Season {}", season),
            "episodes": [
                { "episode_number": 1, "name": "Pilot" },
                { "episode_number": 2, "name": "Cat's in the Bag..." }
            ]
        }))
        .unwrap())
    }

    fn image_url(&self, path: &str) -> String {
        format!("https://img.test/original{}", path)
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub fn favorite_row(user: &str, id: u64, minute: u32) -> FavoriteRecord {
    FavoriteRecord {
        id: Some(id as i64),
        user_id: UserId::new(user),
        movie_id: MovieId(id),
        movie_data: MediaSnapshot::from(&catalog_item(id, &format!("Title {}", id), MediaKind::Movie)),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap(),
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub store: Arc<FavoritesStore>,
    pub repository: Arc<InMemoryFavorites>,
    pub listener: ListenerHandle,
}

impl TestApp {
    pub fn new(rows: Vec<FavoriteRecord>) -> Self {
        let session = SessionContext::new();
        let repository = Arc::new(InMemoryFavorites::with_rows(rows));
        let store = Arc::new(FavoritesStore::new(
            repository.clone(),
            RetryPolicy {
                attempts: 2,
                base_delay: Duration::from_millis(1),
                timeout: Duration::from_secs(2),
            },
        ));

        let state = AppState::new(
            session.clone(),
            Arc::new(FakeAuth::new(session.clone())),
            store.clone(),
            Arc::new(FakeCatalog::new()),
            PlaybackService::new("https://player.test/embed"),
        );
        let listener = state.spawn_favorites_listener();
        session.mark_initialized();

        let server = TestServer::new(create_router(state.clone())).unwrap();

        Self {
            server,
            state,
            store,
            repository,
            listener,
        }
    }

    pub async fn sign_in(&self, user: &str) {
        self.server
            .post("/api/v1/auth/sign-in")
            .json(&json!({ "email": format!("{}@example.com", user), "password": PASSWORD }))
            .await
            .assert_status_ok();

        let expected = UserId::new(user);
        wait_until(|| {
            let store = self.store.clone();
            let expected = expected.clone();
            async move { store.identity().await == Some(expected) && store.is_loaded().await }
        })
        .await;
    }
}

pub async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

pub fn toggle_body(id: u64) -> serde_json::Value {
    let snapshot = MediaSnapshot::from(&catalog_item(id, &format!("Title {}", id), MediaKind::Movie));
    json!({ "movie_id": id, "movie_data": snapshot })
}
