//! OAuth client for the osu! v2 API.
//!
//! A [`Client`] owns one OAuth session and shares a transport (normally the
//! rate-limited [`RequestDispatcher`]) with the user clients created from it.
//! Installing a token schedules a refresh 100 seconds before it expires.

use crate::api::dispatcher::{decode, DispatcherOptions, RequestDispatcher, Transport};
use crate::api::endpoints;
use crate::api::enums::{BeatmapLookupType, Gamemode, GrantType, LeaderboardScope, RankingType, ScoreType};
use crate::api::request::Request;
use crate::api::types::{
    BeatmapPayload, BeatmapScoresPayload, BeatmapUserScorePayload, BeatmapsetPayload,
    MatchPayload, ScorePayload, UserPayload,
};
use crate::auth::{token_request, Credentials, Grant, Token, TokenUpdate, UserGrant};
use crate::cursor::{
    Cursor, IndexedCursor, IndexedSource, MatchCursor, MatchSource, RankingCursor, RankingOptions,
    RankingSource,
};
use crate::error::{Error, Result};
use crate::lock;
use crate::structures::{Beatmap, BeatmapUserScore, Beatmapset, Match, Score, User};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Capacity of the token update channel
const TOKEN_CHANNEL_CAPACITY: usize = 16;

/// Options for beatmap leaderboard requests
#[derive(Debug, Clone, Default)]
pub struct BeatmapScoreOptions {
    /// Leaderboard scope, global by default
    pub scope: Option<LeaderboardScope>,
    /// Game mode
    pub mode: Option<Gamemode>,
    /// Exact mod combination, as acronyms
    pub mods: Vec<String>,
}

impl BeatmapScoreOptions {
    fn apply(&self, mut request: Request) -> Request {
        request = request.query("type", self.scope.unwrap_or(LeaderboardScope::Global));
        if let Some(mode) = self.mode {
            request = request.query("mode", mode);
        }
        for acronym in &self.mods {
            request = request.append_query("mods[]", acronym);
        }
        request
    }
}

/// Authenticated handle to the API
///
/// Cloning is cheap; clones share the session.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    /// Shared with user clients created from this one
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    grant: Grant,
    session: Mutex<Session>,
    updates: broadcast::Sender<TokenUpdate>,
}

#[derive(Default)]
struct Session {
    token: Option<Token>,
    /// Bumped on every token install; stale refresh tasks compare against it
    generation: u64,
    refresh_task: Option<JoinHandle<()>>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        let session = self
            .session
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(task) = session.refresh_task.take() {
            task.abort();
        }
    }
}

impl Client {
    /// Create an application client with its own dispatcher
    ///
    /// No request is made; call [`Client::connect`] before authenticated
    /// requests.
    pub fn new(credentials: Credentials, options: DispatcherOptions) -> Result<Self> {
        let dispatcher = RequestDispatcher::new(options)?;
        Ok(Self::with_transport(Arc::new(dispatcher), credentials))
    }

    /// Create an application client from the workspace configuration
    pub fn from_config(config: &shared::Config) -> Result<Self> {
        let credentials = Credentials::from_config(config)?;
        Self::new(credentials, DispatcherOptions::from_config(config))
    }

    /// Create an application client over an existing transport
    pub fn with_transport(transport: Arc<dyn Transport>, credentials: Credentials) -> Self {
        Self::build(transport, credentials, Grant::ClientCredentials)
    }

    fn build(transport: Arc<dyn Transport>, credentials: Credentials, grant: Grant) -> Self {
        let (updates, _) = broadcast::channel(TOKEN_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(ClientInner {
                transport,
                credentials,
                grant,
                session: Mutex::new(Session::default()),
                updates,
            }),
        }
    }

    /// Obtain an application token with the client credentials grant
    pub async fn connect(&self) -> Result<Token> {
        self.refresh_token().await
    }

    /// Run this client's grant again and install the new token
    ///
    /// A scheduled refresh does this on its own; calling it by hand is only
    /// needed to renew early.
    pub async fn refresh_token(&self) -> Result<Token> {
        let request = match self.inner.grant {
            Grant::ClientCredentials => {
                token_request(&self.inner.credentials, GrantType::ClientCredentials, None)?
            }
            Grant::User => {
                let refresh = self.token().and_then(|token| token.refresh_token);
                token_request(
                    &self.inner.credentials,
                    GrantType::RefreshToken,
                    refresh.as_deref(),
                )?
            }
        };

        let token = self.fetch_token(request).await?;
        self.set_token(token.clone());
        Ok(token)
    }

    /// Exchange an authorization code or refresh token for a user session
    ///
    /// The returned client shares this client's transport and rate limiter
    /// but has its own token and refresh schedule.
    pub async fn create_user_client(&self, secret: &str, grant: UserGrant) -> Result<Client> {
        let grant_type = match grant {
            UserGrant::Authorization => GrantType::AuthorizationCode,
            UserGrant::Refresh => GrantType::RefreshToken,
        };
        let request = token_request(&self.inner.credentials, grant_type, Some(secret))?;
        let token = self.fetch_token(request).await?;

        let client = Self::build(
            Arc::clone(&self.inner.transport),
            self.inner.credentials.clone(),
            Grant::User,
        );
        client.set_token(token);

        info!(grant = grant_type.as_str(), "Created user client");
        Ok(client)
    }

    /// Current token, if any
    pub fn token(&self) -> Option<Token> {
        lock(&self.inner.session).token.clone()
    }

    /// Subscribe to token installs and refresh failures
    pub fn token_updates(&self) -> broadcast::Receiver<TokenUpdate> {
        self.inner.updates.subscribe()
    }

    /// Install a token and schedule its refresh
    ///
    /// Outside a tokio runtime the token is installed without a refresh
    /// schedule.
    pub fn set_token(&self, token: Token) {
        let delay = token.refresh_delay();
        {
            let mut session = lock(&self.inner.session);
            session.generation += 1;
            if let Some(task) = session.refresh_task.take() {
                task.abort();
            }
            session.token = Some(token.clone());

            match Handle::try_current() {
                Ok(handle) => {
                    let weak = Arc::downgrade(&self.inner);
                    let generation = session.generation;
                    session.refresh_task =
                        Some(handle.spawn(scheduled_refresh(weak, generation, delay)));
                }
                Err(_) => warn!("No runtime available, token refresh not scheduled"),
            }
        }

        info!(
            expires_in = token.expires_in,
            refresh_in_secs = delay.as_secs(),
            "Token updated"
        );
        // No subscribers is fine.
        let _ = self.inner.updates.send(TokenUpdate::Refreshed(token));
    }

    /// Cancel the scheduled refresh
    ///
    /// The current token stays usable until it expires.
    pub fn close(&self) {
        if let Some(task) = lock(&self.inner.session).refresh_task.take() {
            task.abort();
            debug!("Token refresh cancelled");
        }
    }

    /// Send an authenticated request and decode the response
    ///
    /// A request that discards its output decodes from JSON `null`.
    pub async fn request<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let token = self
            .token()
            .ok_or_else(|| Error::MissingToken(self.missing_token_message().to_string()))?;

        let body = self
            .inner
            .transport
            .send_raw(request.bearer(token.access_token))
            .await?;
        decode(body.as_deref().unwrap_or("null"))
    }

    async fn fetch_token(&self, request: Request) -> Result<Token> {
        let body = self.inner.transport.send_raw(request).await?;
        decode(body.as_deref().unwrap_or("null"))
    }

    fn missing_token_message(&self) -> &'static str {
        match self.inner.grant {
            Grant::ClientCredentials => "no application token, call connect() first",
            Grant::User => "user session has no token",
        }
    }

    /// Get a beatmap by id
    pub async fn get_beatmap(&self, id: u64) -> Result<Arc<Beatmap>> {
        let payload = self.lookup_beatmap(BeatmapLookupType::Id, &id.to_string()).await?;
        Ok(Beatmap::new(self, payload))
    }

    /// Get a beatmap by its file checksum
    pub async fn get_beatmap_by_checksum(&self, checksum: &str) -> Result<Arc<Beatmap>> {
        let payload = self.lookup_beatmap(BeatmapLookupType::Checksum, checksum).await?;
        Ok(Beatmap::new(self, payload))
    }

    /// Get a beatmap by its file name
    pub async fn get_beatmap_by_filename(&self, filename: &str) -> Result<Arc<Beatmap>> {
        let payload = self.lookup_beatmap(BeatmapLookupType::Filename, filename).await?;
        Ok(Beatmap::new(self, payload))
    }

    async fn lookup_beatmap(&self, lookup: BeatmapLookupType, value: &str) -> Result<BeatmapPayload> {
        debug!(lookup = lookup.as_str(), value, "Looking up beatmap");
        self.request(Request::get(endpoints::BEATMAP_LOOKUP).query(lookup.as_str(), value))
            .await
    }

    /// Get the top scores of a beatmap
    pub async fn get_beatmap_scores(
        &self,
        id: u64,
        options: &BeatmapScoreOptions,
    ) -> Result<Vec<Score>> {
        let request = options.apply(Request::get(endpoints::BEATMAP_SCORES).argument("beatmap", id));
        let payload: BeatmapScoresPayload = self.request(request).await?;

        Ok(payload
            .scores
            .into_iter()
            .map(|score| Score::new(self, score))
            .collect())
    }

    /// Get a user's best score on a beatmap
    pub async fn get_beatmap_user_score(
        &self,
        beatmap_id: u64,
        user_id: u64,
        options: &BeatmapScoreOptions,
    ) -> Result<BeatmapUserScore> {
        let request = options.apply(
            Request::get(endpoints::BEATMAP_USER_SCORE)
                .argument("beatmap", beatmap_id)
                .argument("user", user_id),
        );
        let payload: BeatmapUserScorePayload = self.request(request).await?;

        Ok(BeatmapUserScore {
            position: payload.position,
            score: Score::new(self, payload.score),
        })
    }

    /// Get a beatmapset with its difficulties
    pub async fn get_beatmapset(&self, id: u64) -> Result<Arc<Beatmapset>> {
        let payload: BeatmapsetPayload = self
            .request(Request::get(endpoints::BEATMAPSET_SINGLE).argument("beatmapset", id))
            .await?;
        Ok(Beatmapset::new(self, payload))
    }

    /// Get a multiplayer match with its event log
    pub async fn get_match(&self, id: u64) -> Result<Arc<Match>> {
        let payload: MatchPayload = self
            .request(Request::get(endpoints::MATCH_SINGLE).argument("match", id))
            .await?;
        Ok(Match::new(self, payload))
    }

    /// Page through recent multiplayer matches, newest first
    pub fn get_matches(&self) -> MatchCursor {
        Cursor::new(MatchSource::new(self.clone()))
    }

    /// Page through a ranking table
    pub fn get_rankings(
        &self,
        mode: Gamemode,
        kind: RankingType,
        options: RankingOptions,
    ) -> RankingCursor {
        Cursor::new(RankingSource::new(self.clone(), mode, kind, options))
    }

    /// Get a user by id
    ///
    /// Without a mode the user's default mode is used for statistics.
    pub async fn get_user(&self, id: u64, mode: Option<Gamemode>) -> Result<Arc<User>> {
        let payload = self.lookup_user(&id.to_string(), "id", mode).await?;
        Ok(User::new(self, payload))
    }

    /// Get a user by username
    pub async fn get_user_by_name(&self, username: &str, mode: Option<Gamemode>) -> Result<Arc<User>> {
        let payload = self.lookup_user(username, "username", mode).await?;
        Ok(User::new(self, payload))
    }

    async fn lookup_user(&self, user: &str, key: &str, mode: Option<Gamemode>) -> Result<UserPayload> {
        let request = match mode {
            Some(mode) => Request::get(endpoints::USER_SINGLE_MODE).argument("mode", mode),
            None => Request::get(endpoints::USER_SINGLE),
        };
        self.request(request.argument("user", user).query("key", key))
            .await
    }

    /// Page through a user's scores
    pub fn get_user_scores(
        &self,
        id: u64,
        kind: ScoreType,
        mode: Option<Gamemode>,
    ) -> IndexedCursor<Score, ScorePayload> {
        let mut request = Request::get(endpoints::USER_SCORES)
            .argument("user", id)
            .argument("type", kind);
        if let Some(mode) = mode {
            request = request.query("mode", mode);
        }

        let client = self.clone();
        Cursor::new(IndexedSource::new(self.clone(), request, move |raw: Vec<ScorePayload>| {
            raw.into_iter()
                .map(|score| Score::new(&client, score))
                .collect()
        }))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("client_id", &self.inner.credentials.client_id)
            .field("grant", &self.inner.grant)
            .field("authenticated", &lock(&self.inner.session).token.is_some())
            .finish()
    }
}

/// Sleep until the token is due, then renew it
async fn scheduled_refresh(weak: Weak<ClientInner>, generation: u64, delay: std::time::Duration) {
    sleep(delay).await;

    let Some(inner) = weak.upgrade() else {
        return;
    };
    {
        let mut session = lock(&inner.session);
        if session.generation != generation {
            return;
        }
        // Detach our own handle so installing the new token does not abort us.
        session.refresh_task.take();
    }

    let client = Client { inner };
    debug!("Refreshing token");
    if let Err(e) = client.refresh_token().await {
        warn!(error = %e, "Scheduled token refresh failed");
        let _ = client
            .inner
            .updates
            .send(TokenUpdate::RefreshFailed(e.to_string()));
    }
}
