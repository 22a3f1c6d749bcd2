//! Request/response access to the remote game service.
//!
//! [`GameApi`] is the seam between the session controller and the backend.
//! Calls are blocking; the session runs them on tokio's blocking pool so the
//! event loop never waits on the network. [`HttpGameApi`] is the production
//! implementation: JSON over `POST`, authenticated with an API key header.

use std::time::Duration;

use ecochess_model::{GameId, GameSnapshot, PieceKind, Square};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::messages::{
    DestsEnvelope, DropRequest, DropTargetsRequest, GameEnvelope, LegalsRequest, MoveRequest,
    MyGameRequest, StateRequest, TargetsEnvelope, parse_squares,
};

/// Header carrying the shared API credential.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Default per-request timeout for [`HttpGameApi`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the backend lives and who is asking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// HTTP(S) base URL without a trailing slash, e.g. `https://host:8000`.
    pub api_base: String,
    /// Shared API credential.
    pub api_key: String,
    /// Player display identity, e.g. `@alice`.
    pub username: String,
}

impl Endpoint {
    /// Build an endpoint, trimming any trailing slash from the base URL.
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        let api_base: String = api_base.into();
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            username: username.into(),
        }
    }
}

/// Result of a mutating request the server processed.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The server applied the mutation and returned the fresh state.
    Applied(GameSnapshot),
    /// The server declined; the reason is meant for display.
    Rejected(String),
}

/// Errors talking to the game service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, timeout and the like.
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-success HTTP status without a decodable body.
    #[error("HTTP status {0}")]
    Status(u16),
    /// The response body was not the expected JSON shape.
    #[error("malformed response: {0}")]
    Decode(String),
    /// The service answered `ok: false`.
    #[error("request refused: {0}")]
    NotOk(String),
    /// A success response that should carry a game did not.
    #[error("response carries no game")]
    MissingGame,
}

/// Operations the client needs from the game service.
///
/// Target queries are advisory reads: a refused query yields an empty set.
/// `submit_*` are the only mutating calls and are never retried implicitly.
pub trait GameApi: Send + Sync + 'static {
    /// Session bootstrap: the caller's current game, if any.
    fn fetch_my_game(&self) -> Result<Option<GameSnapshot>, ApiError>;

    /// Legal destinations for the piece on `from`.
    fn legal_move_targets(&self, game: &GameId, from: Square) -> Result<Vec<Square>, ApiError>;

    /// Legal drop squares for a purchase of `kind`.
    fn legal_drop_targets(&self, game: &GameId, kind: PieceKind)
    -> Result<Vec<Square>, ApiError>;

    fn submit_move(
        &self,
        game: &GameId,
        from: Square,
        to: Square,
    ) -> Result<MutationOutcome, ApiError>;

    fn submit_drop(
        &self,
        game: &GameId,
        kind: PieceKind,
        square: Square,
    ) -> Result<MutationOutcome, ApiError>;

    /// Current state, used by the poll loop.
    fn poll_state(&self, game: &GameId) -> Result<GameSnapshot, ApiError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Blocking JSON-over-HTTP client for the game service.
pub struct HttpGameApi {
    agent: ureq::Agent,
    endpoint: Endpoint,
}

impl HttpGameApi {
    /// Create a client with [`DEFAULT_REQUEST_TIMEOUT`].
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_timeout(endpoint, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout.
    pub fn with_timeout(endpoint: Endpoint, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent, endpoint }
    }

    fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R, ApiError> {
        let url = format!("{}{}", self.endpoint.api_base, path);
        tracing::trace!("POST {url}");

        let response = self
            .agent
            .post(&url)
            .set(API_KEY_HEADER, &self.endpoint.api_key)
            .send_json(body);

        match response {
            Ok(resp) => resp
                .into_json::<R>()
                .map_err(|e| ApiError::Decode(e.to_string())),
            // Error statuses may still carry an `{ok: false, reason}` body.
            Err(ureq::Error::Status(code, resp)) => {
                resp.into_json::<R>().map_err(|_| ApiError::Status(code))
            }
            Err(ureq::Error::Transport(e)) => Err(ApiError::Transport(e.to_string())),
        }
    }

    fn mutation(envelope: GameEnvelope) -> Result<MutationOutcome, ApiError> {
        if !envelope.ok {
            let reason = envelope.reason.unwrap_or_else(|| "unknown".to_string());
            return Ok(MutationOutcome::Rejected(reason));
        }
        envelope
            .game
            .map(MutationOutcome::Applied)
            .ok_or(ApiError::MissingGame)
    }
}

impl GameApi for HttpGameApi {
    fn fetch_my_game(&self) -> Result<Option<GameSnapshot>, ApiError> {
        let envelope: GameEnvelope = self.post(
            "/api/game/my",
            &MyGameRequest {
                username: &self.endpoint.username,
            },
        )?;
        if !envelope.ok {
            return Err(ApiError::NotOk(
                envelope.reason.unwrap_or_else(|| "unknown".to_string()),
            ));
        }
        Ok(envelope.game)
    }

    fn legal_move_targets(&self, game: &GameId, from: Square) -> Result<Vec<Square>, ApiError> {
        let envelope: DestsEnvelope = self.post(
            "/api/game/legals",
            &LegalsRequest {
                game_id: game.as_str(),
                username: &self.endpoint.username,
                from,
            },
        )?;
        if !envelope.ok {
            return Ok(Vec::new());
        }
        Ok(parse_squares(&envelope.dests))
    }

    fn legal_drop_targets(
        &self,
        game: &GameId,
        kind: PieceKind,
    ) -> Result<Vec<Square>, ApiError> {
        let envelope: TargetsEnvelope = self.post(
            "/api/game/drop_targets",
            &DropTargetsRequest {
                game_id: game.as_str(),
                username: &self.endpoint.username,
                piece: kind.letter(),
            },
        )?;
        if !envelope.ok {
            return Ok(Vec::new());
        }
        Ok(parse_squares(&envelope.targets))
    }

    fn submit_move(
        &self,
        game: &GameId,
        from: Square,
        to: Square,
    ) -> Result<MutationOutcome, ApiError> {
        let envelope: GameEnvelope = self.post(
            "/api/game/move",
            &MoveRequest {
                game_id: game.as_str(),
                username: &self.endpoint.username,
                from,
                to,
            },
        )?;
        Self::mutation(envelope)
    }

    fn submit_drop(
        &self,
        game: &GameId,
        kind: PieceKind,
        square: Square,
    ) -> Result<MutationOutcome, ApiError> {
        let envelope: GameEnvelope = self.post(
            "/api/game/drop",
            &DropRequest {
                game_id: game.as_str(),
                username: &self.endpoint.username,
                piece: kind.letter(),
                square,
            },
        )?;
        Self::mutation(envelope)
    }

    fn poll_state(&self, game: &GameId) -> Result<GameSnapshot, ApiError> {
        let envelope: GameEnvelope = self.post(
            "/api/game/state",
            &StateRequest {
                game_id: game.as_str(),
                username: &self.endpoint.username,
            },
        )?;
        if !envelope.ok {
            return Err(ApiError::NotOk(
                envelope.reason.unwrap_or_else(|| "unknown".to_string()),
            ));
        }
        envelope.game.ok_or(ApiError::MissingGame)
    }
}
