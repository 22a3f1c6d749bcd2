//! Wire messages: push-channel payloads and the JSON bodies of the game API.
//!
//! Push frames are text. The server's keep-alive acknowledgement is the bare
//! string [`KEEPALIVE_ACK`]; everything else is a JSON object tagged by
//! `type` with the payload under `data`. Decoding goes straight into the
//! strict model types, so a frame that does not describe a valid snapshot or
//! result is rejected as a whole.

use ecochess_model::{GameResult, GameSnapshot, Square};
use serde::{Deserialize, Serialize};

/// Idle probe the client sends on the push channel.
pub const KEEPALIVE_PROBE: &str = "ping";

/// Acknowledgement the server may send back for a probe. Ignored.
pub const KEEPALIVE_ACK: &str = "pong";

// ---------------------------------------------------------------------------
// Push channel
// ---------------------------------------------------------------------------

/// A decoded inbound push message.
#[derive(Debug, Clone, PartialEq)]
pub enum PushMessage {
    /// A complete fresh snapshot.
    State(GameSnapshot),
    /// The game ended; no snapshot accompanies the result.
    Finished(GameResult),
}

#[derive(Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
enum TaggedPush {
    State(GameSnapshot),
    Finished(Option<GameResult>),
}

/// Errors that can occur while decoding a push frame.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The frame is not a known tagged message or its payload is invalid.
    #[error("invalid push message: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode one text frame. Returns `Ok(None)` for a keep-alive acknowledgement.
pub fn decode_push(text: &str) -> Result<Option<PushMessage>, MessageError> {
    if text.trim() == KEEPALIVE_ACK {
        return Ok(None);
    }
    let msg = match serde_json::from_str::<TaggedPush>(text)? {
        TaggedPush::State(snapshot) => PushMessage::State(snapshot),
        TaggedPush::Finished(result) => PushMessage::Finished(result.unwrap_or_default()),
    };
    Ok(Some(msg))
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct MyGameRequest<'a> {
    pub username: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct StateRequest<'a> {
    pub game_id: &'a str,
    pub username: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LegalsRequest<'a> {
    pub game_id: &'a str,
    pub username: &'a str,
    pub from: Square,
}

#[derive(Debug, Serialize)]
pub(crate) struct DropTargetsRequest<'a> {
    pub game_id: &'a str,
    pub username: &'a str,
    pub piece: char,
}

#[derive(Debug, Serialize)]
pub(crate) struct MoveRequest<'a> {
    pub game_id: &'a str,
    pub username: &'a str,
    pub from: Square,
    pub to: Square,
}

#[derive(Debug, Serialize)]
pub(crate) struct DropRequest<'a> {
    pub game_id: &'a str,
    pub username: &'a str,
    pub piece: char,
    pub square: Square,
}

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------

/// `{ok, game?, reason?}`
#[derive(Debug, Deserialize)]
pub(crate) struct GameEnvelope {
    pub ok: bool,
    #[serde(default)]
    pub game: Option<GameSnapshot>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// `{ok, dests[]}`
#[derive(Debug, Deserialize)]
pub(crate) struct DestsEnvelope {
    pub ok: bool,
    #[serde(default)]
    pub dests: Vec<String>,
}

/// `{ok, targets[]}`
#[derive(Debug, Deserialize)]
pub(crate) struct TargetsEnvelope {
    pub ok: bool,
    #[serde(default)]
    pub targets: Vec<String>,
}

/// Parse square names, dropping anything that is not a square.
pub(crate) fn parse_squares(names: &[String]) -> Vec<Square> {
    names
        .iter()
        .filter_map(|name| match name.parse() {
            Ok(square) => Some(square),
            Err(e) => {
                tracing::debug!("ignoring target {name:?}: {e}");
                None
            }
        })
        .collect()
}
