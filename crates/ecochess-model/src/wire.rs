//! Raw JSON shapes as the backend sends them. Validation into the strict
//! model types happens in the `TryFrom`/`From` impls in [`crate::game`].

use serde::{Deserialize, Deserializer};

use crate::board::Side;
use crate::game::GameStatus;

/// A game object exactly as it appears on the wire.
#[derive(Debug, Deserialize)]
pub struct WireGame {
    pub game_id: Option<String>,
    pub status: GameStatus,
    pub turn: Option<Side>,
    pub fen: String,
    pub coins_w: i64,
    pub coins_b: i64,
    pub clock_w_rem: f64,
    pub clock_b_rem: f64,
    pub global_end_ts: f64,
    #[serde(default)]
    pub server_ts: Option<f64>,
    #[serde(default)]
    pub you: Option<Side>,
    #[serde(default)]
    pub in_check_start: Flag,
    #[serde(default)]
    pub buy_locked: Flag,
    #[serde(default)]
    pub result: Option<WireResult>,
}

/// A result object (`finished` push payload or `game.result`).
#[derive(Debug, Default, Deserialize)]
pub struct WireResult {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub cap_w: Option<f64>,
    #[serde(default)]
    pub cap_b: Option<f64>,
}

/// Boolean flag the backend sends as `0`/`1`, `true`/`false` or `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flag(bool);

impl Flag {
    pub fn is_set(self) -> bool {
        self.0
    }
}

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Int(i64),
            Float(f64),
            Null,
        }

        Ok(Flag(match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => b,
            Raw::Int(n) => n == 1,
            Raw::Float(x) => x == 1.0,
            Raw::Null => false,
        }))
    }
}
