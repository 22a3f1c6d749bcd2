//! Networking for the economy chess client: the request/response game API,
//! the push channel, the fallback poll loop, and the Transport Manager state
//! machine that decides which of the two is live.

pub mod api;
pub mod messages;
pub mod poll;
pub mod push;
pub mod reconnection;
pub mod transport;

pub use api::{ApiError, Endpoint, GameApi, HttpGameApi, MutationOutcome};
pub use messages::{MessageError, PushMessage, decode_push};
pub use poll::PollLoop;
pub use push::{PushChannel, PushError, push_url};
pub use reconnection::{Backoff, BackoffConfig, BackoffStep};
pub use transport::{
    TransportAction, TransportConfig, TransportEvent, TransportManager, TransportState,
};
