//! Client-side state synchronization for economy chess.
//!
//! - [`snapshot`]: the Snapshot Model, timestamp-monotonic mirror of server
//!   state.
//! - [`clock`]: the Clock Reconciler, live countdowns from one offset sample.
//! - [`selection`]: the Selection State Machine with generation-tagged
//!   target queries.
//! - [`context`]: the interaction rules tying the above together.
//! - [`session`]: the controller task that drives transport, remote calls and
//!   the presenter.

pub mod clock;
pub mod context;
pub mod selection;
pub mod session;
pub mod snapshot;
pub mod view;

pub use clock::{ClockView, DEFAULT_CLOCK_TICK, format_clock, format_optional, reconcile};
pub use context::{RemoteCall, SessionContext};
pub use selection::{Selection, SelectionMode, classify_destinations};
pub use session::{Session, SessionConfig, SessionError, UserCommand};
pub use snapshot::{AcceptOutcome, SnapshotModel};
pub use view::{BoardView, FinishNotice, Frame, Highlight, Presenter, ShopItem, ShopView};
