//! Message Feed
//!
//! Live-updating view over the most-recent-first message sequence.
//!
//! ## Architecture
//!
//! - **FeedState**: reducer holding the list, paging, search and filter state
//! - **reconcile**: probe counting and duplicate-free merging
//! - **FeedController**: async driver with a fixed-interval polling task
//!
//! ## Data Flow
//!
//! 1. A transition on `FeedState` issues a ticketed `FeedRequest`
//! 2. The controller fetches it through a `MessageSource`
//! 3. The response is applied only if its ticket is still current
//! 4. The controller broadcasts a `FeedEvent` for front ends

mod controller;
mod reconcile;
mod state;

pub use controller::{FeedController, FeedEvent, DEFAULT_POLL_INTERVAL};
pub use reconcile::{append_unique, count_new, prepend_unique};
pub use state::{
    FeedSettings, FeedState, Operation, Outcome, Phase, Ticket, DEFAULT_PROBE_WINDOW,
};
