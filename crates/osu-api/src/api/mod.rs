//! osu! v2 API plumbing.
//!
//! Request descriptions, the rate-limited dispatcher and the wire types it
//! decodes into.

pub mod dispatcher;
pub mod endpoints;
pub mod enums;
pub mod rate_limiter;
pub mod request;
pub mod types;

pub use dispatcher::{DispatcherOptions, RequestDispatcher, SerializedRequest, Transport};
pub use enums::*;
pub use rate_limiter::{RateLimitStats, RateLimiter};
pub use request::Request;
pub use types::*;
