//! Search domain: target channels, normalized parameters, and the post summaries returned to
//! callers.

pub mod channel;
pub mod params;
pub mod post;

pub use channel::*;
pub use params::*;
pub use post::*;
