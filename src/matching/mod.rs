//! Track matching - decides which search result corresponds to a catalog track.
//!
//! - [`similarity`] scores one candidate against one track
//! - [`selector`] applies thresholds over a ranked candidate list

pub mod selector;
pub mod similarity;

pub use selector::{MatchConfig, MatchOutcome, MatchSelector};
pub use similarity::{MatchScore, score, token_set_ratio};
