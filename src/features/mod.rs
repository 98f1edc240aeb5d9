//! Derived series shared by the analysis stages
//!
//! - `returns`: close-to-close simple returns for the volatility path
//! - `deltas`: absolute price/volume deltas for the anomaly path

mod deltas;
mod returns;

pub use deltas::*;
pub use returns::*;
