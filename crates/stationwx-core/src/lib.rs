//! Core data types, key decoding and rollup calculations for station data
//!
//! Everything in this crate is pure: records come in from a
//! [`RecordSource`], are normalized into [`WeatherRecord`]s and are turned
//! into chart series or summaries without touching the network.

pub mod fallback;
pub mod normalize;
pub mod period;
pub mod pipeline;
pub mod push_id;
pub mod rollups;
pub mod summary;
pub mod types;

pub use fallback::*;
pub use normalize::*;
pub use period::*;
pub use pipeline::*;
pub use push_id::*;
pub use rollups::*;
pub use summary::*;
pub use types::*;
