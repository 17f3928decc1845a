//! aerogrowth-algorithms: Event synthesis for growth lines.
//!
//! This crate turns the lines reported by the three detection methods into
//! events:
//! - **Linking** - pairwise rule deciding whether two lines trace one feature
//! - **Graph** - Union-Find connected components over linked lines
//! - **Statistics** - growth-rate summary, MAFE/AFE and mid location
//! - **Synthesis** - all events plus the quality-gated final events
//! - **Timestamps** - per-timestamp breakdown of events
//!
#![warn(missing_docs)]

mod graph;
mod linking;
mod statistics;
mod synthesis;
mod timestamps;

pub use graph::connected_components;
pub use linking::{LinkPolicy, OverlapLinking};
pub use statistics::{
    absolute_fractional_errors, build_event, mean_absolute_fractional_error, mid_location,
};
pub use synthesis::{EventSets, EventSynthesizer};
pub use timestamps::timestamp_info;

// Re-export the event types produced here
pub use aerogrowth_core::{Event, EventConfig, EventTimestamps, TimestampRecord};
