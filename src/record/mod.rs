//! Record model and normalization
//!
//! # Overview
//!
//! - `Field` / `RecordEnvelope` - tagged view of the API's per-field shapes
//! - `Flattener` - nested fields into dot-path string keys, with an explicit
//!   `NullPolicy` per call site
//! - `update_time` - API timestamps into epoch seconds (UTC)
//! - `EventBuilder` - provenance, `_time` and `_raw` on top of a flat record

mod event;
mod normalize;
mod types;

pub use event::{
    to_pretty_json, Event, EventBuilder, DEFAULT_TIME_FIELD, EPOCH_SUFFIX, LIFECYCLE_TIME_FIELDS,
    TOTAL_COUNT_KEY,
};
pub use normalize::{
    collapse_references, parse_timestamp, update_time, FlatRecord, Flattener, NullPolicy,
    NULL_SENTINEL, TIMESTAMP_FORMAT,
};
pub use types::{Field, RecordEnvelope, Reference};
