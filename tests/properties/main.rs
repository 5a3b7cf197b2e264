//! Property tests for the resolution and versioning invariants.

mod merge_properties;
mod resolver_properties;
mod versioning_properties;
