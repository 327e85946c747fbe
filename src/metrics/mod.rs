//! Feature-gated counters for the page cache policies.
//!
//! Enabled with the `metrics` cargo feature. Policies write into plain
//! counter structs from [`metrics_impl`] on every `fetch`; callers read them
//! back through `metrics_snapshot()` and may publish the result with an
//! exporter such as [`exporter::PrometheusTextExporter`].

pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
