pub use crate::builder::RefCacheBuilder;
pub use crate::cache::RefCache;
pub use crate::error::{CacheError, InUse, NotFound};
pub use crate::factory::{DefaultFactory, Factory};
pub use crate::handle::Handle;
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::RefCacheMetricsSnapshot;
#[cfg(feature = "metrics")]
pub use crate::metrics::traits::{MetricsExporter, MetricsReset, MetricsSnapshotProvider};
pub use crate::sink::{NoopSink, TraceEvent, TraceSink, WriterSink};
#[cfg(feature = "tracing")]
pub use crate::sink::TracingSink;
