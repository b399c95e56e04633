use std::io::Write;

use parking_lot::Mutex;

use crate::metrics::snapshot::RefCacheMetricsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for cache metrics snapshots.
///
/// Writes the Prometheus text exposition format so the output can be scraped
/// directly or forwarded to an OpenTelemetry collector.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_metric(&self, kind: &str, suffix: &str, value: u64) {
        let name = self.metric_name(suffix);
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_counter(&self, suffix: &str, value: u64) {
        self.write_metric("counter", suffix, value);
    }

    fn write_gauge(&self, suffix: &str, value: usize) {
        self.write_metric("gauge", suffix, value as u64);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send> MetricsExporter<RefCacheMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &RefCacheMetricsSnapshot) {
        self.write_counter("get_calls_total", snapshot.get_calls);
        self.write_counter("get_hits_total", snapshot.get_hits);
        self.write_counter("get_misses_total", snapshot.get_misses);
        self.write_counter("insert_new_total", snapshot.insert_new);
        self.write_counter("insert_existing_total", snapshot.insert_existing);
        self.write_counter("factory_calls_total", snapshot.factory_calls);
        self.write_counter("factory_failures_total", snapshot.factory_failures);
        self.write_counter("use_transitions_total", snapshot.use_transitions);
        self.write_counter("unuse_transitions_total", snapshot.unuse_transitions);
        self.write_counter("evicted_entries_total", snapshot.evicted_entries);
        self.write_counter("stale_pops_total", snapshot.stale_pops);
        self.write_counter("erases_total", snapshot.erases);
        self.write_counter("erase_in_use_total", snapshot.erase_in_use);
        self.write_counter("clear_calls_total", snapshot.clear_calls);
        self.write_counter("cleared_entries_total", snapshot.cleared_entries);
        self.write_gauge("cache_len", snapshot.cache_len);
        self.write_gauge("unused_len", snapshot.unused_len);
        self.write_gauge("max_unused", snapshot.max_unused);
    }
}
