use std::io::Write;
use std::sync::Mutex;

use crate::metrics::snapshot::{ClockMetricsSnapshot, CoreMetricsSnapshot, SlruMetricsSnapshot};
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for page cache metrics snapshots.
///
/// Writes the Prometheus text exposition format so the output can be scraped
/// directly or forwarded to an OpenTelemetry collector.
///
/// # Example
///
/// ```
/// use pagekit::metrics::exporter::PrometheusTextExporter;
/// use pagekit::metrics::snapshot::CoreMetricsSnapshot;
/// use pagekit::metrics::traits::MetricsExporter;
///
/// let exporter = PrometheusTextExporter::new("pagekit", Vec::new());
/// exporter.export(&CoreMetricsSnapshot::default());
/// let text = String::from_utf8(exporter.into_inner()).unwrap();
/// assert!(text.contains("pagekit_fetch_calls_total 0"));
/// ```
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send + Sync> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send + Sync> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the exporter and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_metric(&self, kind: &str, suffix: &str, value: u64) {
        let name = self.metric_name(suffix);
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn write_counter(&self, suffix: &str, value: u64) {
        self.write_metric("counter", suffix, value);
    }

    fn write_gauge(&self, suffix: &str, value: u64) {
        self.write_metric("gauge", suffix, value);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }

    fn write_core(&self, snapshot: &CoreMetricsSnapshot) {
        self.write_counter("fetch_calls_total", snapshot.fetch_calls);
        self.write_counter("fetch_hits_total", snapshot.fetch_hits);
        self.write_counter("fetch_misses_total", snapshot.fetch_misses);
        self.write_counter("fills_total", snapshot.fills);
        self.write_counter("evicted_entries_total", snapshot.evicted_entries);
        self.write_gauge("cache_len", snapshot.cache_len as u64);
        self.write_gauge("capacity", snapshot.capacity as u64);
    }
}

impl<W: Write + Send + Sync> MetricsExporter<CoreMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &CoreMetricsSnapshot) {
        self.write_core(snapshot);
    }
}

impl<W: Write + Send + Sync> MetricsExporter<ClockMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &ClockMetricsSnapshot) {
        self.write_core(&snapshot.core);
        self.write_counter("hand_advances_total", snapshot.hand_advances);
        self.write_counter("reference_decays_total", snapshot.reference_decays);
    }
}

impl<W: Write + Send + Sync> MetricsExporter<SlruMetricsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &SlruMetricsSnapshot) {
        self.write_core(&snapshot.core);
        self.write_counter("promotions_total", snapshot.promotions);
        self.write_counter("demotions_total", snapshot.demotions);
        self.write_gauge("protected_len", snapshot.protected_len as u64);
        self.write_gauge("probationary_len", snapshot.probationary_len as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<S>(prefix: &str, snapshot: &S) -> String
    where
        PrometheusTextExporter<Vec<u8>>: MetricsExporter<S>,
    {
        let exporter = PrometheusTextExporter::new(prefix, Vec::new());
        exporter.export(snapshot);
        String::from_utf8(exporter.into_inner()).unwrap()
    }

    #[test]
    fn core_snapshot_renders_counters_and_gauges() {
        let snapshot = CoreMetricsSnapshot {
            fetch_calls: 10,
            fetch_hits: 4,
            fetch_misses: 6,
            fills: 3,
            evicted_entries: 3,
            cache_len: 3,
            capacity: 3,
        };
        let text = render("pk", &snapshot);
        assert!(text.contains("# TYPE pk_fetch_calls_total counter\npk_fetch_calls_total 10\n"));
        assert!(text.contains("pk_fetch_hits_total 4"));
        assert!(text.contains("# TYPE pk_capacity gauge\npk_capacity 3\n"));
    }

    #[test]
    fn empty_prefix_uses_bare_names() {
        let text = render("", &CoreMetricsSnapshot::default());
        assert!(text.starts_with("# TYPE fetch_calls_total counter"));
    }

    #[test]
    fn policy_snapshots_append_their_counters() {
        let clock = ClockMetricsSnapshot {
            hand_advances: 7,
            ..Default::default()
        };
        assert!(render("c", &clock).contains("c_hand_advances_total 7"));

        let slru = SlruMetricsSnapshot {
            demotions: 2,
            protected_len: 4,
            ..Default::default()
        };
        let text = render("s", &slru);
        assert!(text.contains("s_demotions_total 2"));
        assert!(text.contains("s_protected_len 4"));
    }
}
