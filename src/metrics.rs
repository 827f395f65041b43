use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // Counters
    pub payroll_events_consolidated_total: IntCounterVec,
    pub payroll_calculations_total: IntCounterVec,
    pub esocial_events_staged_total: IntCounterVec,

    // Histograms
    pub http_request_duration_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let payroll_events_consolidated_total = IntCounterVec::new(
            Opts::new(
                "payroll_events_consolidated_total",
                "Payroll events emitted by consolidation runs",
            ),
            &["event_type"],
        )
        .expect("metric");

        let payroll_calculations_total = IntCounterVec::new(
            Opts::new(
                "payroll_calculations_total",
                "Payroll calculation runs by outcome",
            ),
            &["result"], // calculated|reverted_pending|error
        )
        .expect("metric");

        let esocial_events_staged_total = IntCounterVec::new(
            Opts::new(
                "esocial_events_staged_total",
                "eSocial events staged into batches",
            ),
            &["result"], // staged|error
        )
        .expect("metric");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration seconds",
            ),
            &["path", "method", "status"],
        )
        .expect("metric");

        registry
            .register(Box::new(payroll_events_consolidated_total.clone()))
            .expect("metric registration");
        registry
            .register(Box::new(payroll_calculations_total.clone()))
            .expect("metric registration");
        registry
            .register(Box::new(esocial_events_staged_total.clone()))
            .expect("metric registration");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            payroll_events_consolidated_total,
            payroll_calculations_total,
            esocial_events_staged_total,
            http_request_duration_seconds,
        }
    }

    pub fn render(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&mf, &mut buf).map_err(|e| e.to_string())?;
        String::from_utf8(buf).map_err(|e| e.to_string())
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_render() {
        let metrics = Metrics::new();
        metrics
            .payroll_calculations_total
            .with_label_values(&["calculated"])
            .inc();

        let rendered = metrics.render().unwrap();
        assert!(rendered.contains("payroll_calculations_total"));
    }
}
