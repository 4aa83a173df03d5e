use std::fmt::{Debug, Formatter};

use prometheus::{
    core::Collector, opts, register_int_gauge_vec_with_registry, Encoder, IntGaugeVec, Registry,
};

use hyperlane_core::KnownNetwork;

/// Macro to prefix a string with the namespace.
macro_rules! namespaced {
    ($name:expr) => {
        format!("{}_{}", super::NAMESPACE, $name)
    };
}

/// Label under which each network publishes its series.
pub const NETWORK_LABEL: &str = "network";

/// Metrics published by the network exporter.
///
/// A single instance is shared between the poller, which writes the latest
/// checkpoint, and the HTTP server, which renders the registry on scrape.
pub struct ExporterMetrics {
    /// Metrics registry for adding new metrics and gathering reports
    registry: Registry,

    latest_checkpoint: IntGaugeVec,
}

impl ExporterMetrics {
    /// Register the exporter metrics on `registry`.
    ///
    /// Fails if a metric with the same name is already registered.
    pub fn new(registry: Registry) -> prometheus::Result<Self> {
        let latest_checkpoint = register_int_gauge_vec_with_registry!(
            opts!(
                namespaced!("contract_latest_checkpoint"),
                "Latest checkpoint acknowledged by Hyperlane contract"
            ),
            &[NETWORK_LABEL],
            registry
        )?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            latest_checkpoint,
        })
    }

    /// Publish `index` as the latest checkpoint of `network`, replacing any
    /// value previously published for it.
    pub fn set_latest_checkpoint(&self, network: KnownNetwork, index: i64) {
        self.latest_checkpoint
            .with_label_values(&[network.as_str()])
            .set(index);
    }

    /// The value currently published for `network`, if any.
    pub fn latest_checkpoint(&self, network: KnownNetwork) -> Option<i64> {
        // `with_label_values` would create the series as a side effect
        collect_series(&self.latest_checkpoint)
            .into_iter()
            .find(|(label, _)| label == network.as_str())
            .map(|(_, value)| value)
    }

    /// Drop every published checkpoint series. The metrics stay registered.
    pub fn reset(&self) {
        self.latest_checkpoint.reset();
    }

    /// Gather available metrics into an encoded (plaintext, Prometheus text
    /// exposition format) report.
    pub fn gather(&self) -> prometheus::Result<Vec<u8>> {
        let collected_metrics = self.registry.gather();
        let mut out_buf = Vec::with_capacity(1024 * 4);
        let encoder = prometheus::TextEncoder::new();
        encoder.encode(&collected_metrics, &mut out_buf)?;
        Ok(out_buf)
    }

    /// Content type of the report produced by [`Self::gather`].
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}

impl Debug for ExporterMetrics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterMetrics")
            .field("series", &collect_series(&self.latest_checkpoint))
            .finish()
    }
}

/// `(network label, value)` for every series of a gauge labelled by network.
fn collect_series(gauge: &IntGaugeVec) -> Vec<(String, i64)> {
    gauge
        .collect()
        .iter()
        .flat_map(|family| family.get_metric())
        .filter_map(|metric| {
            let label = metric
                .get_label()
                .iter()
                .find(|pair| pair.get_name() == NETWORK_LABEL)?;
            Some((
                label.get_value().to_owned(),
                metric.get_gauge().get_value() as i64,
            ))
        })
        .collect()
}
