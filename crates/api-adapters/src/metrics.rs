//! Prometheus counters for the business events worth watching.

use std::fmt;

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::registry::Registry;

#[derive(Debug)]
pub struct ApiMetrics {
    registry: Registry,
    pub signups: Counter,
    pub tokens_issued: Counter,
    pub reviews_created: Counter,
    pub comments_created: Counter,
}

impl ApiMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("yamdb");

        let signups = Counter::default();
        registry.register("signups", "Accepted sign-up requests", signups.clone());
        let tokens_issued = Counter::default();
        registry.register(
            "tokens_issued",
            "Confirmation codes exchanged for tokens",
            tokens_issued.clone(),
        );
        let reviews_created = Counter::default();
        registry.register("reviews_created", "Reviews created", reviews_created.clone());
        let comments_created = Counter::default();
        registry.register("comments_created", "Comments created", comments_created.clone());

        Self {
            registry,
            signups,
            tokens_issued,
            reviews_created,
            comments_created,
        }
    }

    /// OpenMetrics text exposition.
    pub fn encode(&self) -> Result<String, fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        let metrics = ApiMetrics::new();
        metrics.reviews_created.inc();
        metrics.reviews_created.inc();
        metrics.signups.inc();

        let text = metrics.encode().unwrap();
        assert!(text.contains("yamdb_reviews_created_total 2"));
        assert!(text.contains("yamdb_signups_total 1"));
        assert!(text.contains("yamdb_comments_created_total 0"));
        assert!(text.ends_with("# EOF\n"));
    }
}
