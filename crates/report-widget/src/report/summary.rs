use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Headline metrics shown above the ranked lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(default)]
    pub total_jobs: u64,
    #[serde(default, alias = "californiaJobs")]
    pub regional_jobs: u64,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub extra: BTreeMap<String, MetricValue>,
}

impl Summary {
    /// Makes sure a layout-referenced metric shows up in the output even when
    /// the payload never supplies it.
    pub(crate) fn declare(&mut self, metric: &Metric) {
        match metric {
            Metric::TotalJobs | Metric::RegionalJobs | Metric::LastUpdated => {}
            Metric::Count(name) => {
                self.extra
                    .entry(name.clone())
                    .or_insert(MetricValue::Count(0));
            }
            Metric::Text(name) => {
                self.extra
                    .entry(name.clone())
                    .or_insert_with(|| MetricValue::Text(String::new()));
            }
        }
    }

    pub(crate) fn record(&mut self, metric: &Metric, value: MetricValue) {
        match (metric, value) {
            (Metric::TotalJobs, MetricValue::Count(count)) => self.total_jobs = count,
            (Metric::RegionalJobs, MetricValue::Count(count)) => self.regional_jobs = count,
            (Metric::LastUpdated, MetricValue::Text(text)) => self.last_updated = text,
            (Metric::Count(name), value @ MetricValue::Count(_))
            | (Metric::Text(name), value @ MetricValue::Text(_)) => {
                self.extra.insert(name.clone(), value);
            }
            (metric, value) => {
                tracing::debug!(?metric, ?value, "metric value kind mismatch ignored");
            }
        }
    }

    pub fn count(&self, name: &str) -> Option<u64> {
        match self.extra.get(name) {
            Some(MetricValue::Count(count)) => Some(*count),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.extra.get(name) {
            Some(MetricValue::Text(text)) => Some(text),
            _ => None,
        }
    }
}

/// Value of an extra summary metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Text(String),
}

/// Names a summary field a layout can address.
///
/// Serialized as `"totalJobs"`, `"regionalJobs"`, `"lastUpdated"`,
/// `{"count": "<name>"}` or `{"text": "<name>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    TotalJobs,
    RegionalJobs,
    LastUpdated,
    Count(String),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Count,
    Text,
}

impl Metric {
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::TotalJobs | Metric::RegionalJobs | Metric::Count(_) => MetricKind::Count,
            Metric::LastUpdated | Metric::Text(_) => MetricKind::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_metrics_default_to_zero_values() {
        let mut summary = Summary::default();
        summary.declare(&Metric::Count("openRoles".to_string()));
        summary.declare(&Metric::Text("region".to_string()));

        assert_eq!(summary.count("openRoles"), Some(0));
        assert_eq!(summary.text("region"), Some(""));
    }

    #[test]
    fn record_overwrites_declared_default() {
        let mut summary = Summary::default();
        let metric = Metric::Count("openRoles".to_string());
        summary.declare(&metric);
        summary.record(&metric, MetricValue::Count(42));
        summary.declare(&metric);

        assert_eq!(summary.count("openRoles"), Some(42));
    }

    #[test]
    fn mismatched_kinds_are_ignored() {
        let mut summary = Summary::default();
        summary.record(&Metric::TotalJobs, MetricValue::Text("lots".to_string()));
        assert_eq!(summary.total_jobs, 0);
    }

    #[test]
    fn metric_names_round_trip_through_json() {
        let metrics: Vec<Metric> =
            serde_json::from_str(r#"["totalJobs", "lastUpdated", {"count": "remote"}]"#)
                .expect("metrics parse");
        assert_eq!(
            metrics,
            vec![
                Metric::TotalJobs,
                Metric::LastUpdated,
                Metric::Count("remote".to_string())
            ]
        );
        assert_eq!(metrics[1].kind(), MetricKind::Text);
    }
}
