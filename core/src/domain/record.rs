//! Port record domain model and filtering.

use serde::{Deserialize, Serialize};

// ============================================================================
// PortRecord
// ============================================================================

/// A listening port together with its owning process and that process's
/// memory usage at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortRecord {
    /// The local port number in listening state.
    pub port: u16,

    /// Short name of the owning process.
    #[serde(rename = "process")]
    pub process_name: String,

    /// Resident memory of the process as a percentage of total system memory.
    pub memory_usage: f64,
}

impl PortRecord {
    pub fn new(port: u16, process_name: impl Into<String>, memory_usage: f64) -> Self {
        Self {
            port,
            process_name: process_name.into(),
            memory_usage,
        }
    }
}

impl std::fmt::Display for PortRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            ":{} {} ({:.2}% mem)",
            self.port, self.process_name, self.memory_usage
        )
    }
}

// ============================================================================
// RecordFilter
// ============================================================================

/// Post-inspection filter over port records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Keep only this port.
    #[serde(default)]
    pub port: Option<u16>,
    /// Keep only processes whose name contains this text (case-insensitive).
    #[serde(default)]
    pub name: Option<String>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the filter has any active conditions.
    pub fn is_active(&self) -> bool {
        self.port.is_some() || self.name.as_deref().is_some_and(|n| !n.is_empty())
    }

    /// Check if a record matches all filter criteria.
    pub fn matches(&self, record: &PortRecord) -> bool {
        if let Some(port) = self.port {
            if record.port != port {
                return false;
            }
        }
        if let Some(name) = self.name.as_deref() {
            if !name.is_empty()
                && !record
                    .process_name
                    .to_lowercase()
                    .contains(&name.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

/// Filter records, preserving their order.
pub fn filter_records(records: Vec<PortRecord>, filter: &RecordFilter) -> Vec<PortRecord> {
    if !filter.is_active() {
        return records;
    }
    records.into_iter().filter(|r| filter.matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<PortRecord> {
        vec![
            PortRecord::new(8080, "nginx", 0.42),
            PortRecord::new(5432, "postgres", 1.5),
            PortRecord::new(8080, "nginx", 0.42),
            PortRecord::new(3000, "node", 2.0),
        ]
    }

    #[test]
    fn test_serialized_keys() {
        let value = serde_json::to_value(PortRecord::new(8080, "nginx", 0.42)).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["port"], 8080);
        assert_eq!(obj["process"], "nginx");
        assert_eq!(obj["memory_usage"], 0.42);
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = RecordFilter::new();
        assert!(!filter.is_active());
        assert_eq!(filter_records(sample(), &filter), sample());
    }

    #[test]
    fn test_port_filter_keeps_duplicates_in_order() {
        let filter = RecordFilter {
            port: Some(8080),
            name: None,
        };
        let kept = filter_records(sample(), &filter);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.port == 8080));
    }

    #[test]
    fn test_name_filter_is_case_insensitive() {
        let filter = RecordFilter {
            port: None,
            name: Some("POST".to_string()),
        };
        let kept = filter_records(sample(), &filter);
        assert_eq!(kept, vec![PortRecord::new(5432, "postgres", 1.5)]);
    }

    #[test]
    fn test_combined_filter() {
        let filter = RecordFilter {
            port: Some(3000),
            name: Some("nginx".to_string()),
        };
        assert!(filter_records(sample(), &filter).is_empty());
    }

    #[test]
    fn test_display() {
        let record = PortRecord::new(80, "nginx", 0.5);
        assert_eq!(record.to_string(), ":80 nginx (0.50% mem)");
    }
}
