//! Shared model for partition discovery: the partition record and its
//! path-keyed collection, the line source the tool parsers read from, the
//! boundary to external tools and the per-platform loader contract.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

pub mod command;
pub mod error;
pub mod line_source;
pub mod partition;

pub use command::{CommandRunner, OutputParser, SystemRunner, ToolCommand};
pub use error::{Error, LoadError, Result};
pub use line_source::LineSource;
pub use partition::{MergeField, Partition, PartitionList};

#[cfg(any(test, feature = "fixtures"))]
pub use command::FixtureRunner;

pub const PARTITION_REPORT_SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Windows,
}

impl Platform {
    /// Windows hosts get the Windows loader, everything else the Linux one.
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Windows => "windows",
        }
    }
}

/// Builds the partition list for one platform.
pub trait PartitionLoader {
    fn platform(&self) -> Platform;

    fn host_info(&self) -> HostInfo;

    /// Runs every source in order. The first failing step aborts the load;
    /// the returned error keeps whatever was collected before it.
    fn load(&self) -> std::result::Result<PartitionList, LoadError>;
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HostInfo {
    pub os: String,
    pub os_version: String,
    pub machine: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PartitionReport {
    pub report_id: Uuid,
    pub schema_version: String,
    pub host: HostInfo,
    pub partitions: PartitionList,
    pub generated_at_utc: String,
}

impl PartitionReport {
    pub fn new(host: HostInfo, partitions: PartitionList) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            schema_version: PARTITION_REPORT_SCHEMA_VERSION.to_string(),
            host,
            partitions,
            generated_at_utc: now_utc_rfc3339(),
        }
    }
}

pub fn now_utc_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_wraps_partitions() {
        let host = HostInfo {
            os: "linux".to_string(),
            os_version: "Fedora 25".to_string(),
            machine: "box".to_string(),
        };
        let partitions = PartitionList::from(vec![Partition::with_path("/dev/sda1")]);
        let report = PartitionReport::new(host, partitions);

        assert_eq!(report.schema_version, PARTITION_REPORT_SCHEMA_VERSION);
        assert_eq!(report.partitions.len(), 1);
        assert!(report.generated_at_utc.ends_with('Z'));

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["partitions"][0]["Path"], "/dev/sda1");
        assert_eq!(value["host"]["os"], "linux");
    }

    #[test]
    fn platform_names() {
        assert_eq!(Platform::Linux.as_str(), "linux");
        assert_eq!(Platform::Windows.as_str(), "windows");
    }
}
