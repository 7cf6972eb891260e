use std::env;

use partscan_core::{
    CommandRunner, HostInfo, LoadError, PartitionList, PartitionLoader, Platform, SystemRunner,
    ToolCommand,
};
use tracing::{debug, warn};

pub mod wmic;

pub use wmic::parse_logical_disks;

#[derive(Debug, Clone)]
pub struct WindowsSources {
    pub logical_disks: ToolCommand,
}

impl Default for WindowsSources {
    fn default() -> Self {
        Self {
            logical_disks: ToolCommand::new("wmic", ["logicaldisk", "get", "caption,description"]),
        }
    }
}

/// Lists logical disks through `wmic`. Hosts without `wmic` get an empty
/// list.
#[derive(Debug, Default)]
pub struct WindowsLoader<R = SystemRunner> {
    runner: R,
    sources: WindowsSources,
}

impl WindowsLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: CommandRunner> WindowsLoader<R> {
    pub fn with_runner(runner: R, sources: WindowsSources) -> Self {
        Self { runner, sources }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }
}

impl<R: CommandRunner> PartitionLoader for WindowsLoader<R> {
    fn platform(&self) -> Platform {
        Platform::Windows
    }

    fn host_info(&self) -> HostInfo {
        HostInfo {
            os: Platform::Windows.as_str().to_string(),
            os_version: env::var("OS").unwrap_or_else(|_| "unknown".to_string()),
            machine: env::var("COMPUTERNAME").unwrap_or_else(|_| "unknown".to_string()),
        }
    }

    fn load(&self) -> Result<PartitionList, LoadError> {
        let mut partitions = PartitionList::new();
        let disks = match self
            .runner
            .run(&self.sources.logical_disks, &mut |out| parse_logical_disks(out))
        {
            Ok(disks) => disks,
            Err(err) if err.is_tool_missing() => {
                warn!(command = %self.sources.logical_disks, "tool unavailable, no partitions listed");
                return Ok(partitions);
            }
            Err(err) => return Err(LoadError::new("wmic", partitions, err)),
        };
        let added = partitions.append(disks);
        debug!(added, "logical disks");
        Ok(partitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partscan_core::{Error, FixtureRunner};

    const LOGICAL_DISKS: &str = "Caption  Description       \r
C:       Local Fixed Disk  \r
E:       Removable Disk    \r
\r
";

    #[test]
    fn lists_logical_disks() {
        let runner = FixtureRunner::new().with_output(WindowsSources::default().logical_disks, LOGICAL_DISKS);
        let loader = WindowsLoader::with_runner(runner, WindowsSources::default());
        let partitions = loader.load().unwrap();

        assert_eq!(partitions.len(), 2);
        assert!(!partitions.find_by_path("C:").unwrap().is_removable);
        assert!(partitions.find_by_path("E:").unwrap().is_removable);
        assert_eq!(loader.runner().calls().len(), 1);
    }

    #[test]
    fn missing_tool_yields_empty_list() {
        let loader = WindowsLoader::with_runner(FixtureRunner::new(), WindowsSources::default());
        assert!(loader.load().unwrap().is_empty());
    }

    #[test]
    fn malformed_output_is_an_error() {
        let runner = FixtureRunner::new().with_output(WindowsSources::default().logical_disks, "Caption\nC:\n");
        let err = WindowsLoader::with_runner(runner, WindowsSources::default())
            .load()
            .unwrap_err();

        assert_eq!(err.step, "wmic");
        assert!(matches!(err.source, Error::MalformedHeader { .. }));
    }
}
