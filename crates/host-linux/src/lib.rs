use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use partscan_core::{
    CommandRunner, HostInfo, LoadError, MergeField, Partition, PartitionList, PartitionLoader,
    Platform, Result, SystemRunner, ToolCommand,
};
use tracing::{debug, warn};

pub mod df;
pub mod listing;
pub mod mount;

pub use df::parse_disk_usage;
pub use listing::{decode_link_name, parse_link_listing, resolve_link_target};
pub use mount::parse_mount_table;

/// Where the Linux loader gets its data from.
#[derive(Debug, Clone)]
pub struct LinuxSources {
    pub disk_usage: ToolCommand,
    pub mount_table: ToolCommand,
    /// Long-format listing; the directory is appended as the last argument.
    pub link_listing: ToolCommand,
    pub label_dir: PathBuf,
    pub id_dir: PathBuf,
    /// Device ids starting with this prefix are reported as removable.
    pub removable_id_prefix: String,
}

impl Default for LinuxSources {
    fn default() -> Self {
        Self {
            disk_usage: ToolCommand::new("df", ["-h"]),
            mount_table: ToolCommand::new("mount", ["-l"]),
            link_listing: ToolCommand::new("ls", ["-l"]),
            label_dir: PathBuf::from("/dev/disk/by-label/"),
            id_dir: PathBuf::from("/dev/disk/by-id/"),
            removable_id_prefix: "usb-".to_string(),
        }
    }
}

/// Combines `df`, the udev label and id directories and `mount` into one
/// partition list.
#[derive(Debug, Default)]
pub struct LinuxLoader<R = SystemRunner> {
    runner: R,
    sources: LinuxSources,
}

impl LinuxLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: CommandRunner> LinuxLoader<R> {
    pub fn with_runner(runner: R, sources: LinuxSources) -> Self {
        Self { runner, sources }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn disk_usage(&self) -> Result<Vec<Partition>> {
        self.runner
            .run(&self.sources.disk_usage, &mut |out| parse_disk_usage(out))
    }

    fn labels(&self) -> Result<Vec<Partition>> {
        self.list_links(&self.sources.label_dir)
    }

    fn removable_ids(&self) -> Result<Vec<Partition>> {
        let prefix = self.sources.removable_id_prefix.as_str();
        let removable = self
            .list_links(&self.sources.id_dir)?
            .into_iter()
            .filter(|partition| partition.label.starts_with(prefix))
            .map(|partition| Partition {
                is_removable: true,
                ..partition
            })
            .collect();
        Ok(removable)
    }

    fn mounts(&self) -> Result<Vec<Partition>> {
        self.runner
            .run(&self.sources.mount_table, &mut |out| parse_mount_table(out))
    }

    fn list_links(&self, dir: &Path) -> Result<Vec<Partition>> {
        if !self.runner.probe_dir(dir)? {
            // No labelled or removable devices attached.
            warn!(dir = %dir.display(), "directory absent, skipping");
            return Ok(Vec::new());
        }
        let mut command = self.sources.link_listing.clone();
        command.args.push(dir.to_string_lossy().into_owned());
        self.runner
            .run(&command, &mut |out| parse_link_listing(out, dir))
    }
}

fn step<T>(name: &'static str, partitions: &mut PartitionList, result: Result<T>) -> std::result::Result<T, LoadError> {
    result.map_err(|source| {
        warn!(step = name, error = %source, "load step failed");
        LoadError::new(name, mem::take(partitions), source)
    })
}

impl<R: CommandRunner> PartitionLoader for LinuxLoader<R> {
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    fn host_info(&self) -> HostInfo {
        HostInfo {
            os: Platform::Linux.as_str().to_string(),
            os_version: os_release_name().unwrap_or_else(|| "unknown".to_string()),
            machine: read_trimmed("/proc/sys/kernel/hostname").unwrap_or_else(|| "unknown".to_string()),
        }
    }

    fn load(&self) -> std::result::Result<PartitionList, LoadError> {
        let mut partitions = PartitionList::new();

        let usage = step("df", &mut partitions, self.disk_usage())?;
        let added = partitions.append(usage);
        debug!(added, "disk usage");

        let labels = step("by-label", &mut partitions, self.labels())?;
        let added = partitions.append(labels);
        debug!(added, "labels");

        let removable = step("by-id", &mut partitions, self.removable_ids())?;
        let matched = partitions.merge(&removable, &[MergeField::IsRemovable]);
        debug!(matched, "removable ids");

        let mounts = step("mount", &mut partitions, self.mounts())?;
        let matched = partitions.merge(&mounts, &[MergeField::Label]);
        debug!(matched, "mount labels");

        Ok(partitions)
    }
}

fn os_release_name() -> Option<String> {
    let data = fs::read_to_string("/etc/os-release").ok()?;
    let value = |key: &str| {
        data.lines()
            .find_map(|line| line.strip_prefix(key)?.strip_prefix('='))
            .map(|value| value.trim().trim_matches('"').to_string())
    };
    value("PRETTY_NAME").or_else(|| value("NAME"))
}

fn read_trimmed(path: impl AsRef<Path>) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
