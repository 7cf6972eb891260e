//! Parser for `mount -l`.
//!
//! ```text
//! /dev/sdb1 on /run/media/user/whatever type fuseblk (rw,nosuid,nodev) [whatever]
//! ```

use std::io::Read;
use std::sync::LazyLock;

use partscan_core::{LineSource, Partition, Result};
use regex::Regex;
use tracing::trace;

static MOUNT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(\S+)\s+on\s+(\S+)\s+type\s+(\S+)\s+\(([^)]+)\)(?:\s+\[([^\]]+)\])?")
        .expect("Invalid regex")
});

/// Keeps mounts whose source is an absolute path, with their mount point and
/// the optional `[LABEL]` suffix. Lines that do not look like mounts are
/// ignored.
pub fn parse_mount_table(reader: impl Read) -> Result<Vec<Partition>> {
    let mut partitions = Vec::new();
    for line in LineSource::from_reader(reader) {
        let line = line?;
        let Some(captures) = MOUNT_LINE.captures(&line) else {
            continue;
        };
        let source = &captures[1];
        if !source.starts_with('/') {
            continue;
        }
        let label = captures
            .get(5)
            .map(|label| label.as_str().trim().to_string())
            .unwrap_or_default();
        trace!(source, mount = &captures[2], fs = &captures[3], "mount");
        partitions.push(Partition {
            path: source.to_string(),
            mount_path: captures[2].to_string(),
            label,
            ..Partition::default()
        });
    }
    Ok(partitions)
}
