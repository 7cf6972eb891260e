//! Parser for `df -h`.
//!
//! ```text
//! Sys. de fichiers        Taille Utilisé Dispo Uti% Monté sur
//! devtmpfs                  1,9G       0  1,9G   0% /dev
//! /dev/mapper/fedora-root    32G     26G  4,1G  87% /
//! ```

use std::io::Read;

use partscan_core::{Error, LineSource, Partition, Result};
use tracing::trace;

const SOURCE: &str = "df";
const FIELDS: usize = 6;

/// Maps every row after the header to a partition with size, free space and
/// mount point. Duplicate sources are kept; the collection dedups them.
pub fn parse_disk_usage(reader: impl Read) -> Result<Vec<Partition>> {
    let mut partitions = Vec::new();
    for (index, line) in LineSource::from_reader(reader).enumerate() {
        let line = line?;
        if index == 0 || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < FIELDS {
            return Err(Error::MalformedLine {
                source_name: SOURCE,
                line: index + 1,
                expected: FIELDS,
                found: fields.len(),
            });
        }
        trace!(source = fields[0], mount = fields[5], "df row");
        partitions.push(Partition {
            path: fields[0].to_string(),
            size: fields[1].to_string(),
            space_left: fields[3].to_string(),
            mount_path: fields[5].to_string(),
            ..Partition::default()
        });
    }
    Ok(partitions)
}
