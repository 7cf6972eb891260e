//! Parser for `wmic logicaldisk get caption,description`.
//!
//! Columns are located from the header: a column starts wherever a
//! non-space character follows a space. Rows are sliced at the same
//! character offsets.
//!
//! ```text
//! Caption  Description       FileSystem
//! C:       Local Fixed Disk  NTFS
//! F:       Removable Disk
//! ```

use std::io::Read;

use partscan_core::{Error, LineSource, Partition, Result};
use tracing::trace;

const SOURCE: &str = "wmic";
const FIELDS: usize = 2;
const REMOVABLE: &str = "Removable Disk";

pub fn parse_logical_disks(reader: impl Read) -> Result<Vec<Partition>> {
    let mut partitions = Vec::new();
    let mut bounds: Option<Vec<usize>> = None;
    for (index, line) in LineSource::from_reader(reader).enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let Some(columns) = bounds.as_deref() else {
            bounds = Some(header_bounds(&line)?);
            continue;
        };
        let fields = slice_row(&line, columns);
        if fields.len() < FIELDS {
            return Err(Error::MalformedLine {
                source_name: SOURCE,
                line: index + 1,
                expected: FIELDS,
                found: fields.len(),
            });
        }
        let caption = fields[0].trim();
        let description = fields[1].trim();
        trace!(caption, description, "logical disk");
        partitions.push(Partition {
            path: caption.to_string(),
            mount_path: caption.to_string(),
            is_removable: description == REMOVABLE,
            ..Partition::default()
        });
    }
    Ok(partitions)
}

/// Character offsets where each column after the first starts, followed by
/// the header length.
pub fn header_bounds(header: &str) -> Result<Vec<usize>> {
    let mut bounds = Vec::new();
    let mut after_space = false;
    let mut len = 0;
    for (offset, ch) in header.chars().enumerate() {
        if ch != ' ' && after_space {
            bounds.push(offset);
        }
        after_space = ch == ' ';
        len = offset + 1;
    }
    bounds.push(len);
    if bounds.len() < FIELDS {
        return Err(Error::MalformedHeader {
            source_name: SOURCE,
            reason: format!("expected at least {FIELDS} columns in {header:?}"),
        });
    }
    Ok(bounds)
}

/// Cuts `row` at `bounds`. The last column runs to the end of the row.
/// Columns the row does not reach are left out.
pub fn slice_row(row: &str, bounds: &[usize]) -> Vec<String> {
    let chars: Vec<char> = row.chars().collect();
    let mut fields = Vec::with_capacity(bounds.len());
    let mut start = 0;
    for (column, &bound) in bounds.iter().enumerate() {
        if start >= chars.len() && column > 0 {
            break;
        }
        let end = if column + 1 == bounds.len() {
            chars.len()
        } else {
            bound.min(chars.len())
        };
        fields.push(chars[start.min(end)..end].iter().collect());
        start = bound;
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGICAL_DISKS: &str = "
Caption  Description       FileSystem
C:       Local Fixed Disk  NTFS
D:       CD-ROM Disc
F:       Removable Disk
J:       Removable Disk    FAT
";

    #[test]
    fn finds_column_starts() {
        let bounds = header_bounds("Caption  Description       FileSystem").unwrap();
        assert_eq!(bounds, vec![9, 27, 37]);
    }

    #[test]
    fn slices_rows_at_header_offsets() {
        let fields = slice_row("C:       Local Fixed Disk  NTFS", &[9, 27, 37]);
        assert_eq!(fields, vec!["C:       ", "Local Fixed Disk  ", "NTFS"]);
    }

    #[test]
    fn last_column_runs_to_end_of_row() {
        let fields = slice_row("C:       Local Fixed Disk  NTFS extra", &[9, 27, 37]);
        assert_eq!(fields[2], "NTFS extra");
    }

    #[test]
    fn parses_logical_disks() {
        let partitions = parse_logical_disks(LOGICAL_DISKS.as_bytes()).unwrap();
        let rows: Vec<(&str, bool)> = partitions
            .iter()
            .map(|p| (p.path.as_str(), p.is_removable))
            .collect();

        assert_eq!(
            rows,
            vec![("C:", false), ("D:", false), ("F:", true), ("J:", true)]
        );
        assert_eq!(partitions[0].mount_path, "C:");
    }

    #[test]
    fn row_ending_in_first_column_is_malformed() {
        let input = "Caption  Description\nC:\n";
        let err = parse_logical_disks(input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedLine {
                source_name: "wmic",
                line: 2,
                expected: 2,
                found: 1,
            }
        ));
    }

    #[test]
    fn single_column_header_is_malformed() {
        let err = parse_logical_disks("Caption\nC:\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedHeader { source_name: "wmic", .. }));
    }
}
