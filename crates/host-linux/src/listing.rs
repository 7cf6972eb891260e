//! Parser for `ls -l` over the udev symlink directories
//! (`/dev/disk/by-label/`, `/dev/disk/by-id/`).
//!
//! ```text
//! total 0
//! lrwxrwxrwx 1 root root 10 27 févr. 11:04 'System\x20Reserved' -> ../../sda2
//! ```

use std::env;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use partscan_core::{Error, LineSource, Partition, Result};
use tracing::trace;

const SOURCE: &str = "ls";
const FIELDS: usize = 11;
const NAME_FIELD: usize = 8;
const TARGET_FIELD: usize = 10;

/// Emits one partition per symlink: the decoded link name as label and the
/// link target, resolved against `dir`, as path.
pub fn parse_link_listing(reader: impl Read, dir: &Path) -> Result<Vec<Partition>> {
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
        let label = decode_link_name(fields[NAME_FIELD]);
        let path = resolve_link_target(dir, fields[TARGET_FIELD])?;
        trace!(%label, path = %path.display(), "link");
        partitions.push(Partition {
            label,
            path: path.to_string_lossy().into_owned(),
            ..Partition::default()
        });
    }
    Ok(partitions)
}

/// Strips the quotes `ls` puts around names with special characters and
/// restores the spaces udev escapes as `\x20`.
pub fn decode_link_name(raw: &str) -> String {
    let name = raw.strip_prefix('\'').unwrap_or(raw);
    let name = name.strip_suffix('\'').unwrap_or(name);
    name.replace("\\x20", " ")
}

/// Joins `target` onto `dir` and normalizes the result lexically into an
/// absolute path. The filesystem is not consulted.
pub fn resolve_link_target(dir: &Path, target: &str) -> Result<PathBuf> {
    let joined = dir.join(target);
    let absolute = if joined.is_absolute() {
        joined
    } else {
        let cwd = env::current_dir().map_err(|source| Error::Probe {
            path: joined.clone(),
            source,
        })?;
        cwd.join(joined)
    };
    Ok(normalize(&absolute))
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `pop` refuses to go above the root.
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    const BY_LABEL: &str = "total 0
lrwxrwxrwx 1 root root 10 27 févr. 11:04 Recovery -> ../../sda1
lrwxrwxrwx 1 root root 10 27 févr. 11:04 stockage -> ../../sda6
lrwxrwxrwx 1 root root 10 27 févr. 11:04 'System\\x20Reserved' -> ../../sda2
";

    #[test]
    fn parses_label_directory() {
        let partitions = parse_link_listing(BY_LABEL.as_bytes(), Path::new("/dev/disk/by-label/")).unwrap();
        let pairs: Vec<(&str, &str)> = partitions
            .iter()
            .map(|p| (p.path.as_str(), p.label.as_str()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("/dev/sda1", "Recovery"),
                ("/dev/sda6", "stockage"),
                ("/dev/sda2", "System Reserved"),
            ]
        );
        assert!(partitions.iter().all(|p| !p.is_removable));
    }

    #[test]
    fn decodes_quoted_names() {
        assert_eq!(decode_link_name("'System\\x20Reserved'"), "System Reserved");
        assert_eq!(decode_link_name("'a\\x20b\\x20c'"), "a b c");
        assert_eq!(decode_link_name("plain"), "plain");
    }

    #[test]
    fn resolves_relative_targets() {
        let dir = Path::new("/dev/disk/by-label/");
        assert_eq!(resolve_link_target(dir, "../../sda1").unwrap(), PathBuf::from("/dev/sda1"));
        assert_eq!(resolve_link_target(dir, "./../../sdb").unwrap(), PathBuf::from("/dev/sdb"));
        assert_eq!(resolve_link_target(dir, "/dev/sdc1").unwrap(), PathBuf::from("/dev/sdc1"));
    }

    #[test]
    fn parent_of_root_stays_root() {
        let resolved = resolve_link_target(Path::new("/dev"), "../../../sda1").unwrap();
        assert_eq!(resolved, PathBuf::from("/sda1"));
    }

    #[test]
    fn short_entry_is_malformed() {
        let input = "total 0\nlrwxrwxrwx 1 root root 10 Recovery\n";
        let err = parse_link_listing(input.as_bytes(), Path::new("/dev/disk/by-label/")).unwrap_err();
        assert!(matches!(err, Error::MalformedLine { source_name: "ls", line: 2, .. }));
    }

    #[test]
    fn empty_directory_listing() {
        let partitions = parse_link_listing("total 0\n".as_bytes(), Path::new("/dev/disk/by-id/")).unwrap();
        assert!(partitions.is_empty());
    }
}
