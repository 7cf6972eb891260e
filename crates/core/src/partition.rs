use serde::{Deserialize, Serialize};

/// One partition or device as seen by the host tools.
///
/// Every field except `is_removable` is an opaque string taken verbatim from
/// tool output; sizes keep their unit suffix and locale decimal separator.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Partition {
    pub path: String,
    pub label: String,
    pub is_removable: bool,
    pub size: String,
    pub space_left: String,
    pub mount_path: String,
}

impl Partition {
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// A field that [`PartitionList::merge`] may copy from a source record onto
/// the matching target record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeField {
    Label,
    Size,
    SpaceLeft,
    MountPath,
    IsRemovable,
}

impl MergeField {
    /// Copies this field from `source` onto `target`.
    ///
    /// String fields are only copied when the source value is non-empty.
    /// The removable flag is always copied.
    pub fn apply(self, target: &mut Partition, source: &Partition) {
        match self {
            MergeField::Label => copy_non_empty(&mut target.label, &source.label),
            MergeField::Size => copy_non_empty(&mut target.size, &source.size),
            MergeField::SpaceLeft => copy_non_empty(&mut target.space_left, &source.space_left),
            MergeField::MountPath => copy_non_empty(&mut target.mount_path, &source.mount_path),
            MergeField::IsRemovable => target.is_removable = source.is_removable,
        }
    }
}

fn copy_non_empty(target: &mut String, source: &str) {
    if !source.is_empty() {
        target.clear();
        target.push_str(source);
    }
}

/// Ordered collection of partitions keyed by `path`, in discovery order.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct PartitionList(Vec<Partition>);

impl PartitionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Partition> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Partition] {
        &self.0
    }

    /// Returns the first partition whose path equals `path`.
    pub fn find_by_path(&self, path: &str) -> Option<&Partition> {
        self.0.iter().find(|partition| partition.path == path)
    }

    /// Adds every partition whose path is not present yet, in order.
    ///
    /// Existing partitions are never updated. Duplicate paths inside `other`
    /// collapse to their first occurrence.
    pub fn append<I>(&mut self, other: I) -> usize
    where
        I: IntoIterator<Item = Partition>,
    {
        let before = self.0.len();
        for partition in other {
            if self.find_by_path(&partition.path).is_none() {
                self.0.push(partition);
            }
        }
        self.0.len() - before
    }

    /// Copies `fields` from `other` onto partitions with the same path.
    ///
    /// Entries of `other` that match nothing are dropped. Returns the number
    /// of partitions that had a match.
    pub fn merge(&mut self, other: &[Partition], fields: &[MergeField]) -> usize {
        let mut matched = 0;
        for target in &mut self.0 {
            let Some(source) = other.iter().find(|source| source.path == target.path) else {
                continue;
            };
            for field in fields {
                field.apply(target, source);
            }
            matched += 1;
        }
        matched
    }
}

impl From<Vec<Partition>> for PartitionList {
    fn from(partitions: Vec<Partition>) -> Self {
        Self(partitions)
    }
}

impl IntoIterator for PartitionList {
    type Item = Partition;
    type IntoIter = std::vec::IntoIter<Partition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PartitionList {
    type Item = &'a Partition;
    type IntoIter = std::slice::Iter<'a, Partition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
