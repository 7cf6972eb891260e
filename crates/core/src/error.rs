use std::io;
use std::path::PathBuf;

use crate::PartitionList;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to launch `{tool}`: {source}")]
    Launch {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// `code` is `None` when the tool was killed by a signal.
    #[error("`{tool}` exited with {}", describe_exit(.code))]
    ExitStatus { tool: String, code: Option<i32> },

    #[error("failed to wait for `{tool}`: {source}")]
    Wait {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read tool output: {0}")]
    Read(#[from] io::Error),

    #[error("failed to inspect {}: {source}", .path.display())]
    Probe {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{source_name} line {line}: expected at least {expected} fields, found {found}")]
    MalformedLine {
        source_name: &'static str,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{source_name} header: {reason}")]
    MalformedHeader {
        source_name: &'static str,
        reason: String,
    },
}

impl Error {
    /// True when the tool could not be started because it does not exist.
    pub fn is_tool_missing(&self) -> bool {
        matches!(self, Error::Launch { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// A loader step failed. Holds what had been collected before the failure.
#[derive(Debug, thiserror::Error)]
#[error("{step} step failed: {source}")]
pub struct LoadError {
    pub step: &'static str,
    pub partial: PartitionList,
    #[source]
    pub source: Error,
}

impl LoadError {
    pub fn new(step: &'static str, partial: PartitionList, source: Error) -> Self {
        Self {
            step,
            partial,
            source,
        }
    }
}
