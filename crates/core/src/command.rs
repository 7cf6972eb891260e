use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, trace};

use crate::{Error, Partition, Result};

/// An external tool invocation: program name plus arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Parses a tool's standard output into partial partition records.
pub type OutputParser<'a> = dyn FnMut(&mut dyn Read) -> Result<Vec<Partition>> + 'a;

/// Access to the host: runs tools and probes directories.
pub trait CommandRunner {
    /// Returns `Ok(false)` when `path` does not exist.
    fn probe_dir(&self, path: &Path) -> Result<bool>;

    /// Runs `command`, feeds its standard output to `parse` and waits for it
    /// to exit. A non-zero exit is an error even when parsing succeeded.
    fn run(&self, command: &ToolCommand, parse: &mut OutputParser<'_>) -> Result<Vec<Partition>>;
}

/// Runs tools as child processes. Their standard error goes straight to ours.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn probe_dir(&self, path: &Path) -> Result<bool> {
        match fs::metadata(path) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(Error::Probe {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn run(&self, command: &ToolCommand, parse: &mut OutputParser<'_>) -> Result<Vec<Partition>> {
        debug!(command = %command, "spawning");
        let launch_error = |source: io::Error| Error::Launch {
            tool: command.to_string(),
            source,
        };
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(launch_error)?;
        let Some(mut stdout) = child.stdout.take() else {
            return Err(launch_error(io::Error::other("stdout was not captured")));
        };

        let parsed = match parse(&mut stdout) {
            Ok(parsed) => parsed,
            Err(err) => {
                drop(stdout);
                let _ = child.kill();
                let _ = child.wait();
                return Err(err);
            }
        };
        drop(stdout);

        let status = child.wait().map_err(|source| Error::Wait {
            tool: command.to_string(),
            source,
        })?;
        trace!(command = %command, %status, "exited");
        if !status.success() {
            return Err(Error::ExitStatus {
                tool: command.to_string(),
                code: status.code(),
            });
        }
        Ok(parsed)
    }
}

#[cfg(any(test, feature = "fixtures"))]
pub use fixture::FixtureRunner;

#[cfg(any(test, feature = "fixtures"))]
mod fixture {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::io;
    use std::path::{Path, PathBuf};

    use super::{CommandRunner, OutputParser, ToolCommand};
    use crate::{Error, Partition, Result};

    /// Serves canned tool output instead of spawning processes.
    ///
    /// Commands without a registered output fail to launch with `NotFound`.
    #[derive(Debug, Default)]
    pub struct FixtureRunner {
        outputs: HashMap<ToolCommand, (String, i32)>,
        dirs: HashSet<PathBuf>,
        unreadable_dirs: HashSet<PathBuf>,
        calls: RefCell<Vec<ToolCommand>>,
    }

    impl FixtureRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_output(self, command: ToolCommand, output: impl Into<String>) -> Self {
            self.with_exit_code(command, output, 0)
        }

        /// Like `with_output`, but the tool exits with `code` after printing.
        pub fn with_exit_code(mut self, command: ToolCommand, output: impl Into<String>, code: i32) -> Self {
            self.outputs.insert(command, (output.into(), code));
            self
        }

        pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
            self.dirs.insert(path.into());
            self
        }

        /// Probing `path` fails with `PermissionDenied`.
        pub fn with_unreadable_dir(mut self, path: impl Into<PathBuf>) -> Self {
            self.unreadable_dirs.insert(path.into());
            self
        }

        /// Commands run so far, in order.
        pub fn calls(&self) -> Vec<ToolCommand> {
            self.calls.borrow().clone()
        }
    }

    impl CommandRunner for FixtureRunner {
        fn probe_dir(&self, path: &Path) -> Result<bool> {
            if self.unreadable_dirs.contains(path) {
                return Err(Error::Probe {
                    path: path.to_path_buf(),
                    source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
                });
            }
            Ok(self.dirs.contains(path))
        }

        fn run(&self, command: &ToolCommand, parse: &mut OutputParser<'_>) -> Result<Vec<Partition>> {
            self.calls.borrow_mut().push(command.clone());
            let Some((output, code)) = self.outputs.get(command) else {
                return Err(Error::Launch {
                    tool: command.to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "no fixture registered"),
                });
            };
            let parsed = parse(&mut output.as_bytes())?;
            if *code != 0 {
                return Err(Error::ExitStatus {
                    tool: command.to_string(),
                    code: Some(*code),
                });
            }
            Ok(parsed)
        }
    }
}
