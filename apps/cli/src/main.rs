use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use partscan_core::{PartitionLoader, PartitionReport, Platform};
use partscan_host_linux::LinuxLoader;
use partscan_host_windows::WindowsLoader;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// List storage partitions with their label, size, free space, mount point
/// and removability.
#[derive(Debug, Parser)]
#[command(name = "partscan", version)]
struct Cli {
    /// Which platform's tools to query.
    #[arg(long, value_enum, default_value_t = PlatformArg::Auto, global = true)]
    platform: PlatformArg,

    /// Print JSON on a single line instead of indented.
    #[arg(long, global = true)]
    compact: bool,

    /// Log more to stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Print the partition list (default).
    List,
    /// Print the partition list wrapped with host details and a timestamp.
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PlatformArg {
    Auto,
    Linux,
    Windows,
}

impl PlatformArg {
    fn resolve(self) -> Platform {
        match self {
            PlatformArg::Auto => Platform::current(),
            PlatformArg::Linux => Platform::Linux,
            PlatformArg::Windows => Platform::Windows,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loader = select_loader(cli.platform.resolve());
    debug!(platform = loader.platform().as_str(), "loading partitions");
    let partitions = loader
        .load()
        .with_context(|| format!("failed to list partitions on {}", loader.platform().as_str()))?;

    match cli.command.unwrap_or(Command::List) {
        Command::List => print_json(&partitions, cli.compact),
        Command::Report => {
            let report = PartitionReport::new(loader.host_info(), partitions);
            print_json(&report, cli.compact)
        }
    }
}

fn select_loader(platform: Platform) -> Box<dyn PartitionLoader> {
    match platform {
        Platform::Linux => Box::new(LinuxLoader::new()),
        Platform::Windows => Box::new(WindowsLoader::new()),
    }
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{rendered}");
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_list_on_host_platform() {
        let cli = Cli::try_parse_from(["partscan"]).unwrap();
        assert_eq!(cli.platform, PlatformArg::Auto);
        assert_eq!(cli.command, None);
        assert!(!cli.compact);
        assert_eq!(cli.platform.resolve(), Platform::current());
    }

    #[test]
    fn parses_report_with_global_flags() {
        let cli = Cli::try_parse_from(["partscan", "report", "--platform", "windows", "-vv", "--compact"]).unwrap();
        assert_eq!(cli.command, Some(Command::Report));
        assert_eq!(cli.platform.resolve(), Platform::Windows);
        assert_eq!(cli.verbose, 2);
        assert!(cli.compact);
    }

    #[test]
    fn selects_loader_for_platform() {
        assert_eq!(select_loader(Platform::Linux).platform(), Platform::Linux);
        assert_eq!(select_loader(Platform::Windows).platform(), Platform::Windows);
    }

    #[test]
    fn rejects_unknown_platform() {
        assert!(Cli::try_parse_from(["partscan", "--platform", "beos"]).is_err());
    }
}
