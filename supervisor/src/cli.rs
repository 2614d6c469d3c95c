//! Command-line surface (spec.md §6, grounded on
//! `examples/original_source/config/cli.py`'s `ArgParser`).

use clap::Parser;

/// Which top-level action the supervisor should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Deploy the real network and every autostart sibling, then run the
    /// main loop.
    Start,
    /// Tear down the real network and every autostart sibling's topology.
    Stop,
    /// Forcefully destroy every container-lab topology on the host,
    /// regardless of which process created it.
    Cleanup,
}

/// DigSiNet: run digital siblings of a live network.
#[derive(Debug, Parser)]
#[command(name = "digsinet", version, about)]
pub struct Cli {
    /// Start DigSiNet: create sibling topologies and run controllers, apps,
    /// and interfaces. The default action.
    #[arg(long, conflicts_with_all = ["stop", "cleanup"])]
    pub start: bool,

    /// Stop and remove DigSiNet sibling topologies.
    #[arg(long, conflicts_with_all = ["start", "cleanup"])]
    pub stop: bool,

    /// Forcefully clean up all container-lab topologies on the host.
    #[arg(long, conflicts_with_all = ["start", "stop"])]
    pub cleanup: bool,

    /// Confirm forceful cleanup. Required alongside `--cleanup`.
    #[arg(long)]
    pub yes_i_really_mean_it: bool,

    /// Path to the configuration file.
    #[arg(long, default_value = "./digsinet.yml")]
    pub config: String,

    /// Pass `--reconfigure` through to the container runtime when building
    /// topologies.
    #[arg(long)]
    pub reconfigure: bool,

    /// Enable debug-level logging.
    #[arg(long)]
    pub debug: bool,

    /// Log every dequeued task at info level.
    #[arg(long)]
    pub task_debug: bool,
}

impl Cli {
    /// Which [`Action`] this invocation requested. `--start` is the
    /// default when none of the three flags were passed, matching the
    /// source's `argparse` default.
    #[must_use]
    pub fn action(&self) -> Action {
        if self.cleanup {
            Action::Cleanup
        } else if self.stop {
            Action::Stop
        } else {
            Action::Start
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_start() {
        let cli = Cli::parse_from(["digsinet"]);
        assert_eq!(cli.action(), Action::Start);
    }

    #[test]
    fn stop_and_cleanup_are_mutually_exclusive() {
        let result = Cli::try_parse_from(["digsinet", "--stop", "--cleanup"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_path_defaults_to_digsinet_yml() {
        let cli = Cli::parse_from(["digsinet"]);
        assert_eq!(cli.config, "./digsinet.yml");
    }
}
