// src/cli.rs

use clap::error::ErrorKind;
use clap::Parser;

/// Streaming-job bootstrap.
///
/// The config file is the source of truth for everything about the job;
/// the command line only carries the checkpoint directive, because whether
/// this particular process restores or starts fresh is a property of the
/// launch, not of the job.
#[derive(Parser, Debug)]
#[command(name = "streamboot", version, disable_help_subcommand = true)]
pub struct Cli {
    /// Checkpoint directory to restore the job from.
    ///
    /// Empty (the default) means no recovery is requested and a fresh
    /// execution context is constructed.
    #[arg(long = "checkpointPath", value_name = "PATH", default_value = "")]
    pub checkpoint_path: String,

    /// Whether a failed restore falls back to creating a fresh context.
    ///
    /// With `false`, a failed restore aborts the launch instead.
    #[arg(
        long = "createOnError",
        value_name = "BOOL",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub create_on_error: bool,
}

/// What the launch asked for, checkpoint-wise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointDirective {
    /// Checkpoint directory; empty means "no recovery requested".
    pub path: String,
    /// Fall back to fresh creation when restore fails.
    pub create_on_error: bool,
}

impl CheckpointDirective {
    pub fn wants_restore(&self) -> bool {
        !self.path.is_empty()
    }
}

impl From<Cli> for CheckpointDirective {
    fn from(cli: Cli) -> Self {
        Self {
            path: cli.checkpoint_path,
            create_on_error: cli.create_on_error,
        }
    }
}

/// Parse the process arguments, owning the usage contract: any
/// unrecognized token prints usage to stderr and terminates with exit
/// code 1, before any config has been touched.
pub fn parse_or_usage() -> CheckpointDirective {
    match Cli::try_parse() {
        Ok(cli) => cli.into(),
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            std::process::exit(code);
        }
    }
}
