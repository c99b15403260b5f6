use crate::session::BaseCommand;
use argh::FromArgs;
use directories::BaseDirs;
use std::path::PathBuf;

/// File name of the persistent history, placed in the home directory.
pub const HISTORY_FILE_NAME: &str = ".wrap_history";

pub const DEFAULT_HISTORY_SIZE: usize = 1000;

#[derive(FromArgs, Debug, PartialEq)]
/// Turn any subcommand-style CLI into an interactive REPL.
///
/// Every entered line runs as `<base> <base-args> <line>`. Put `--` before
/// the base command to pass base arguments that start with a dash.
pub struct Args {
    #[argh(switch, short = 'd')]
    /// log debug information to stderr.
    pub debug: bool,

    #[argh(switch)]
    /// disable the colored prompt.
    pub no_color: bool,

    #[argh(option)]
    /// history file to use instead of ~/.wrap_history.
    pub history: Option<PathBuf>,

    #[argh(switch)]
    /// neither read nor write a history file.
    pub no_history: bool,

    #[argh(option, default = "DEFAULT_HISTORY_SIZE")]
    /// maximum number of history entries kept.
    pub history_size: usize,

    #[argh(positional)]
    /// the program to wrap, e.g. git.
    pub base: String,

    #[argh(positional, greedy)]
    /// arguments placed before every entered line.
    pub base_args: Vec<String>,
}

/// Settings the session runs with, derived from [`Args`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base: BaseCommand,
    pub history_file: Option<PathBuf>,
    pub history_size: usize,
    pub color: bool,
    pub debug: bool,
}

impl Config {
    pub fn from_args(args: Args) -> Self {
        let history_file = if args.no_history {
            None
        } else {
            args.history.or_else(default_history_file)
        };
        Self {
            base: BaseCommand::new(args.base, args.base_args),
            history_file,
            history_size: args.history_size,
            color: !args.no_color,
            debug: args.debug,
        }
    }
}

/// `~/.wrap_history`, if the home directory can be determined.
pub fn default_history_file() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(HISTORY_FILE_NAME))
}
