//! Interactive REPL for subcommand-style command-line tools.
//!
//! `wrap git` opens a `git> ` prompt where every line runs as
//! `git <line>`. Lines starting with `:` are builtins handled by the wrapper
//! (`:set`, `:cd`, `:exit`, ...), lines starting with `!` go to the system
//! shell, and `${name}` references are replaced with variables set via
//! `:set name=value`.
//!
//! The main entry points are [`Repl`], which drives a [`LineSource`], and
//! [`Dispatcher`], which executes one logical line against a [`Session`].

pub mod builtin;
pub mod completion;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod external;
pub mod lexer;
pub mod plugin;
pub mod repl;
pub mod session;
pub mod vars;

pub use builtin::BUILTIN_NAMES;
pub use dispatch::{Dispatcher, Flow};
pub use error::WrapError;
pub use repl::{LineSource, Repl};
pub use session::{BaseCommand, Session};
