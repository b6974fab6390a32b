//! One module per subcommand, each exposing an `execute` function.

pub mod add;
pub mod completions;
pub mod key;
pub mod list;
pub mod remove;
pub mod run;
pub mod show;
