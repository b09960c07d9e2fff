//! GNU-style build configuration variables: installation directories, helper programs and
//! compiler settings, each settable from the construction environment, a `NAME=value`
//! command-line variable, or (for directories) a `--name=value` option.
//!
//! The tables live in [`gnu_dirs`], [`progs`] and [`cc`]. [`env::BuildEnv`], [`variables::Variables`]
//! and [`options::Options`] are the host objects the [`gvars`] engine reads from and writes to.

pub mod cc;
pub mod defaults;
pub mod env;
pub mod gnu_dirs;
pub mod options;
pub mod progs;
pub mod variables;

pub type GnuBuildResult<T> = anyhow::Result<T>;
