//! CLI subcommand implementations.

pub mod distribute;
mod util;
pub mod weights;
