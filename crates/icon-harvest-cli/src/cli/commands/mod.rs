//! CLI command handlers, one per file.

mod flavours;
mod run;
mod tags;

pub use flavours::list_flavours;
pub use run::{run_harvest, RunOverrides};
#[cfg(test)]
pub(crate) use run::apply_overrides;
pub use tags::list_tags;
