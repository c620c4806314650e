pub(crate) mod args;

pub use args::{Action, Cli};
