pub mod error;
pub mod executor;
pub mod recipe;

pub use error::RewriteError;
pub use executor::{Mode, Outcome, Report, Rewrite, Warning, apply, commit, read_source, rewrite_file};
pub use recipe::{DEFAULT_TARGET, Recipe};
