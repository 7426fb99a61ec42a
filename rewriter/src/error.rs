use std::io;
use std::path::PathBuf;

use docfix::SpliceError;

#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("cannot read '{}': {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write '{}': {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid recipe: {0}")]
    RecipeSyntax(#[from] toml::de::Error),

    #[error("invalid recipe: {0}")]
    InvalidRecipe(String),

    #[error(transparent)]
    Splice(#[from] SpliceError),
}

impl RewriteError {
    /// The structural error behind this one, if any. Only these carry a
    /// source location.
    pub fn as_splice(&self) -> Option<&SpliceError> {
        match self {
            RewriteError::Splice(error) => Some(error),
            _ => None,
        }
    }
}
