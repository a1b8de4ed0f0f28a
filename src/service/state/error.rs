use std::path::PathBuf;

use snafu::Snafu;

pub type Result<T, E = StateError> = ::std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum StateError {
    #[snafu(display("cannot create a temporary state file next to `{}`: {source}", path.display()))]
    CreateTemp {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("cannot serialize notification state: {source}"))]
    Serialize { source: serde_json::Error },

    #[snafu(display("cannot flush notification state to disk: {source}"))]
    Flush { source: std::io::Error },

    #[snafu(display("cannot replace state file `{}`: {source}", path.display()))]
    Replace {
        path: PathBuf,
        source: std::io::Error,
    },
}
