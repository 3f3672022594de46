use std::path::PathBuf;

use thiserror::Error;

pub mod models;
pub mod repository;
pub mod store;

pub mod prelude {
    pub use super::models::ChatId;
    pub use super::repository::ScoreRepository;
    pub use super::store::JsonStore;
    pub use super::{StoreErr, StoreResult};
}

pub type StoreResult<T> = core::result::Result<T, StoreErr>;

#[derive(Debug, Error)]
pub enum StoreErr {
    #[error("score file i/o failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}
