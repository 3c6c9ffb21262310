use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("job not found: {0}")]
    NotFound(String),
    #[error("store is poisoned")]
    Poisoned,
}
