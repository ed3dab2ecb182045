use std::future::Future;
use std::time::Duration;

pub mod filter;
pub mod schema;
pub mod subscriptions;

/// Upper bound for a single call against the store. Every storage
/// operation takes one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTimeout(Duration);

impl QueryTimeout {
    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Runs `call`, aborting it once the timeout elapses.
    pub async fn bound<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.0, call).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.0)),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("No subscription matches the given id.")]
    NotFound,
    #[error("The store did not answer within {0:?}.")]
    Timeout(Duration),
    #[error("Failed to execute a query against the store.")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other),
        }
    }
}
