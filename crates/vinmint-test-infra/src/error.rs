use thiserror::Error;

pub type Result<T> = std::result::Result<T, TestInfraError>;

/// Failure to bring up a throwaway server for an integration test.
#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("failed to start container: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("failed to connect to redis container: {0}")]
    Connect(#[from] redis::RedisError),
}
