use std::io;
use thiserror::Error;

// Errors from one count call. None of them are retried.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("{op} failed: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("undecodable entry at byte {offset}: {reason}")]
    Decode { offset: u64, reason: String },

    #[error("timestamp {0} cannot be encoded as a log entry")]
    InvalidTimestamp(String),

    #[error("failed to acquire log lock: {0}")]
    Lock(#[source] io::Error),

    #[error("no admission slot within {waited_ms}ms")]
    Overloaded { waited_ms: u128 },

    #[error("counter is shut down")]
    Closed,

    #[error("counting task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CounterError {
    pub fn io(op: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| CounterError::Io { op, source }
    }

    pub fn is_overloaded(&self) -> bool {
        matches!(self, CounterError::Overloaded { .. })
    }
}

// Startup/serve errors for the whole application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] io::Error),

    #[error(transparent)]
    Service(#[from] CounterError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_helper_keeps_operation_name() {
        let err = CounterError::io("file seek")(io::Error::other("boom"));
        assert_eq!(err.to_string(), "file seek failed: boom");
    }

    #[test]
    fn only_overloaded_is_overloaded() {
        assert!(CounterError::Overloaded { waited_ms: 5 }.is_overloaded());
        assert!(!CounterError::Closed.is_overloaded());
    }
}
