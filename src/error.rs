pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("pipeline already consumed by a terminal operation")]
    AlreadyConsumed,

    #[error("runtime not initialized")]
    NotInitialized,

    #[error("already initialized")]
    AlreadyInitialized,

    #[error("{op} failed: {detail}")]
    Element { op: &'static str, detail: String },

    #[error("worker panic: {0}")]
    WorkerPanic(String),

    #[error("executor error: {0}")]
    Executor(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn element<S: Into<String>>(op: &'static str, detail: S) -> Self {
        Error::Element {
            op,
            detail: detail.into(),
        }
    }

    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}
