use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    /// Neither a summary nor a records file was given to the export.
    #[error("Chart export needs either a summary or a records file")]
    MissingInput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Loading records failed: {0:#}")]
    Records(anyhow::Error),

    #[error("Drawing {file} failed: {message}")]
    Drawing { file: String, message: String },
}
