use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Hitime(#[from] hitime::HitimeError),

    #[error("Error interpreting the config: {0}")]
    Config(String),

    #[error("Could not set up logging: {0}")]
    Logging(#[from] tracing::subscriber::SetGlobalDefaultError),
}
