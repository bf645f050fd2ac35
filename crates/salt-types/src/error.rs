use thiserror::Error;

#[derive(Error, Debug)]
pub enum SaltError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External depletion code failed: {0}")]
    ExternalCode(String),

    #[error("Process graph error: {0}")]
    Graph(String),

    #[error("Mass balance violated for {nuclide}: expected {expected} g, got {actual} g")]
    MassBalance {
        nuclide: String,
        expected: f64,
        actual: f64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SaltResult<T> = Result<T, SaltError>;
