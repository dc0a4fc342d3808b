use thiserror::Error;

#[derive(Error, Debug)]
pub enum TetherError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Markup error: {0}")]
    Markup(#[from] tether_dom::DomError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    RootNotFound(String),
}

pub type Result<T> = std::result::Result<T, TetherError>;
