use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("Malformed markup: {0}")]
    Malformed(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}
