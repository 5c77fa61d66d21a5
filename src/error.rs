use crate::host::HostError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} is required in environment variables")]
    MissingEnv(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    InvalidEnv { name: &'static str, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

pub type Result<T> = std::result::Result<T, Error>;
