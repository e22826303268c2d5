use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum LogoError {
    #[error("invalid ICAO code: {0}")]
    InvalidIcao(String),

    #[error("invalid IATA code: {0}")]
    InvalidIata(String),

    #[error("unknown source: {0}")]
    UnknownSource(String),

    #[error("failed to read catalog at {0}")]
    CatalogRead(PathBuf),

    #[error("failed to parse catalog {path}: {message}")]
    CatalogParse { path: PathBuf, message: String },

    #[error("catalog is empty")]
    EmptyCatalog,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config value: {0}")]
    InvalidConfig(String),

    #[error("HTTP client setup failed: {0}")]
    HttpSetup(String),

    #[error("image decode failed: {0}")]
    ImageDecode(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to create output directory {0}")]
    OutputDir(String),

    #[error("target directory does not exist: {0}")]
    #[diagnostic(help("pass the path of a checked-out logo repository"))]
    TargetMissing(PathBuf),

    #[error("source directory does not exist: {0}")]
    SourceMissing(PathBuf),
}
