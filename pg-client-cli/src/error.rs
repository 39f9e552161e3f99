use std::fmt;

#[derive(Debug)]
pub enum CliError {
    Client(pg_client::error::Error),
    Io(std::io::Error),
    Json(serde_json::Error),
    Usage(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Client(e) => write!(f, "{e}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
            CliError::Json(e) => write!(f, "invalid JSON: {e}"),
            CliError::Usage(s) => write!(f, "{s}"),
        }
    }
}

impl From<pg_client::error::Error> for CliError {
    fn from(e: pg_client::error::Error) -> Self {
        CliError::Client(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}
