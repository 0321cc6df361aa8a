use thiserror::Error;

use crate::history::HistoryError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IPC error: {0}")]
    Ipc(#[from] cwf_help_ipc::Error),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Help module not found: {0}")]
    ModuleNotFound(String),

    #[error("Help set error: {0}")]
    HelpSet(String),

    #[error("Unsupported help set format: {0}")]
    UnsupportedFormat(String),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Window launch failed: {0}")]
    Launch(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "helpset.json");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("IO error"));
        assert!(err.to_string().contains("helpset.json"));
    }

    #[test]
    fn test_error_display_module_not_found() {
        let err = Error::ModuleNotFound("cwf_help_en".to_string());
        assert_eq!(err.to_string(), "Help module not found: cwf_help_en");
    }

    #[test]
    fn test_error_display_unsupported_format() {
        let err = Error::UnsupportedFormat("chm".to_string());
        assert_eq!(err.to_string(), "Unsupported help set format: chm");
    }

    #[test]
    fn test_from_ipc_error() {
        let err: Error = cwf_help_ipc::Error::QueueClosed("help1".to_string()).into();
        assert!(matches!(err, Error::Ipc(_)));
        assert!(err.to_string().contains("help1"));
    }

    #[test]
    fn test_from_history_error() {
        let err: Error = HistoryError::OutOfRange { position: 4, len: 2 }.into();
        assert!(matches!(err, Error::History(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("\"not a number\"").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
