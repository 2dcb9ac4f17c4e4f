use crate::types::DatasetRole;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZapError {
    #[error("No input file found for role '{role}'")]
    InputNotFound { role: DatasetRole },

    #[error("Cannot parse {role} file '{file}': {reason}")]
    Parse {
        role:   DatasetRole,
        file:   String,
        reason: String,
    },

    #[error("Invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name:   &'static str,
        value:  String,
        reason: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ZapError {
    /// Soft errors the caller should surface as "add this file to get this report".
    pub fn is_missing_input(&self) -> bool {
        matches!(self, ZapError::InputNotFound { .. })
    }
}

pub type ZapResult<T> = Result<T, ZapError>;
