// Error types for preitv

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum PreItvError {
    // User input validation errors
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },
    #[snafu(display("Unknown fuel type: {value}"))]
    UnknownFuelType { value: String },

    // Collaborator errors
    #[snafu(display("City not found: {city}"))]
    CityNotFound { city: String },
    #[snafu(display("Could not compute route: {reason}"))]
    RouteUnavailable { reason: String },

    // Rule table errors
    #[snafu(display("Invalid maintenance rule table: {reason}"))]
    InvalidRuleTable { reason: String },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Data file errors (catalogs, gazetteers, rule tables)
    #[snafu(display("Error reading data file: {path}"))]
    DataFileError { path: String, source: io::Error },
    #[snafu(display("Error parsing data file: {path}"))]
    DataParseError {
        path: String,
        source: serde_json::Error,
    },

    // History store errors
    #[snafu(display("History store error"))]
    HistoryIOError { source: io::Error },
}

impl PreItvError {
    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        PreItvError::InvalidUserInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
