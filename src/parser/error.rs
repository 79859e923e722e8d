use std::fmt;

use crate::ast::Location;
use crate::error::Error;

/// Errors produced while turning source text into a compilation unit.
///
/// Parse errors are fatal for the file: the translator targets a fixed
/// corpus and never attempts recovery or resynchronization.
#[derive(Debug, Clone)]
pub enum ParseError {
    UnexpectedToken {
        expected: String,
        found: String,
        location: Location,
    },
    UnexpectedEndOfInput {
        expected: String,
        location: Location,
    },
    InvalidSyntax {
        message: String,
        location: Location,
    },
    LexicalError {
        message: String,
    },
}

impl ParseError {
    pub fn unexpected_token(expected: &str, found: &str, location: Location) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: found.to_string(),
            location,
        }
    }

    pub fn invalid_syntax(message: impl Into<String>, location: Location) -> Self {
        ParseError::InvalidSyntax {
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken { expected, found, location } => {
                write!(
                    f,
                    "Parse error at {}:{}: expected {}, found {}",
                    location.line, location.column, expected, found
                )
            }
            ParseError::UnexpectedEndOfInput { expected, location } => {
                write!(
                    f,
                    "Parse error at {}:{}: unexpected end of input, expected {}",
                    location.line, location.column, expected
                )
            }
            ParseError::InvalidSyntax { message, location } => {
                write!(
                    f,
                    "Parse error at {}:{}: {}",
                    location.line, location.column, message
                )
            }
            ParseError::LexicalError { message } => {
                write!(f, "Lexical error: {}", message)
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for Error {
    fn from(parse_error: ParseError) -> Self {
        match parse_error {
            ParseError::UnexpectedToken { expected, found, location } => Error::Parse {
                line: location.line,
                column: location.column,
                message: format!("expected {}, found {}", expected, found),
            },
            ParseError::UnexpectedEndOfInput { expected, location } => Error::Parse {
                line: location.line,
                column: location.column,
                message: format!("unexpected end of input, expected {}", expected),
            },
            ParseError::InvalidSyntax { message, location } => Error::Parse {
                line: location.line,
                column: location.column,
                message,
            },
            ParseError::LexicalError { message } => Error::Lexical { message },
        }
    }
}
