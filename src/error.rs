use std::env;
use std::fmt::{self, Debug};
use std::io;

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Error {
    pub fn is_invalid_input_error(&self) -> bool {
        self.code == 101
    }

    pub fn is_invalid_coordinates_error(&self) -> bool {
        self.code == 102
    }

    /// Codes below 100 come from the environment (storage, serialization, env vars)
    /// rather than from a bad call.
    pub fn is_internal(&self) -> bool {
        (1..=99).contains(&self.code)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        serialization_error(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        storage_error(err)
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: 101,
        message: "invalid input".into(),
    }
}

pub fn invalid_coordinates_error() -> Error {
    Error {
        code: 102,
        message: "invalid coordinates".into(),
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn storage_error<T: Debug>(err: T) -> Error {
    tracing::warn!("storage failure: {:?}", err);

    Error {
        code: 2,
        message: "storage error".into(),
    }
}

pub fn serialization_error<T: Debug>(err: T) -> Error {
    tracing::warn!("serialization failure: {:?}", err);

    Error {
        code: 3,
        message: "serialization error".into(),
    }
}

pub fn unexpected_error() -> Error {
    Error {
        code: 5,
        message: "unexpected error".into(),
    }
}

#[test]
fn error_classification() {
    assert!(invalid_input_error().is_invalid_input_error());
    assert!(invalid_coordinates_error().is_invalid_coordinates_error());
    assert!(!invalid_coordinates_error().is_internal());
    assert!(unexpected_error().is_internal());
    assert!(Error::from(env::VarError::NotPresent).is_internal());
}

#[test]
fn error_display() {
    assert_eq!(invalid_input_error().to_string(), "invalid input (code 101)");
}

#[test]
fn error_codes_are_stable() {
    let codes: Vec<i32> = vec![
        env_var_error(env::VarError::NotPresent).code,
        storage_error("disk").code,
        serialization_error("json").code,
        unexpected_error().code,
        invalid_input_error().code,
        invalid_coordinates_error().code,
    ];

    assert_eq!(codes, vec![1, 2, 3, 5, 101, 102]);
}
