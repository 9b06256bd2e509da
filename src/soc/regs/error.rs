use std::{error::Error, fmt};

use crate::soc::device::DeviceError;

pub type RegResult<T> = Result<T, RegError>;

/// Represents any failure raised while parsing register definitions or
/// driving registers through a backend.
#[derive(Debug)]
pub enum RegError {
    Io(std::io::Error),
    /// Fatal problem in either definition grammar.
    Parse { line: usize, message: String },
    NoSuchField { register: String, field: String },
    NoSuchMember { scope: String, name: String },
    WrongKind { name: String, expected: &'static str },
    DuplicateName { scope: String, name: String },
    ReadOnly { name: String },
    ValueTooWide { name: String, value: u64, width: u32 },
    IndexOutOfRange { name: String, index: usize, count: usize },
    /// Rebasing or indexing moved `name` past the last 32-bit address.
    AddressOverflow { name: String },
    NotLive,
    /// Malformed accessor path such as `A..B` or `T[x]`.
    BadPath { path: String },
    Device(DeviceError),
}

impl RegError {
    pub(crate) fn parse(message: impl Into<String>, line: usize) -> Self {
        RegError::Parse {
            line,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for RegError {
    fn from(err: std::io::Error) -> Self {
        RegError::Io(err)
    }
}

impl From<DeviceError> for RegError {
    fn from(err: DeviceError) -> Self {
        RegError::Device(err)
    }
}

impl fmt::Display for RegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegError::Io(err) => write!(f, "I/O error: {err}"),
            RegError::Parse { line, message } => {
                write!(f, "parse error: {message} at line {line}")
            }
            RegError::NoSuchField { register, field } => {
                write!(f, "register {register} has no field {field}")
            }
            RegError::NoSuchMember { scope, name } => write!(f, "{scope} has no member {name}"),
            RegError::WrongKind { name, expected } => write!(f, "{name} is not {expected}"),
            RegError::DuplicateName { scope, name } => {
                write!(f, "name {name} defined twice in {scope}")
            }
            RegError::ReadOnly { name } => write!(f, "cannot write to read only {name}"),
            RegError::ValueTooWide { name, value, width } => write!(
                f,
                "value {value:#X} does not fit {width}-bit field {name}"
            ),
            RegError::IndexOutOfRange { name, index, count } => {
                write!(f, "index {index} out of range for {name}[{count}]")
            }
            RegError::AddressOverflow { name } => {
                write!(f, "address of {name} overflows the address space")
            }
            RegError::NotLive => write!(f, "flush requested while writes are not live"),
            RegError::BadPath { path } => write!(f, "malformed register path \"{path}\""),
            RegError::Device(err) => write!(f, "backend error: {err}"),
        }
    }
}

impl Error for RegError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RegError::Io(err) => Some(err),
            RegError::Device(err) => Some(err),
            _ => None,
        }
    }
}
