use std::{error::Error, fmt};

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Failures reported by a hardware backend. The register layers never
/// interpret these; they travel back to the caller untouched.
#[derive(Debug)]
pub enum DeviceError {
    OutOfRange { address: u32, capacity: usize },
    Unsupported(&'static str),
    Io(std::io::Error),
    Fault(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::OutOfRange { address, capacity } => write!(
                f,
                "register 0x{address:X} outside backend of {capacity} words"
            ),
            DeviceError::Unsupported(what) => write!(f, "backend does not support {what}"),
            DeviceError::Io(err) => write!(f, "I/O error: {err}"),
            DeviceError::Fault(msg) => write!(f, "device fault: {msg}"),
        }
    }
}

impl From<std::io::Error> for DeviceError {
    fn from(err: std::io::Error) -> Self {
        DeviceError::Io(err)
    }
}

impl Error for DeviceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DeviceError::Io(err) => Some(err),
            _ => None,
        }
    }
}
