pub mod backend;
pub mod error;
pub mod memory;
pub mod window;

pub use backend::HardwareBackend;
pub use error::{DeviceError, DeviceResult};
pub use memory::WordMemory;
pub use window::WordWindow;
