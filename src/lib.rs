//! Declarative register maps: an indentation based definition grammar, a
//! flattener that resolves shared templates into absolute addresses, typed
//! register/field accessors over a word backend, and a field cache for
//! devices programmed through packed register fields.

pub mod loader;
pub mod soc;

pub use loader::{DefinitionLoader, ParseOptions};
pub use soc::device::{DeviceError, HardwareBackend, WordMemory, WordWindow};
pub use soc::fields::FieldWriter;
pub use soc::regs::runtime::{Accessor, RegisterHandle, RegisterMap, Seed};
pub use soc::regs::{RegError, RegResult};
