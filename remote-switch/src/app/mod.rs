pub use controller::{ConnectionState, LogicalState, SwitchController};
pub use registry::DeviceRegistry;

pub mod controller;
pub mod registry;
