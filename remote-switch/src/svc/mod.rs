pub use std_pigpio::{PigpioConnector, PigpioOutput};

pub mod pigpio;
mod std_pigpio;

#[cfg(test)]
pub(crate) mod fake;
