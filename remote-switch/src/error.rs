use std::io;

use crate::hal::Pin;
use crate::svc::pigpio::PigpioError;

/// A configuration entry that cannot be turned into a switch.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("no host configured")]
    MissingHost,
    #[error("invalid host address `{0}`")]
    InvalidHost(String),
    #[error("`{0}` is not a GPIO number")]
    InvalidPort(String),
    #[error("GPIO {0} is out of range (0..={max})", max = Pin::MAX)]
    PortOutOfRange(u32),
    #[error("GPIO {0} has an empty name")]
    EmptyName(Pin),
    #[error("GPIO {pin} on {host} is already assigned to `{owner}`")]
    DuplicatePin {
        host: String,
        pin: Pin,
        owner: String,
    },
}

/// A remote line could not be opened.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("cannot reach {address}")]
    Unreachable {
        address: String,
        #[source]
        source: io::Error,
    },
    #[error("GPIO {pin} rejected by the remote service")]
    Rejected {
        pin: Pin,
        #[source]
        source: PigpioError,
    },
    #[error("remote session failed while opening")]
    Transport(#[from] TransportError),
}

/// A request on an open line failed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("i/o error")]
    Io(#[from] io::Error),
    #[error("remote service error")]
    Remote(#[from] PigpioError),
    #[error("unexpected response to command {expected}, got command {got}")]
    UnexpectedResponse { expected: u32, got: u32 },
    #[error("line already closed")]
    Closed,
}

/// An action was requested on a switch that cannot reach its line. The
/// switch stays registered and retries on the next action.
#[derive(Debug, thiserror::Error)]
pub enum SwitchUnavailable {
    #[error("{switch} not connected")]
    NotConnected {
        switch: String,
        #[source]
        source: ConnectionError,
    },
    #[error("{switch} lost its connection")]
    Transport {
        switch: String,
        #[source]
        source: TransportError,
    },
}

/// Renders an error followed by its sources, `a: b: c`.
pub(crate) fn display_chain(err: &dyn std::error::Error) -> String {
    let mut s = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        s.push_str(": ");
        s.push_str(&e.to_string());
        source = e.source();
    }
    s
}
