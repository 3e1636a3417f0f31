use std::fmt;

use crate::error::{display_chain, ConnectionError, SwitchUnavailable, TransportError};
use crate::hal::{Connector, DigitalOutput, Pin, Polarity, RemoteAddress, Switch, SwitchState};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
    Unavailable,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum LogicalState {
    #[default]
    Unknown,
    Off,
    On,
}

impl From<bool> for LogicalState {
    fn from(on: bool) -> Self {
        if on {
            LogicalState::On
        } else {
            LogicalState::Off
        }
    }
}

/// A named switch backed by at most one remote line.
///
/// The line is opened on demand: `turn_on`, `turn_off` and
/// `ensure_connected` reconnect a switch that is not connected, reads never
/// do. Any failure drops the line and leaves the switch `Unavailable` until
/// the next action.
pub struct SwitchController<C: Connector> {
    name: String,
    address: RemoteAddress,
    pin: Pin,
    polarity: Polarity,
    initial_value: Option<bool>,
    connector: C,
    output: Option<C::Output>,
    connection_state: ConnectionState,
    logical_state: LogicalState,
}

impl<C: Connector> SwitchController<C> {
    pub fn new(
        name: impl Into<String>,
        address: RemoteAddress,
        pin: Pin,
        invert_logic: bool,
        connector: C,
    ) -> Self {
        Self {
            name: name.into(),
            address,
            pin,
            polarity: Polarity::from_invert_logic(invert_logic),
            initial_value: None,
            connector,
            output: None,
            connection_state: ConnectionState::Disconnected,
            logical_state: LogicalState::Unknown,
        }
    }

    /// Drive the line to `value` when `ensure_connected` opens it instead of
    /// reading its state back. Lines opened by `turn_on` or `turn_off` only
    /// get the requested state.
    pub fn with_initial_value(mut self, value: Option<bool>) -> Self {
        self.initial_value = value;
        self
    }

    pub fn address(&self) -> &RemoteAddress {
        &self.address
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn is_active_high(&self) -> bool {
        self.polarity.is_active_high()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    pub fn logical_state(&self) -> LogicalState {
        self.logical_state
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state == ConnectionState::Connected
    }

    pub fn ensure_connected(&mut self) -> Result<(), ConnectionError> {
        self.connect(true)
    }

    fn connect(&mut self, apply_initial_value: bool) -> Result<(), ConnectionError> {
        if self.output.is_none() {
            let output = self.open(apply_initial_value)?;
            self.output = Some(output);
        }
        Ok(())
    }

    /// Reads the line again. A switch that is not connected stays as it is.
    pub fn refresh(&mut self) -> SwitchState {
        if let Some(output) = self.output.as_mut() {
            match output.is_lit() {
                Ok(lit) => self.logical_state = lit.into(),
                Err(e) => {
                    log::error!("failed to read {}: {}", self, display_chain(&e));
                    self.mark_unavailable();
                }
            }
        }
        self.state()
    }

    pub fn disconnect(&mut self) {
        if let Some(mut output) = self.output.take() {
            output.close();
            log::debug!("{} disconnected", self);
        }
        self.connection_state = ConnectionState::Disconnected;
        self.logical_state = LogicalState::Unknown;
    }

    fn open(&mut self, apply_initial_value: bool) -> Result<C::Output, ConnectionError> {
        log::debug!(
            "setting up output {} on {} pin {}{}",
            self.name,
            self.address,
            self.pin,
            if self.polarity.is_active_high() { "" } else { " inverted" },
        );

        let initial_value = self.initial_value.filter(|_| apply_initial_value);
        let result = self
            .connector
            .open(&self.address, self.pin, self.polarity)
            .and_then(|mut output| {
                let lit = match initial_value {
                    Some(value) => output.set(value).map(|_| value),
                    None => output.is_lit(),
                };
                match lit {
                    Ok(lit) => Ok((output, lit)),
                    Err(e) => {
                        output.close();
                        Err(e.into())
                    }
                }
            });

        match result {
            Ok((output, lit)) => {
                self.connection_state = ConnectionState::Connected;
                self.logical_state = lit.into();
                log::info!("{} connected, {}", self, self.state());
                Ok(output)
            }
            Err(e) => {
                log::error!("failed to connect {}: {}", self, display_chain(&e));
                self.mark_unavailable();
                Err(e)
            }
        }
    }

    fn change_state(&mut self, on: bool) -> Result<(), SwitchUnavailable> {
        log::debug!("turn {} {}", if on { "on" } else { "off" }, self);

        if let Err(source) = self.connect(false) {
            return Err(SwitchUnavailable::NotConnected {
                switch: self.to_string(),
                source,
            });
        }

        let result = match self.output.as_mut() {
            Some(output) => output.set(on),
            None => Err(TransportError::Closed),
        };

        match result {
            Ok(()) => {
                self.logical_state = on.into();
                Ok(())
            }
            Err(source) => {
                log::error!(
                    "failed to change state of {}: {}",
                    self,
                    display_chain(&source)
                );
                self.mark_unavailable();
                Err(SwitchUnavailable::Transport {
                    switch: self.to_string(),
                    source,
                })
            }
        }
    }

    fn mark_unavailable(&mut self) {
        if let Some(mut output) = self.output.take() {
            output.close();
        }
        self.connection_state = ConnectionState::Unavailable;
        self.logical_state = LogicalState::Unknown;
    }
}

impl<C: Connector> Switch for SwitchController<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> SwitchState {
        match (self.connection_state, self.logical_state) {
            (ConnectionState::Connected, LogicalState::On) => SwitchState::On,
            (ConnectionState::Connected, LogicalState::Off) => SwitchState::Off,
            (ConnectionState::Unavailable, _) => SwitchState::Unavailable,
            _ => SwitchState::Unknown,
        }
    }

    fn turn_on(&mut self) -> Result<(), SwitchUnavailable> {
        self.change_state(true)
    }

    fn turn_off(&mut self) -> Result<(), SwitchUnavailable> {
        self.change_state(false)
    }

    fn assumed_state(&self) -> Option<bool> {
        self.is_connected().then_some(false)
    }
}

impl<C: Connector> fmt::Display for SwitchController<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "remote_gpio switch {} on {} pin {}",
            self.name, self.address, self.pin
        )
    }
}

impl<C: Connector> fmt::Debug for SwitchController<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchController")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("pin", &self.pin)
            .field("polarity", &self.polarity)
            .field("connection_state", &self.connection_state)
            .field("logical_state", &self.logical_state)
            .finish()
    }
}

impl<C: Connector> Drop for SwitchController<C> {
    fn drop(&mut self) {
        if let Some(mut output) = self.output.take() {
            output.close();
        }
    }
}
