use crate::error::SwitchUnavailable;

/// What a host framework sees of a switch entity.
pub trait Switch {
    fn name(&self) -> &str;

    fn is_on(&self) -> bool {
        self.state() == SwitchState::On
    }

    fn state(&self) -> SwitchState;

    fn turn_on(&mut self) -> Result<(), SwitchUnavailable>;

    fn turn_off(&mut self) -> Result<(), SwitchUnavailable>;

    /// State changes are only caused by commands, there is nothing to poll.
    fn should_poll(&self) -> bool {
        false
    }

    /// `Some(false)` while the state is read from the line, `None` when it
    /// cannot be read at all.
    fn assumed_state(&self) -> Option<bool>;

    fn available(&self) -> bool {
        self.assumed_state().is_some()
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    #[default]
    Unknown,
    Off,
    On,
    Unavailable,
}

impl std::fmt::Display for SwitchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SwitchState::Unknown => "unknown",
            SwitchState::Off => "off",
            SwitchState::On => "on",
            SwitchState::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}
