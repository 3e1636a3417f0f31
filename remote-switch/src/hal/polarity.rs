/// Mapping between the logical state of a switch and the electrical level of
/// the line driving it.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum Polarity {
    #[default]
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    pub fn from_invert_logic(invert_logic: bool) -> Self {
        if invert_logic {
            Polarity::ActiveLow
        } else {
            Polarity::ActiveHigh
        }
    }

    pub fn is_active_high(self) -> bool {
        self == Polarity::ActiveHigh
    }

    /// Level the line must be driven to for the given logical state.
    pub fn physical_level(self, on: bool) -> bool {
        on == self.is_active_high()
    }

    /// Logical state of a line read back at `level`.
    pub fn is_active(self, level: bool) -> bool {
        level == self.is_active_high()
    }
}

pub fn physical_level(logical_on: bool, invert_logic: bool) -> bool {
    Polarity::from_invert_logic(invert_logic).physical_level(logical_on)
}
