pub use output::{Connector, DigitalOutput, Pin, RemoteAddress};
pub use polarity::Polarity;
pub use switch::{Switch, SwitchState};

pub mod output;
pub mod polarity;
pub mod switch;
