use remote_switch::app::SwitchController;
use remote_switch::hal::{Connector, Switch, SwitchState};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SwitchReport {
    pub name: String,
    pub host: String,
    pub pin: u8,
    pub active_high: bool,
    pub state: SwitchState,
}

impl<C: Connector> From<&SwitchController<C>> for SwitchReport {
    fn from(switch: &SwitchController<C>) -> Self {
        SwitchReport {
            name: switch.name().to_owned(),
            host: switch.address().to_string(),
            pin: switch.pin().number(),
            active_high: switch.is_active_high(),
            state: switch.state(),
        }
    }
}

pub fn print_table(reports: &[SwitchReport], with_state: bool) {
    let name_width = reports
        .iter()
        .map(|r| r.name.len())
        .chain(std::iter::once(4))
        .max()
        .unwrap_or(4);
    let host_width = reports
        .iter()
        .map(|r| r.host.len())
        .chain(std::iter::once(4))
        .max()
        .unwrap_or(4);

    for line in table_lines(reports, with_state, name_width, host_width) {
        println!("{line}");
    }
}

fn table_lines(
    reports: &[SwitchReport],
    with_state: bool,
    name_width: usize,
    host_width: usize,
) -> Vec<String> {
    let row = |name: &str, host: &str, pin: &str, polarity: &str, state: &str| {
        let line = format!("{name:<name_width$}  {host:<host_width$}  {pin:>3}  {polarity:<11}");
        if with_state {
            format!("{line}  {state}")
        } else {
            line.trim_end().to_owned()
        }
    };

    std::iter::once(row("NAME", "HOST", "PIN", "POLARITY", "STATE"))
        .chain(reports.iter().map(|r| {
            let polarity = if r.active_high {
                "active-high"
            } else {
                "active-low"
            };
            row(
                &r.name,
                &r.host,
                &r.pin.to_string(),
                polarity,
                &r.state.to_string(),
            )
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp() -> SwitchReport {
        SwitchReport {
            name: "Lamp".to_owned(),
            host: "10.0.0.5".to_owned(),
            pin: 17,
            active_high: false,
            state: SwitchState::On,
        }
    }

    #[test]
    fn test_table_with_state() {
        let lines = table_lines(&[lamp()], true, 4, 8);
        assert_eq!(
            lines,
            vec![
                "NAME  HOST      PIN  POLARITY     STATE",
                "Lamp  10.0.0.5   17  active-low   on",
            ]
        );
    }

    #[test]
    fn test_table_without_state() {
        let lines = table_lines(&[lamp()], false, 4, 8);
        assert_eq!(
            lines,
            vec![
                "NAME  HOST      PIN  POLARITY",
                "Lamp  10.0.0.5   17  active-low",
            ]
        );
    }

    #[test]
    fn test_report_json() {
        let json = serde_json::to_value(lamp()).unwrap();
        assert_eq!(json["state"], "on");
        assert_eq!(json["pin"], 17);
        assert_eq!(json["active_high"], false);
    }
}
