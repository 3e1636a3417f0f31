use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;

use crate::error::ConfigError;
use crate::hal::{Pin, RemoteAddress};
use crate::svc::pigpio::DEFAULT_PORT;

/// Contents of a configuration file.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub pigpio: PigpioSettings,
    #[serde(default)]
    pub switch: SwitchOptions,
    #[serde(default)]
    pub remote: Vec<RemoteConfig>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("Cannot parse {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// Transport settings, shared by every remote host.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PigpioSettings {
    pub port: u16,
    pub connect_timeout_ms: u64,
    pub io_timeout_ms: u64,
}

impl Default for PigpioSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout_ms: 5000,
            io_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwitchOptions {
    /// Open every line while building the registry instead of on first use.
    pub connect_on_setup: bool,
    /// Drive lines to this state whenever they are opened. When unset the
    /// state is read back from the line.
    pub initial_value: Option<bool>,
}

impl Default for SwitchOptions {
    fn default() -> Self {
        Self {
            connect_on_setup: true,
            initial_value: None,
        }
    }
}

/// One remote host and the lines it exposes as switches.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    pub host: String,
    /// GPIO number to switch name. Keys are kept as written so a bad one only
    /// rejects its own entry.
    pub ports: BTreeMap<String, String>,
    #[serde(default)]
    pub invert_logic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchSpec {
    pub pin: Pin,
    /// Key as written in the configuration
    pub port: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    pub port: String,
    pub error: ConfigError,
}

/// A remote block checked before any network i/o.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRemote {
    pub address: RemoteAddress,
    pub invert_logic: bool,
    /// Sorted by pin
    pub switches: Vec<SwitchSpec>,
    pub rejected: Vec<RejectedEntry>,
}

impl RemoteConfig {
    pub fn new<K, V>(host: &str, invert_logic: bool, ports: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: ToString,
        V: Into<String>,
    {
        Self {
            host: host.to_owned(),
            ports: ports
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
            invert_logic,
        }
    }

    /// Fails only when the host itself is unusable, bad entries are returned
    /// in `rejected`.
    pub fn validate(&self) -> Result<ValidRemote, ConfigError> {
        let address: RemoteAddress = self.host.parse()?;

        let mut switches = Vec::new();
        let mut rejected = Vec::new();

        for (port, name) in &self.ports {
            match validate_entry(port, name) {
                Ok(spec) => switches.push(spec),
                Err(error) => rejected.push(RejectedEntry {
                    port: port.clone(),
                    error,
                }),
            }
        }

        switches.sort_by_key(|s| s.pin);

        // "17" and "017" name the same line
        let mut i = 1;
        while i < switches.len() {
            if switches[i].pin == switches[i - 1].pin {
                let dup = switches.remove(i);
                rejected.push(RejectedEntry {
                    port: dup.port,
                    error: ConfigError::DuplicatePin {
                        host: address.to_string(),
                        pin: dup.pin,
                        owner: switches[i - 1].name.clone(),
                    },
                });
            } else {
                i += 1;
            }
        }

        Ok(ValidRemote {
            address,
            invert_logic: self.invert_logic,
            switches,
            rejected,
        })
    }
}

fn validate_entry(port: &str, name: &str) -> Result<SwitchSpec, ConfigError> {
    let pin: Pin = port.parse()?;
    let name = name.trim();

    if name.is_empty() {
        return Err(ConfigError::EmptyName(pin));
    }

    Ok(SwitchSpec {
        pin,
        port: port.to_owned(),
        name: name.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use insta::assert_debug_snapshot;

    use super::*;

    const EXAMPLE: &str = r#"
[pigpio]
port = 7777

[switch]
connect_on_setup = false

[[remote]]
host = "10.0.0.5"
invert_logic = true

[remote.ports]
17 = "Lamp"
4 = "Fan"

[[remote]]
host = "10.0.0.6:8888"

[remote.ports]
27 = "Heater"
"#;

    #[test]
    fn test_load_example() {
        let config = Config::from_toml_str(EXAMPLE).unwrap();

        assert_eq!(config.pigpio.port, 7777);
        assert_eq!(config.pigpio.io_timeout_ms, 5000);
        assert!(!config.switch.connect_on_setup);
        assert_eq!(config.switch.initial_value, None);
        assert_eq!(config.remote.len(), 2);
        assert!(config.remote[0].invert_logic);
        assert!(!config.remote[1].invert_logic);
        assert_eq!(config.remote[0].ports["17"], "Lamp");
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        assert!(Config::from_toml_str("[pigpio]\nprot = 1\n").is_err());
    }

    #[test]
    fn test_remote_requires_ports() {
        assert!(Config::from_toml_str("[[remote]]\nhost = \"pi\"\n").is_err());
    }

    #[test]
    fn test_switches_sorted_by_pin() {
        let remote = RemoteConfig::new("10.0.0.5", false, [(17, "Lamp"), (4, "Fan")]);
        let valid = remote.validate().unwrap();

        assert_eq!(valid.address, RemoteAddress::new("10.0.0.5", None));
        assert!(valid.rejected.is_empty());
        assert_debug_snapshot!(valid.switches, @r###"
        [
            SwitchSpec {
                pin: Pin(
                    4,
                ),
                port: "4",
                name: "Fan",
            },
            SwitchSpec {
                pin: Pin(
                    17,
                ),
                port: "17",
                name: "Lamp",
            },
        ]
        "###);
    }

    #[test]
    fn test_bad_entries_do_not_reject_siblings() {
        let remote = RemoteConfig::new(
            "10.0.0.5",
            false,
            [
                ("017", "Lamp"),
                ("99", "Nowhere"),
                ("fan", "Fan"),
                ("22", " "),
                ("0017", "Other lamp"),
            ],
        );
        let valid = remote.validate().unwrap();

        assert_eq!(
            valid.switches,
            vec![SwitchSpec {
                pin: Pin::try_from(17).unwrap(),
                port: "0017".to_owned(),
                name: "Other lamp".to_owned(),
            }]
        );

        let ports: Vec<_> = valid.rejected.iter().map(|r| r.port.as_str()).collect();
        assert_eq!(ports, vec!["22", "99", "fan", "017"]);

        let errors: Vec<_> = valid.rejected.iter().map(|r| r.error.clone()).collect();
        assert_eq!(
            errors,
            vec![
                ConfigError::EmptyName(Pin::try_from(22).unwrap()),
                ConfigError::PortOutOfRange(99),
                ConfigError::InvalidPort("fan".to_owned()),
                ConfigError::DuplicatePin {
                    host: "10.0.0.5".to_owned(),
                    pin: Pin::try_from(17).unwrap(),
                    owner: "Other lamp".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_missing_host_rejects_the_block() {
        let remote = RemoteConfig::new("", false, [(17, "Lamp")]);
        assert_eq!(remote.validate(), Err(ConfigError::MissingHost));
    }
}
