use crate::app::SwitchController;
use crate::config::{Config, RemoteConfig, SwitchOptions};
use crate::error::ConfigError;
use crate::hal::{Connector, Switch};

/// A configuration entry, or a whole remote block when `port` is `None`,
/// that produced no switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub host: String,
    pub port: Option<String>,
    pub error: ConfigError,
}

/// Every switch of every configured remote host.
///
/// A bad entry only costs its own switch, and a line that cannot be reached
/// still gets a switch, left `Unavailable`.
pub struct DeviceRegistry<C: Connector> {
    switches: Vec<SwitchController<C>>,
    rejected: Vec<Rejected>,
}

impl<C: Connector> Default for DeviceRegistry<C> {
    fn default() -> Self {
        Self {
            switches: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<C: Connector + Clone> DeviceRegistry<C> {
    /// Switches of a single remote host. Fails only if `host` is unusable.
    pub fn build<K, V>(
        host: &str,
        invert_logic: bool,
        ports: impl IntoIterator<Item = (K, V)>,
        connector: C,
        options: SwitchOptions,
    ) -> Result<Self, ConfigError>
    where
        K: ToString,
        V: Into<String>,
    {
        let remote = RemoteConfig::new(host, invert_logic, ports);
        let mut registry = Self::default();
        registry.add_remote(&remote, &connector, options)?;
        Ok(registry)
    }

    pub fn from_config(config: &Config, connector: C) -> Self {
        let mut registry = Self::default();

        for remote in &config.remote {
            if let Err(error) = registry.add_remote(remote, &connector, config.switch) {
                log::error!("ignoring remote `{}`: {}", remote.host, error);
                registry.rejected.push(Rejected {
                    host: remote.host.clone(),
                    port: None,
                    error,
                });
            }
        }

        registry
    }

    /// Adds the switches of one remote block and returns how many were added.
    /// All entries are checked before any line is opened.
    pub fn add_remote(
        &mut self,
        remote: &RemoteConfig,
        connector: &C,
        options: SwitchOptions,
    ) -> Result<usize, ConfigError> {
        let valid = remote.validate()?;
        let host = valid.address.to_string();

        for entry in valid.rejected {
            log::error!("ignoring port `{}` of {}: {}", entry.port, host, entry.error);
            self.rejected.push(Rejected {
                host: host.clone(),
                port: Some(entry.port),
                error: entry.error,
            });
        }

        let mut added = Vec::new();

        for spec in valid.switches {
            let owner = self.switches.iter().find(|s| {
                s.pin() == spec.pin
                    && s.address()
                        .same_endpoint(&valid.address, connector.default_port())
            });

            if let Some(owner) = owner {
                let error = ConfigError::DuplicatePin {
                    host: host.clone(),
                    pin: spec.pin,
                    owner: owner.name().to_owned(),
                };
                log::error!("ignoring port `{}` of {}: {}", spec.port, host, error);
                self.rejected.push(Rejected {
                    host: host.clone(),
                    port: Some(spec.port),
                    error,
                });
                continue;
            }

            let switch = SwitchController::new(
                spec.name,
                valid.address.clone(),
                spec.pin,
                valid.invert_logic,
                connector.clone(),
            )
            .with_initial_value(options.initial_value);

            added.push(switch);
        }

        if options.connect_on_setup {
            for switch in &mut added {
                // Failures are logged and leave the switch unavailable
                switch.ensure_connected().ok();
            }
        }

        let count = added.len();
        log::info!("{} switches on {}", count, host);
        self.switches.extend(added);

        Ok(count)
    }
}

impl<C: Connector> DeviceRegistry<C> {
    pub fn switches(&self) -> &[SwitchController<C>] {
        &self.switches
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SwitchController<C>> {
        self.switches.iter_mut()
    }

    pub fn rejected(&self) -> &[Rejected] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.switches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SwitchController<C>> {
        self.switches.iter().find(|s| s.name() == name)
    }

    /// Looks a switch up by name, or by `host:pin`.
    pub fn find_mut(&mut self, selector: &str) -> Option<&mut SwitchController<C>> {
        let index = self.position(selector)?;
        self.switches.get_mut(index)
    }

    fn position(&self, selector: &str) -> Option<usize> {
        if let Some(i) = self.switches.iter().position(|s| s.name() == selector) {
            return Some(i);
        }

        let (host, pin) = selector.rsplit_once(':')?;
        let pin: u32 = pin.parse().ok()?;

        self.switches.iter().position(|s| {
            u32::from(s.pin().number()) == pin
                && (s.address().to_string() == host || s.address().host() == host)
        })
    }
}
