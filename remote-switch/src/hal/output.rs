use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ConnectionError, TransportError};
use crate::hal::Polarity;

/// A line of a remote output, driven in logical terms. The polarity flip is
/// done by the implementation.
pub trait DigitalOutput {
    fn set(&mut self, on: bool) -> Result<(), TransportError>;

    fn is_lit(&mut self) -> Result<bool, TransportError>;

    /// Releases the remote session. Calling it more than once is harmless.
    fn close(&mut self);
}

/// Opens lines on a remote GPIO service. No retries: a failed open is
/// reported as is.
pub trait Connector {
    type Output: DigitalOutput;

    fn open(
        &self,
        address: &RemoteAddress,
        pin: Pin,
        polarity: Polarity,
    ) -> Result<Self::Output, ConnectionError>;

    /// Port used for addresses that do not name one.
    fn default_port(&self) -> u16;
}

/// Broadcom GPIO number
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Pin(u8);

impl Pin {
    pub const MAX: u8 = 53;

    pub fn number(self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for Pin {
    type Error = ConfigError;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        if n <= Pin::MAX as u32 {
            Ok(Pin(n as u8))
        } else {
            Err(ConfigError::PortOutOfRange(n))
        }
    }
}

impl FromStr for Pin {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u32 = s
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort(s.to_owned()))?;
        Pin::try_from(n)
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the remote GPIO service listens. Without an explicit port the
/// connector's default is used.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct RemoteAddress {
    host: String,
    port: Option<u16>,
}

impl RemoteAddress {
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn port_or(&self, default_port: u16) -> u16 {
        self.port.unwrap_or(default_port)
    }

    /// Whether both addresses reach the same service once the default port
    /// is filled in.
    pub fn same_endpoint(&self, other: &RemoteAddress, default_port: u16) -> bool {
        self.host.eq_ignore_ascii_case(&other.host)
            && self.port_or(default_port) == other.port_or(default_port)
    }
}

impl FromStr for RemoteAddress {
    type Err = ConfigError;

    /// Accepts `host`, `host:port`, `[v6]` and `[v6]:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ConfigError::InvalidHost(s.to_owned());

        if s.is_empty() {
            return Err(ConfigError::MissingHost);
        }

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            match tail {
                "" => (host, None),
                _ => (host, Some(tail.strip_prefix(':').ok_or_else(invalid)?)),
            }
        } else {
            match s.split_once(':') {
                // a bare IPv6 address has no port
                Some((_, tail)) if tail.contains(':') => (s, None),
                Some((host, port)) => (host, Some(port)),
                None => (s, None),
            }
        };

        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(invalid());
        }

        let port = match port {
            Some(p) => Some(p.parse::<u16>().map_err(|_| invalid())?),
            None => None,
        };

        Ok(RemoteAddress::new(host, port))
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bracketed = self.host.contains(':');
        match (bracketed, self.port) {
            (true, Some(port)) => write!(f, "[{}]:{}", self.host, port),
            (true, None) => write!(f, "[{}]", self.host),
            (false, Some(port)) => write!(f, "{}:{}", self.host, port),
            (false, None) => f.write_str(&self.host),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_range() {
        assert_eq!("17".parse::<Pin>().unwrap().number(), 17);
        assert_eq!("0".parse::<Pin>().unwrap().number(), 0);
        assert_eq!("53".parse::<Pin>().unwrap().number(), 53);
        assert_eq!("54".parse::<Pin>(), Err(ConfigError::PortOutOfRange(54)));
        assert_eq!(
            "lamp".parse::<Pin>(),
            Err(ConfigError::InvalidPort("lamp".to_owned()))
        );
        assert_eq!(
            "-1".parse::<Pin>(),
            Err(ConfigError::InvalidPort("-1".to_owned()))
        );
    }

    #[test]
    fn test_parse_remote_address() {
        let addr: RemoteAddress = "10.0.0.5".parse().unwrap();
        assert_eq!(addr, RemoteAddress::new("10.0.0.5", None));
        assert_eq!(addr.port_or(8888), 8888);

        let addr: RemoteAddress = "pi.local:7777".parse().unwrap();
        assert_eq!(addr, RemoteAddress::new("pi.local", Some(7777)));
        assert_eq!(addr.port_or(8888), 7777);

        let addr: RemoteAddress = "[fe80::1]:8888".parse().unwrap();
        assert_eq!(addr, RemoteAddress::new("fe80::1", Some(8888)));
        assert_eq!(addr.to_string(), "[fe80::1]:8888");

        let addr: RemoteAddress = "fe80::1".parse().unwrap();
        assert_eq!(addr, RemoteAddress::new("fe80::1", None));
    }

    #[test]
    fn test_same_endpoint() {
        let bare: RemoteAddress = "10.0.0.5".parse().unwrap();
        let explicit: RemoteAddress = "10.0.0.5:8888".parse().unwrap();
        let other_port: RemoteAddress = "10.0.0.5:7777".parse().unwrap();

        assert!(bare.same_endpoint(&explicit, 8888));
        assert!(explicit.same_endpoint(&bare, 8888));
        assert!(!bare.same_endpoint(&other_port, 8888));
        assert!(bare.same_endpoint(&other_port, 7777));
        assert!(!bare.same_endpoint(&"10.0.0.6".parse().unwrap(), 8888));
        assert!("Pi.Local".parse::<RemoteAddress>().unwrap().same_endpoint(
            &"pi.local:8888".parse().unwrap(),
            8888
        ));
    }

    #[test]
    fn test_parse_invalid_remote_address() {
        assert_eq!("".parse::<RemoteAddress>(), Err(ConfigError::MissingHost));
        assert_eq!("  ".parse::<RemoteAddress>(), Err(ConfigError::MissingHost));
        assert_eq!(
            "pi.local:http".parse::<RemoteAddress>(),
            Err(ConfigError::InvalidHost("pi.local:http".to_owned()))
        );
        assert_eq!(
            ":8888".parse::<RemoteAddress>(),
            Err(ConfigError::InvalidHost(":8888".to_owned()))
        );
    }
}
