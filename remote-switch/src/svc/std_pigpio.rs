use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::PigpioSettings;
use crate::error::{ConnectionError, TransportError};
use crate::hal::{Connector, DigitalOutput, Pin, Polarity, RemoteAddress};
use crate::svc::pigpio::{
    FrameData, Mode, PigpioError, Request, Response, DEFAULT_PORT, FRAME_SIZE,
};

/// Opens lines on pigpio daemons over TCP. A `None` timeout waits forever.
#[derive(Clone, Debug)]
pub struct PigpioConnector {
    default_port: u16,
    connect_timeout: Option<Duration>,
    io_timeout: Option<Duration>,
}

impl Default for PigpioConnector {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PORT,
            connect_timeout: Some(Duration::from_secs(5)),
            io_timeout: Some(Duration::from_secs(5)),
        }
    }
}

impl From<&PigpioSettings> for PigpioConnector {
    fn from(settings: &PigpioSettings) -> Self {
        Self {
            default_port: settings.port,
            connect_timeout: timeout_from_millis(settings.connect_timeout_ms),
            io_timeout: timeout_from_millis(settings.io_timeout_ms),
        }
    }
}

// Sockets refuse a zero timeout, zero means none
fn timeout_from_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

impl Connector for PigpioConnector {
    type Output = PigpioOutput;

    fn open(
        &self,
        address: &RemoteAddress,
        pin: Pin,
        polarity: Polarity,
    ) -> Result<PigpioOutput, ConnectionError> {
        let port = address.port_or(self.default_port);
        let unreachable = |source| ConnectionError::Unreachable {
            address: format!("{}:{}", address.host(), port),
            source,
        };

        let stream = connect((address.host(), port), self.connect_timeout).map_err(unreachable)?;
        stream
            .set_read_timeout(self.io_timeout)
            .and_then(|_| stream.set_write_timeout(self.io_timeout))
            .and_then(|_| stream.set_nodelay(true))
            .map_err(unreachable)?;

        let mut client = PigpioClient { stream };

        let mode = client
            .command(Request::set_mode(pin, Mode::Output))
            .and_then(|_| client.command(Request::get_mode(pin)));

        match mode {
            Ok(mode) if mode == Mode::Output as u32 => {}
            Ok(_) => {
                return Err(ConnectionError::Rejected {
                    pin,
                    source: PigpioError::from_code(PigpioError::BAD_MODE),
                });
            }
            Err(TransportError::Remote(source)) => {
                return Err(ConnectionError::Rejected { pin, source });
            }
            Err(e) => return Err(e.into()),
        }

        log::info!("GPIO {} on {} is an output ({:?})", pin, address, polarity);

        Ok(PigpioOutput {
            client: Some(client),
            pin,
            polarity,
        })
    }

    fn default_port(&self) -> u16 {
        self.default_port
    }
}

fn connect(target: (&str, u16), timeout: Option<Duration>) -> io::Result<TcpStream> {
    let mut last_err = None;

    for addr in target.to_socket_addrs()? {
        let stream = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match stream {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "host resolved to no address")
    }))
}

struct PigpioClient {
    stream: TcpStream,
}

impl PigpioClient {
    fn command(&mut self, req: Request) -> Result<u32, TransportError> {
        self.stream.write_all(&FrameData::from(&req))?;

        let mut buf = [0u8; FRAME_SIZE];
        self.stream.read_exact(&mut buf)?;

        let res = Response::from(buf);
        if res.cmd != req.cmd as u32 {
            return Err(TransportError::UnexpectedResponse {
                expected: req.cmd as u32,
                got: res.cmd,
            });
        }

        Ok(res.into_result()?)
    }
}

/// One line of a pigpio daemon, opened as an output.
pub struct PigpioOutput {
    client: Option<PigpioClient>,
    pin: Pin,
    polarity: Polarity,
}

impl PigpioOutput {
    fn client(&mut self) -> Result<&mut PigpioClient, TransportError> {
        self.client.as_mut().ok_or(TransportError::Closed)
    }
}

impl DigitalOutput for PigpioOutput {
    fn set(&mut self, on: bool) -> Result<(), TransportError> {
        let (pin, level) = (self.pin, self.polarity.physical_level(on));
        self.client()?.command(Request::write(pin, level))?;
        log::trace!("GPIO {} driven {}", pin, if level { "high" } else { "low" });
        Ok(())
    }

    fn is_lit(&mut self) -> Result<bool, TransportError> {
        let pin = self.pin;
        let level = self.client()?.command(Request::read(pin))?;
        Ok(self.polarity.is_active(level != 0))
    }

    fn close(&mut self) {
        if let Some(client) = self.client.take() {
            // The daemon may already be gone
            client.stream.shutdown(Shutdown::Both).ok();
            log::debug!("GPIO {} closed", self.pin);
        }
    }
}

impl Drop for PigpioOutput {
    fn drop(&mut self) {
        self.close();
    }
}
