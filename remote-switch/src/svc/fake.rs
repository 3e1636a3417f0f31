//! In-memory remote GPIO service for tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io;
use std::rc::Rc;

use crate::error::{ConnectionError, TransportError};
use crate::hal::{Connector, DigitalOutput, Pin, Polarity, RemoteAddress};
use crate::svc::pigpio::{PigpioError, DEFAULT_PORT};

#[derive(Default)]
struct Board {
    unreachable: bool,
    failing_writes: bool,
    rejected: HashSet<Pin>,
    levels: HashMap<Pin, bool>,
    opened: usize,
    writes: usize,
}

#[derive(Clone, Default)]
pub(crate) struct FakeConnector {
    board: Rc<RefCell<Board>>,
}

impl FakeConnector {
    pub(crate) fn set_reachable(&self, reachable: bool) {
        self.board.borrow_mut().unreachable = !reachable;
    }

    pub(crate) fn set_failing_writes(&self, failing: bool) {
        self.board.borrow_mut().failing_writes = failing;
    }

    pub(crate) fn reject(&self, pin: Pin) {
        self.board.borrow_mut().rejected.insert(pin);
    }

    /// Physical level of a line, `None` if never written.
    pub(crate) fn level(&self, pin: Pin) -> Option<bool> {
        self.board.borrow().levels.get(&pin).copied()
    }

    pub(crate) fn set_level(&self, pin: Pin, level: bool) {
        self.board.borrow_mut().levels.insert(pin, level);
    }

    pub(crate) fn open_count(&self) -> usize {
        self.board.borrow().opened
    }

    pub(crate) fn write_count(&self) -> usize {
        self.board.borrow().writes
    }
}

impl Connector for FakeConnector {
    type Output = FakeOutput;

    fn open(
        &self,
        address: &RemoteAddress,
        pin: Pin,
        polarity: Polarity,
    ) -> Result<FakeOutput, ConnectionError> {
        let mut board = self.board.borrow_mut();

        if board.unreachable {
            return Err(ConnectionError::Unreachable {
                address: address.to_string(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
            });
        }

        if board.rejected.contains(&pin) {
            return Err(ConnectionError::Rejected {
                pin,
                source: PigpioError::from_code(PigpioError::BAD_GPIO),
            });
        }

        board.opened += 1;

        Ok(FakeOutput {
            board: self.board.clone(),
            pin,
            polarity,
            closed: false,
        })
    }

    fn default_port(&self) -> u16 {
        DEFAULT_PORT
    }
}

pub(crate) struct FakeOutput {
    board: Rc<RefCell<Board>>,
    pin: Pin,
    polarity: Polarity,
    closed: bool,
}

impl DigitalOutput for FakeOutput {
    fn set(&mut self, on: bool) -> Result<(), TransportError> {
        let mut board = self.board.borrow_mut();

        if self.closed {
            return Err(TransportError::Closed);
        }

        if board.failing_writes || board.unreachable {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe").into());
        }

        board.writes += 1;
        board
            .levels
            .insert(self.pin, self.polarity.physical_level(on));
        Ok(())
    }

    fn is_lit(&mut self) -> Result<bool, TransportError> {
        let board = self.board.borrow();

        if self.closed {
            return Err(TransportError::Closed);
        }

        if board.unreachable {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe").into());
        }

        let level = board.levels.get(&self.pin).copied().unwrap_or(false);
        Ok(self.polarity.is_active(level))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
