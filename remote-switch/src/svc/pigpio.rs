//! Framing of the pigpio daemon socket interface.
//!
//! Requests and responses are 16 bytes: four little endian 32 bit words. A
//! request carries `cmd, p1, p2, p3` where `p3` is the length of an optional
//! extension (never used here). A response echoes `cmd, p1, p2` and puts the
//! result in the last word, negative values being pigpio error codes.

use std::fmt;

use crate::hal::Pin;

pub const DEFAULT_PORT: u16 = 8888;

pub const FRAME_SIZE: usize = 16;

pub type FrameData = [u8; FRAME_SIZE];

#[repr(u32)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Command {
    SetMode = 0,
    GetMode = 1,
    Read = 3,
    Write = 4,
}

#[repr(u32)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Mode {
    Input = 0,
    Output = 1,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Request {
    pub cmd: Command,
    pub p1: u32,
    pub p2: u32,
}

impl Request {
    pub fn set_mode(pin: Pin, mode: Mode) -> Self {
        Self::new(Command::SetMode, pin, mode as u32)
    }

    pub fn get_mode(pin: Pin) -> Self {
        Self::new(Command::GetMode, pin, 0)
    }

    pub fn read(pin: Pin) -> Self {
        Self::new(Command::Read, pin, 0)
    }

    pub fn write(pin: Pin, level: bool) -> Self {
        Self::new(Command::Write, pin, level as u32)
    }

    fn new(cmd: Command, pin: Pin, p2: u32) -> Self {
        Self {
            cmd,
            p1: pin.number() as u32,
            p2,
        }
    }
}

impl From<&Request> for FrameData {
    fn from(req: &Request) -> Self {
        let mut data = [0u8; FRAME_SIZE];
        data[0..4].copy_from_slice(&(req.cmd as u32).to_le_bytes());
        data[4..8].copy_from_slice(&req.p1.to_le_bytes());
        data[8..12].copy_from_slice(&req.p2.to_le_bytes());
        // p3, no extension
        data
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Response {
    pub cmd: u32,
    pub p1: u32,
    pub p2: u32,
    pub result: i32,
}

impl Response {
    pub fn into_result(self) -> Result<u32, PigpioError> {
        if self.result < 0 {
            Err(PigpioError::from_code(self.result))
        } else {
            Ok(self.result as u32)
        }
    }
}

impl From<FrameData> for Response {
    fn from(data: FrameData) -> Self {
        let word = |i: usize| {
            let mut w = [0u8; 4];
            w.copy_from_slice(&data[i * 4..i * 4 + 4]);
            w
        };

        Response {
            cmd: u32::from_le_bytes(word(0)),
            p1: u32::from_le_bytes(word(1)),
            p2: u32::from_le_bytes(word(2)),
            result: i32::from_le_bytes(word(3)),
        }
    }
}

impl From<&Response> for FrameData {
    fn from(res: &Response) -> Self {
        let mut data = [0u8; FRAME_SIZE];
        data[0..4].copy_from_slice(&res.cmd.to_le_bytes());
        data[4..8].copy_from_slice(&res.p1.to_le_bytes());
        data[8..12].copy_from_slice(&res.p2.to_le_bytes());
        data[12..16].copy_from_slice(&res.result.to_le_bytes());
        data
    }
}

/// Negative result of a pigpio command.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct PigpioError {
    code: i32,
}

impl PigpioError {
    pub const INIT_FAILED: i32 = -1;
    pub const BAD_USER_GPIO: i32 = -2;
    pub const BAD_GPIO: i32 = -3;
    pub const BAD_MODE: i32 = -4;
    pub const BAD_LEVEL: i32 = -5;
    pub const NOT_PERMITTED: i32 = -41;
    pub const SOME_PERMITTED: i32 = -42;
    pub const UNKNOWN_COMMAND: i32 = -88;

    pub fn from_code(code: i32) -> Self {
        Self { code }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn name(&self) -> Option<&'static str> {
        let name = match self.code {
            Self::INIT_FAILED => "PI_INIT_FAILED",
            Self::BAD_USER_GPIO => "PI_BAD_USER_GPIO",
            Self::BAD_GPIO => "PI_BAD_GPIO",
            Self::BAD_MODE => "PI_BAD_MODE",
            Self::BAD_LEVEL => "PI_BAD_LEVEL",
            Self::NOT_PERMITTED => "PI_NOT_PERMITTED",
            Self::SOME_PERMITTED => "PI_SOME_PERMITTED",
            Self::UNKNOWN_COMMAND => "PI_UNKNOWN_COMMAND",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for PigpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.code),
            None => write!(f, "pigpio error {}", self.code),
        }
    }
}

impl std::error::Error for PigpioError {}
