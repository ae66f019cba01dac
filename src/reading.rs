//! Conversions from raw register values to engineering units.
//!
//! These don't touch the bus, so they can be checked without hardware.

use core::fmt;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::logger::write_to::show;

/// mA per LSB of the current register.
pub const CURRENT_LSB_MA: f32 = 1.25;
/// V per LSB of the bus voltage register (1.25 mV).
pub const VOLTAGE_LSB_V: f32 = 0.00125;
/// mW per LSB of the power register.
pub const POWER_LSB_MW: f32 = 10.0;

/// Scaled currents above this are treated as a misread.
pub const CURRENT_LIMIT_MA: f32 = 36000.0;

pub const RESPONSE_LEN: usize = 3;

/// Capacity of the string returned by [`Reading::to_json`].
pub const JSON_LEN: usize = 96;

/// Big-endian value of the first two response bytes. The third is ignored.
pub fn assemble_raw(data: [u8; RESPONSE_LEN]) -> u16 {
    let raw = (data[0] as u32) << 8 | data[1] as u32;
    (raw & 0xFFFF) as u16
}

/// Current in mA, or 0 when it exceeds `limit_ma`.
pub fn scaled_current(raw: u16, limit_ma: f32) -> f32 {
    let current = raw as f32 * CURRENT_LSB_MA;
    if current > limit_ma {
        0.0
    } else {
        current
    }
}

/// Bus voltage in V.
pub fn scaled_voltage(raw: u16) -> f32 {
    raw as f32 * VOLTAGE_LSB_V
}

/// Power in mW.
pub fn scaled_power(raw: u16) -> f32 {
    raw as f32 * POWER_LSB_MW
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum Rounding {
    #[default]
    None,
    Truncate,
    Nearest,
}

impl Rounding {
    pub fn apply(&self, value: f32) -> f32 {
        match self {
            Rounding::None => value,
            Rounding::Truncate => libm::truncf(value),
            Rounding::Nearest => libm::roundf(value),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Reading {
    pub current_ma: f32,
    pub voltage_v: f32,
    pub power_mw: f32,
}

impl Reading {
    /// Renders the reading as a console line into `buf`.
    pub fn render<'a>(&self, buf: &'a mut [u8]) -> Result<&'a str, fmt::Error> {
        show(buf, format_args!("{}", self))
    }

    pub fn to_json(&self) -> Result<String<JSON_LEN>, serde_json_core::ser::Error> {
        serde_json_core::to_string(self)
    }

    pub fn to_postcard<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], postcard::Error> {
        postcard::to_slice(self, buf)
    }

    pub fn from_postcard(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}mA,  {}V,   {}mW",
            self.current_ma, self.voltage_v, self.power_mw
        )
    }
}
