use fugit::MillisDurationU32;
use serde::{Deserialize, Serialize};

use crate::ina260::ADDR;
use crate::reading::{Rounding, CURRENT_LIMIT_MA};

/// Settling time between the register pointer write and the read.
pub const SETTLE_MS: u32 = 50;

#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DriverConfig {
    /// 7-bit I2C address.
    pub address: u8,
    pub settle_ms: u32,
    /// Scaled currents above this are reported as 0 mA.
    pub current_limit_ma: f32,
    pub current_rounding: Rounding,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            address: ADDR,
            settle_ms: SETTLE_MS,
            current_limit_ma: CURRENT_LIMIT_MA,
            current_rounding: Rounding::None,
        }
    }
}

impl DriverConfig {
    pub fn with_address(address: u8) -> Self {
        DriverConfig {
            address,
            ..Default::default()
        }
    }

    /// Parses a JSON config, e.g. `{"address":65,"current_rounding":"Nearest"}`.
    pub fn from_json(file: &[u8]) -> Result<Self, serde_json_core::de::Error> {
        let (config, _): (DriverConfig, _) = serde_json_core::from_slice(file)?;
        Ok(config)
    }

    pub fn settle(&self) -> MillisDurationU32 {
        MillisDurationU32::millis(self.settle_ms)
    }
}

/// Operating mode, bits 2..0 of the configuration register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Shutdown = 0x0,
    Triggered = 0x3,
    Continuous = 0x7,
}

impl Mode {
    pub fn bits(&self) -> u8 {
        *self as u8
    }

    /// Only the combined current + voltage modes are named; 0b100 is the
    /// second shutdown encoding.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0b111 {
            0b000 | 0b100 => Some(Mode::Shutdown),
            0b011 => Some(Mode::Triggered),
            0b111 => Some(Mode::Continuous),
            _ => None,
        }
    }
}

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConversionTime {
    Time140us = 0x0,
    Time204us = 0x1,
    Time332us = 0x2,
    Time588us = 0x3,
    Time1_1ms = 0x4,
    Time2_116ms = 0x5,
    Time4_156ms = 0x6,
    Time8_244ms = 0x7,
}

impl ConversionTime {
    pub fn bits(&self) -> u8 {
        *self as u8
    }

    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0x0 => ConversionTime::Time140us,
            0x1 => ConversionTime::Time204us,
            0x2 => ConversionTime::Time332us,
            0x3 => ConversionTime::Time588us,
            0x4 => ConversionTime::Time1_1ms,
            0x5 => ConversionTime::Time2_116ms,
            0x6 => ConversionTime::Time4_156ms,
            _ => ConversionTime::Time8_244ms,
        }
    }

    pub fn micros(&self) -> u32 {
        match self {
            ConversionTime::Time140us => 140,
            ConversionTime::Time204us => 204,
            ConversionTime::Time332us => 332,
            ConversionTime::Time588us => 588,
            ConversionTime::Time1_1ms => 1100,
            ConversionTime::Time2_116ms => 2116,
            ConversionTime::Time4_156ms => 4156,
            ConversionTime::Time8_244ms => 8244,
        }
    }

    pub fn seconds(&self) -> f32 {
        self.micros() as f32 * 1e-6
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AveragingCount {
    Count1 = 0x0,
    Count4 = 0x1,
    Count16 = 0x2,
    Count64 = 0x3,
    Count128 = 0x4,
    Count256 = 0x5,
    Count512 = 0x6,
    Count1024 = 0x7,
}

impl AveragingCount {
    pub fn bits(&self) -> u8 {
        *self as u8
    }

    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0x0 => AveragingCount::Count1,
            0x1 => AveragingCount::Count4,
            0x2 => AveragingCount::Count16,
            0x3 => AveragingCount::Count64,
            0x4 => AveragingCount::Count128,
            0x5 => AveragingCount::Count256,
            0x6 => AveragingCount::Count512,
            _ => AveragingCount::Count1024,
        }
    }

    pub fn samples(&self) -> u16 {
        match self {
            AveragingCount::Count1 => 1,
            AveragingCount::Count4 => 4,
            AveragingCount::Count16 => 16,
            AveragingCount::Count64 => 64,
            AveragingCount::Count128 => 128,
            AveragingCount::Count256 => 256,
            AveragingCount::Count512 => 512,
            AveragingCount::Count1024 => 1024,
        }
    }
}

/// Decoded contents of the configuration register (0x00).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    pub averaging: AveragingCount,
    pub voltage_conversion_time: ConversionTime,
    pub current_conversion_time: ConversionTime,
    pub mode: Option<Mode>,
}

impl Configuration {
    // AVG[11:9] VBUSCT[8:6] ISHCT[5:3] MODE[2:0]
    pub fn from_bits(value: u16) -> Self {
        Configuration {
            averaging: AveragingCount::from_bits((value >> 9) as u8),
            voltage_conversion_time: ConversionTime::from_bits((value >> 6) as u8),
            current_conversion_time: ConversionTime::from_bits((value >> 3) as u8),
            mode: Mode::from_bits(value as u8),
        }
    }

    /// Time for one complete averaged current + voltage conversion.
    pub fn conversion_period_us(&self) -> u32 {
        (self.voltage_conversion_time.micros() + self.current_conversion_time.micros())
            * self.averaging.samples() as u32
    }
}
