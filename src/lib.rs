//! Driver for the TI INA260 current, voltage and power monitor.
//!
//! Every measurement is a register-pointer write followed by a fixed settling
//! delay and a 3 byte read, using the blocking [`embedded-hal`] I2C traits.
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal/0.2

#![no_std]

#[cfg(test)]
extern crate std;

#[macro_use]
mod logger;

pub mod config;
pub mod ina260;
pub mod reading;

pub use crate::config::{AveragingCount, Configuration, ConversionTime, DriverConfig, Mode};
pub use crate::ina260::{DeviceId, Register, ADDR, INA260};
pub use crate::logger::write_to;
pub use crate::reading::{Reading, Rounding};
