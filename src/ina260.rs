use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c;

use crate::config::{Configuration, DriverConfig};
use crate::reading::{
    assemble_raw, scaled_current, scaled_power, scaled_voltage, Reading, RESPONSE_LEN,
};

/// Address with A0 and A1 tied to GND.
pub const ADDR: u8 = 0x40;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    Config = 0x00,
    Current = 0x01,
    BusVoltage = 0x02,
    Power = 0x03,
    MaskEnable = 0x06,
    AlertLimit = 0x07,
    ManufacturerId = 0xFE,
    DieId = 0xFF,
}

/// Contents of the two identification registers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DeviceId {
    pub manufacturer: u16,
    pub die: u16,
}

impl DeviceId {
    /// "TI" in ASCII
    pub const MANUFACTURER: u16 = 0x5449;
    pub const DIE: u16 = 0x2270;

    pub fn is_ina260(&self) -> bool {
        self.manufacturer == Self::MANUFACTURER && self.die_id() == Self::DIE >> 4
    }

    pub fn die_id(&self) -> u16 {
        self.die >> 4
    }

    pub fn revision(&self) -> u8 {
        (self.die & 0xF) as u8
    }
}

/// Blocking INA260 driver. Errors from the bus are handed back as they are.
pub struct INA260<'a, I2C, DELAY> {
    com: &'a mut I2C,
    delay: DELAY,
    config: DriverConfig,
}

impl<'a, E, I2C, DELAY> INA260<'a, I2C, DELAY>
where
    I2C: i2c::Write<Error = E> + i2c::Read<Error = E>,
    DELAY: DelayMs<u32>,
{
    pub fn new(i2c: &'a mut I2C, delay: DELAY) -> Self {
        Self::new_with_config(i2c, delay, DriverConfig::default())
    }

    pub fn new_with_address(i2c: &'a mut I2C, delay: DELAY, address: u8) -> Self {
        Self::new_with_config(i2c, delay, DriverConfig::with_address(address))
    }

    pub fn new_with_config(i2c: &'a mut I2C, delay: DELAY, config: DriverConfig) -> Self {
        debug!("ina260 at {=u8:#x}", config.address);
        INA260 {
            com: i2c,
            delay,
            config,
        }
    }

    pub fn address(&self) -> u8 {
        self.config.address
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Gives the delay back and ends the bus borrow.
    pub fn release(self) -> DELAY {
        self.delay
    }

    /// Current through the shunt in mA.
    pub fn current(&mut self) -> Result<f32, E> {
        let raw = self.issue_measurement(Register::Current)?;
        let current = scaled_current(raw, self.config.current_limit_ma);
        if current == 0.0 && raw != 0 {
            warn!("current reading {=u16} out of range, reporting 0", raw);
        }
        Ok(self.config.current_rounding.apply(current))
    }

    /// Bus voltage in V.
    pub fn voltage(&mut self) -> Result<f32, E> {
        let raw = self.issue_measurement(Register::BusVoltage)?;
        Ok(scaled_voltage(raw))
    }

    /// Power delivered to the load in mW.
    pub fn power(&mut self) -> Result<f32, E> {
        let raw = self.issue_measurement(Register::Power)?;
        Ok(scaled_power(raw))
    }

    /// Voltage, current and power, one round trip each.
    pub fn read(&mut self) -> Result<Reading, E> {
        let voltage_v = self.voltage()?;
        let current_ma = self.current()?;
        let power_mw = self.power()?;
        Ok(Reading {
            current_ma,
            voltage_v,
            power_mw,
        })
    }

    pub fn identify(&mut self) -> Result<DeviceId, E> {
        let manufacturer = self.issue_measurement(Register::ManufacturerId)?;
        let die = self.issue_measurement(Register::DieId)?;
        Ok(DeviceId { manufacturer, die })
    }

    /// Reads back the configuration register. The driver never writes it.
    pub fn configuration(&mut self) -> Result<Configuration, E> {
        let value = self.issue_measurement(Register::Config)?;
        Ok(Configuration::from_bits(value))
    }

    fn issue_measurement(&mut self, register: Register) -> Result<u16, E> {
        let address = self.config.address;
        self.com.write(address, &[register as u8])?;
        self.delay.delay_ms(self.config.settle().ticks());

        let mut data: [u8; RESPONSE_LEN] = [0x00; RESPONSE_LEN];
        self.com.read(address, &mut data)?;
        let raw = assemble_raw(data);
        trace!("reg {=u8:#x} raw {=u16}", register as u8, raw);
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::Rounding;
    use embedded_hal_mock::{
        delay::MockNoop,
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
        MockError,
    };
    use float_cmp::approx_eq;
    use pretty_assertions::assert_eq;
    use std::vec;

    fn measure(register: Register, response: [u8; 3]) -> [I2cTransaction; 2] {
        [
            I2cTransaction::write(ADDR, vec![register as u8]),
            I2cTransaction::read(ADDR, response.to_vec()),
        ]
    }

    #[test]
    fn default_address() {
        let mut i2c = I2cMock::new(&[]);
        let ina = INA260::new(&mut i2c, MockNoop::new());
        assert_eq!(ina.address(), 0x40);
        ina.release();
        i2c.done();
    }

    #[test]
    fn explicit_address() {
        let mut i2c = I2cMock::new(&[]);
        let ina = INA260::new_with_address(&mut i2c, MockNoop::new(), 0x45);
        assert_eq!(ina.address(), 0x45);
        assert_eq!(ina.config().settle_ms, 50);
        ina.release();
        i2c.done();
    }

    #[test]
    fn current() {
        let mut i2c = I2cMock::new(&measure(Register::Current, [0x03, 0xE8, 0x00]));
        let mut ina = INA260::new(&mut i2c, MockNoop::new());
        assert_eq!(ina.current().unwrap(), 1250.0);
        i2c.done();
    }

    #[test]
    fn current_overflow_reads_zero() {
        let mut i2c = I2cMock::new(&measure(Register::Current, [0xFF, 0xFF, 0x00]));
        let mut ina = INA260::new(&mut i2c, MockNoop::new());
        assert_eq!(ina.current().unwrap(), 0.0);
        i2c.done();
    }

    #[test]
    fn current_rounding() {
        // 1001 * 1.25 = 1251.25
        let mut expectations = measure(Register::Current, [0x03, 0xE9, 0x00]).to_vec();
        expectations.extend(measure(Register::Current, [0x03, 0xEB, 0x00]));
        let mut i2c = I2cMock::new(&expectations);
        let config = DriverConfig {
            current_rounding: Rounding::Truncate,
            ..Default::default()
        };
        let mut ina = INA260::new_with_config(&mut i2c, MockNoop::new(), config);
        assert_eq!(ina.current().unwrap(), 1251.0);
        // 1003 * 1.25 = 1253.75
        assert_eq!(ina.current().unwrap(), 1253.0);
        i2c.done();
    }

    #[test]
    fn voltage() {
        let mut i2c = I2cMock::new(&measure(Register::BusVoltage, [0x03, 0xE8, 0x00]));
        let mut ina = INA260::new(&mut i2c, MockNoop::new());
        assert!(approx_eq!(f32, ina.voltage().unwrap(), 1.25, ulps = 2));
        i2c.done();
    }

    #[test]
    fn voltage_full_scale() {
        let mut i2c = I2cMock::new(&measure(Register::BusVoltage, [0xFF, 0xFF, 0x00]));
        let mut ina = INA260::new(&mut i2c, MockNoop::new());
        assert!(approx_eq!(f32, ina.voltage().unwrap(), 81.91875, ulps = 2));
        i2c.done();
    }

    #[test]
    fn power() {
        let mut expectations = measure(Register::Power, [0x03, 0xE8, 0x00]).to_vec();
        expectations.extend(measure(Register::Power, [0xFF, 0xFF, 0x00]));
        let mut i2c = I2cMock::new(&expectations);
        let mut ina = INA260::new(&mut i2c, MockNoop::new());
        assert_eq!(ina.power().unwrap(), 10000.0);
        assert_eq!(ina.power().unwrap(), 655350.0);
        i2c.done();
    }

    #[test]
    fn read_all() {
        let mut expectations = measure(Register::BusVoltage, [0x03, 0xE8, 0x00]).to_vec();
        expectations.extend(measure(Register::Current, [0x03, 0xE8, 0x00]));
        expectations.extend(measure(Register::Power, [0x03, 0xE8, 0x00]));
        let mut i2c = I2cMock::new(&expectations);
        let mut ina = INA260::new(&mut i2c, MockNoop::new());
        let reading = ina.read().unwrap();
        assert_eq!(reading.current_ma, 1250.0);
        assert!(approx_eq!(f32, reading.voltage_v, 1.25, ulps = 2));
        assert_eq!(reading.power_mw, 10000.0);
        i2c.done();
    }

    #[test]
    fn uses_configured_address() {
        let expectations = [
            I2cTransaction::write(0x41, vec![Register::Power as u8]),
            I2cTransaction::read(0x41, vec![0x00, 0x01, 0x00]),
        ];
        let mut i2c = I2cMock::new(&expectations);
        let mut ina = INA260::new_with_address(&mut i2c, MockNoop::new(), 0x41);
        assert_eq!(ina.power().unwrap(), 10.0);
        i2c.done();
    }

    #[test]
    fn write_error_propagates() {
        let expectations = [I2cTransaction::write(ADDR, vec![Register::Current as u8])
            .with_error(MockError::Io(std::io::ErrorKind::Other))];
        let mut i2c = I2cMock::new(&expectations);
        let mut ina = INA260::new(&mut i2c, MockNoop::new());
        assert_eq!(
            ina.current().unwrap_err(),
            MockError::Io(std::io::ErrorKind::Other)
        );
        i2c.done();
    }

    #[test]
    fn read_error_propagates() {
        let expectations = [
            I2cTransaction::write(ADDR, vec![Register::BusVoltage as u8]),
            I2cTransaction::read(ADDR, vec![0x00, 0x00, 0x00])
                .with_error(MockError::Io(std::io::ErrorKind::Other)),
        ];
        let mut i2c = I2cMock::new(&expectations);
        let mut ina = INA260::new(&mut i2c, MockNoop::new());
        assert!(ina.voltage().is_err());
        i2c.done();
    }

    #[test]
    fn identify() {
        let mut expectations = measure(Register::ManufacturerId, [0x54, 0x49, 0x00]).to_vec();
        expectations.extend(measure(Register::DieId, [0x22, 0x70, 0x00]));
        let mut i2c = I2cMock::new(&expectations);
        let mut ina = INA260::new(&mut i2c, MockNoop::new());
        let id = ina.identify().unwrap();
        assert_eq!(
            id,
            DeviceId {
                manufacturer: 0x5449,
                die: 0x2270
            }
        );
        assert!(id.is_ina260());
        assert_eq!(id.die_id(), 0x227);
        assert_eq!(id.revision(), 0);
        i2c.done();
    }

    #[test]
    fn foreign_device() {
        // INA226 die id
        let id = DeviceId {
            manufacturer: 0x5449,
            die: 0x2260,
        };
        assert!(!id.is_ina260());
    }

    #[test]
    fn configuration() {
        let mut i2c = I2cMock::new(&measure(Register::Config, [0x61, 0x27, 0x00]));
        let mut ina = INA260::new(&mut i2c, MockNoop::new());
        let config = ina.configuration().unwrap();
        assert_eq!(config.mode, Some(crate::config::Mode::Continuous));
        assert_eq!(config.averaging.samples(), 1);
        i2c.done();
    }
}
