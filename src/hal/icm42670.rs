//! ICM-42670-P inertial sensor driver
//!
//! I2C control and burst reads of temperature, accelerometer and gyro.
//! Reference: ICM-42670-P datasheet (user bank 0 only)

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::imu::{MotionSample, MotionSensor};
use super::HalError;

/// ICM-42670 I2C address (AD0 = HIGH)
pub const ICM42670_ADDR: u8 = 0x69;

/// Expected WHO_AM_I value
pub const WHO_AM_I_VALUE: u8 = 0x67;

/// ICM-42670 register addresses
#[allow(dead_code)]
mod regs {
    pub const SIGNAL_PATH_RESET: u8 = 0x02;
    pub const TEMP_DATA1: u8 = 0x09;
    pub const ACCEL_DATA_X1: u8 = 0x0B;
    pub const GYRO_DATA_X1: u8 = 0x11;
    pub const PWR_MGMT0: u8 = 0x1F;
    pub const GYRO_CONFIG0: u8 = 0x20;
    pub const ACCEL_CONFIG0: u8 = 0x21;
    pub const WHO_AM_I: u8 = 0x75;
}

/// Accelerometer full scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelRange {
    G2,
    G4,
    G8,
    G16,
}

impl AccelRange {
    /// ACCEL_UI_FS_SEL field, bits 6:5
    fn bits(self) -> u8 {
        match self {
            Self::G16 => 0b00,
            Self::G8 => 0b01,
            Self::G4 => 0b10,
            Self::G2 => 0b11,
        }
    }

    /// LSB per g
    fn sensitivity(self) -> f32 {
        match self {
            Self::G2 => 16384.0,
            Self::G4 => 8192.0,
            Self::G8 => 4096.0,
            Self::G16 => 2048.0,
        }
    }
}

/// Gyro full scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GyroRange {
    Dps250,
    Dps500,
    Dps1000,
    Dps2000,
}

impl GyroRange {
    /// GYRO_UI_FS_SEL field, bits 6:5
    fn bits(self) -> u8 {
        match self {
            Self::Dps2000 => 0b00,
            Self::Dps1000 => 0b01,
            Self::Dps500 => 0b10,
            Self::Dps250 => 0b11,
        }
    }

    /// LSB per deg/s
    fn sensitivity(self) -> f32 {
        match self {
            Self::Dps250 => 131.0,
            Self::Dps500 => 65.5,
            Self::Dps1000 => 32.8,
            Self::Dps2000 => 16.4,
        }
    }
}

/// Output data rate field shared by both sensors: 100 Hz.
const ODR_100HZ: u8 = 0x09;

/// ICM-42670 configuration
#[derive(Debug, Clone, Copy)]
pub struct Icm42670Config {
    pub address: u8,
    pub accel_range: AccelRange,
    pub gyro_range: GyroRange,
}

impl Default for Icm42670Config {
    fn default() -> Self {
        Self {
            address: ICM42670_ADDR,
            accel_range: AccelRange::G4,
            gyro_range: GyroRange::Dps2000,
        }
    }
}

/// ICM-42670 driver. Owns its bus handle.
pub struct Icm42670<I2C, D> {
    i2c: I2C,
    delay: D,
    config: Icm42670Config,
}

impl<I2C: I2c, D: DelayNs> Icm42670<I2C, D> {
    /// Create driver; the chip is not touched until `init_motion`.
    pub fn new(i2c: I2C, delay: D, config: Icm42670Config) -> Self {
        Self { i2c, delay, config }
    }

    /// Release the bus.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn write_reg(&mut self, reg: u8, val: u8) -> Result<(), HalError> {
        self.i2c
            .write(self.config.address, &[reg, val])
            .map_err(|_| HalError::BusError)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, HalError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.config.address, &[reg], &mut buf)
            .map_err(|_| HalError::BusError)?;
        Ok(buf[0])
    }
}

impl<I2C: I2c, D: DelayNs> MotionSensor for Icm42670<I2C, D> {
    fn init_motion(&mut self) -> Result<(), HalError> {
        use regs::*;

        // Absent chip and wrong chip look the same to the caller
        let id = self
            .read_reg(WHO_AM_I)
            .map_err(|_| HalError::SensorNotReady)?;
        if id != WHO_AM_I_VALUE {
            return Err(HalError::SensorNotReady);
        }

        let accel = (self.config.accel_range.bits() << 5) | ODR_100HZ;
        let gyro = (self.config.gyro_range.bits() << 5) | ODR_100HZ;
        self.write_reg(ACCEL_CONFIG0, accel)?;
        self.write_reg(GYRO_CONFIG0, gyro)?;

        // Accel and gyro in low-noise mode
        self.write_reg(PWR_MGMT0, 0x0F)?;

        // Gyro needs 45 ms after power-up before data is valid
        self.delay.delay_ms(45);
        Ok(())
    }

    fn read_motion(&mut self) -> Result<MotionSample, HalError> {
        // TEMP_DATA1..GYRO_DATA_Z0, big-endian pairs
        let mut raw = [0u8; 14];
        self.i2c
            .write_read(self.config.address, &[regs::TEMP_DATA1], &mut raw)
            .map_err(|_| HalError::BusError)?;

        Ok(decode_burst(&raw, &self.config))
    }
}

/// Convert one 14-byte burst into physical units.
fn decode_burst(raw: &[u8; 14], config: &Icm42670Config) -> MotionSample {
    let word = |i: usize| i16::from_be_bytes([raw[i], raw[i + 1]]) as f32;
    let a = config.accel_range.sensitivity();
    let g = config.gyro_range.sensitivity();

    MotionSample {
        temperature: word(0) / 128.0 + 25.0,
        ax: word(2) / a,
        ay: word(4) / a,
        az: word(6) / a,
        gx: word(8) / g,
        gy: word(10) / g,
        gz: word(12) / g,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    /// Register file behind a fake bus.
    struct FakeBus {
        regs: [u8; 128],
        fail: bool,
    }

    impl FakeBus {
        fn new() -> Self {
            let mut regs = [0u8; 128];
            regs[regs::WHO_AM_I as usize] = WHO_AM_I_VALUE;
            Self { regs, fail: false }
        }
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        fn transaction(
            &mut self,
            _address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err(ErrorKind::Other);
            }
            let mut pointer = 0usize;
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        pointer = bytes[0] as usize;
                        for (i, &b) in bytes[1..].iter().enumerate() {
                            self.regs[pointer + i] = b;
                        }
                    }
                    Operation::Read(buf) => {
                        let n = buf.len();
                        buf.copy_from_slice(&self.regs[pointer..pointer + n]);
                    }
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn test_init_configures_chip() {
        let mut imu = Icm42670::new(FakeBus::new(), NoDelay, Icm42670Config::default());
        imu.init_motion().unwrap();

        let (bus, _) = imu.release();
        assert_eq!(bus.regs[regs::PWR_MGMT0 as usize], 0x0F);
        assert_eq!(bus.regs[regs::ACCEL_CONFIG0 as usize], 0x49);
        assert_eq!(bus.regs[regs::GYRO_CONFIG0 as usize], 0x09);
    }

    #[test]
    fn test_wrong_identity_not_ready() {
        let mut bus = FakeBus::new();
        bus.regs[regs::WHO_AM_I as usize] = 0x00;
        let mut imu = Icm42670::new(bus, NoDelay, Icm42670Config::default());
        assert_eq!(imu.init_motion(), Err(HalError::SensorNotReady));
    }

    #[test]
    fn test_read_scales_to_g() {
        let mut bus = FakeBus::new();
        // +1 g on X, -0.5 g on Y at ±4 g
        bus.regs[0x0B..0x0D].copy_from_slice(&8192i16.to_be_bytes());
        bus.regs[0x0D..0x0F].copy_from_slice(&(-4096i16).to_be_bytes());

        let mut imu = Icm42670::new(bus, NoDelay, Icm42670Config::default());
        let sample = imu.read_motion().unwrap();
        assert!((sample.ax - 1.0).abs() < 1e-6);
        assert!((sample.ay + 0.5).abs() < 1e-6);
        assert!((sample.temperature - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_bus_failure_reported() {
        let mut bus = FakeBus::new();
        bus.fail = true;
        let mut imu = Icm42670::new(bus, NoDelay, Icm42670Config::default());
        assert_eq!(imu.read_motion(), Err(HalError::BusError));
    }
}
