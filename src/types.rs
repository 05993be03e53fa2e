use std::time::Duration;

/// Default value of the device address (TM13/TM14 manual, section 3.1).
pub const PREVAC_DEFAULT_DEVICE_ADDR: u8 = 0xC8;

/// Default value of the logic group (TM13/TM14 manual, section 3.1).
pub const PREVAC_DEFAULT_LOGIC_GROUP: u8 = 0xC8;

/// Default address of the sender (the host driver).
pub const PREVAC_DEFAULT_DRIVER_ADDR: u8 = 0x01;

/// Class of PREVAC device, sent in the device group field of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DeviceClass {
    /// EBV power supply.
    #[default]
    EbvPowerSupply = 0x91,
    /// TM13/TM14 thickness monitor.
    ThicknessMonitor = 0xA1,
}

impl DeviceClass {
    /// The device group byte for this class.
    pub fn group(self) -> u8 {
        self as u8
    }
}

/// Addressing fields shared by every frame exchanged with one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress {
    /// Hardware address of the target device.
    pub device_addr: u8,
    /// Device class identifier.
    pub device_group: u8,
    /// Link layer grouping identifier.
    pub logic_group: u8,
    /// Address of the sender.
    pub driver_addr: u8,
}

impl DeviceAddress {
    /// Power-on defaults for a given device class.
    pub fn for_class(class: DeviceClass) -> DeviceAddress {
        DeviceAddress {
            device_addr: PREVAC_DEFAULT_DEVICE_ADDR,
            device_group: class.group(),
            logic_group: PREVAC_DEFAULT_LOGIC_GROUP,
            driver_addr: PREVAC_DEFAULT_DRIVER_ADDR,
        }
    }
}

impl Default for DeviceAddress {
    fn default() -> Self {
        DeviceAddress::for_class(DeviceClass::default())
    }
}

/// How a payload assignment interprets its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadMode {
    /// Store the input bytes verbatim; the data length follows the input length.
    Text,
    /// Parse whitespace separated hex byte tokens, filling the already declared data length.
    HexTokens,
}

/// Parity setting of the serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

/// Flow control setting of the serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

/// Connection parameters expected by the instrument (TM13/TM14 manual, section 3.2).
///
/// The crate never opens a port itself; these values are meant to be handed to the
/// serial library that creates the stream passed to [`Channel`](crate::Channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialSettings {
    /// Line speed in bits per second. The instrument only supports 57600.
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    pub flow_control: FlowControl,
    /// Maximum gap allowed between two received bytes.
    pub read_interval_timeout: Duration,
    /// Constant part of the total read timeout.
    pub read_total_timeout: Duration,
    /// Per-byte part of the total read timeout.
    pub read_timeout_per_byte: Duration,
    /// Constant part of the total write timeout.
    pub write_total_timeout: Duration,
    /// Per-byte part of the total write timeout.
    pub write_timeout_per_byte: Duration,
}

impl SerialSettings {
    /// Worst case read timeout for a transfer of `bytes` bytes.
    pub fn read_timeout_for(&self, bytes: usize) -> Duration {
        self.read_total_timeout + self.read_timeout_per_byte * bytes as u32
    }

    /// Worst case write timeout for a transfer of `bytes` bytes.
    pub fn write_timeout_for(&self, bytes: usize) -> Duration {
        self.write_total_timeout + self.write_timeout_per_byte * bytes as u32
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        SerialSettings {
            baud_rate: 57600,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            flow_control: FlowControl::None,
            read_interval_timeout: Duration::from_millis(50),
            read_total_timeout: Duration::from_millis(50),
            read_timeout_per_byte: Duration::from_millis(10),
            write_total_timeout: Duration::from_millis(50),
            write_timeout_per_byte: Duration::from_millis(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_address_matches_power_on_values() {
        let addr = DeviceAddress::default();
        assert_eq!(addr.device_addr, 0xC8);
        assert_eq!(addr.device_group, 0x91);
        assert_eq!(addr.logic_group, 0xC8);
        assert_eq!(addr.driver_addr, 0x01);

        let tm = DeviceAddress::for_class(DeviceClass::ThicknessMonitor);
        assert_eq!(tm.device_group, 0xA1);
    }

    #[test]
    fn serial_timeouts_scale_with_length() {
        let settings = SerialSettings::default();
        assert_eq!(settings.baud_rate, 57600);
        assert_eq!(
            settings.read_timeout_for(10),
            Duration::from_millis(50 + 100)
        );
        assert_eq!(settings.write_timeout_for(0), Duration::from_millis(50));
    }
}
