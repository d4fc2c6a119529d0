//! Pure register codecs: physical quantities to and from register words.
//!
//! Nothing here performs I/O or rejects input; out-of-band values are the
//! caller's policy (the device layer checks the configured band before
//! encoding a frequency).

use std::fmt;

use serde::{Deserialize, Serialize};

use super::registers::{diag, frequency, mode};

/// Frequency coefficient stored in bits 13-14 of the frequency register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KfCoefficient {
    /// 8.33 kHz channel spacing.
    #[default]
    Step8_33 = 0b00,
    /// 25 kHz channel spacing.
    Step25 = 0b01,
    /// Offset carrier, shifted down.
    OffsetDown = 0b10,
    /// Offset carrier, shifted up.
    OffsetUp = 0b11,
}

impl KfCoefficient {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Step8_33,
            0b01 => Self::Step25,
            0b10 => Self::OffsetDown,
            _ => Self::OffsetUp,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Encodes a frequency in MHz into the frequency register word.
///
/// The mantissa counts 8.333 kHz steps from the 100 MHz base, rounded to the
/// nearest grid point and masked to 13 bits. Values outside the tuning range
/// are quantized like any other; range checks are the caller's job.
pub fn encode_frequency(freq_mhz: f64, kf: KfCoefficient) -> u16 {
    let diff_hz = (freq_mhz - frequency::BASE_MHZ) * 1_000_000.0;
    let mantissa = (diff_hz / frequency::STEP_HZ).round() as u16;
    ((kf.bits() as u16) << frequency::KF_SHIFT) | (mantissa & frequency::MANTISSA_MASK)
}

/// Decodes the frequency register word into MHz.
pub fn decode_frequency(register: u16) -> f64 {
    let mantissa = register & frequency::MANTISSA_MASK;
    frequency::BASE_MHZ + (mantissa as f64 * frequency::STEP_HZ) / 1_000_000.0
}

/// Extracts the coefficient field from the frequency register word.
pub fn extract_kf(register: u16) -> KfCoefficient {
    KfCoefficient::from_bits((register >> frequency::KF_SHIFT) as u8)
}

/// Mode register word with typed accessors for the individual flag bits.
///
/// Each flag owns a distinct bit, so read-modify-write sequences have no
/// partial-state hazards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeWord(pub u16);

impl ModeWord {
    pub fn raw(self) -> u16 {
        self.0
    }

    fn get(self, bit: u16) -> bool {
        self.0 & bit != 0
    }

    fn set(&mut self, bit: u16, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    pub fn tx(self) -> bool {
        self.get(mode::TX)
    }

    pub fn set_tx(&mut self, on: bool) {
        self.set(mode::TX, on);
    }

    pub fn squelch(self) -> bool {
        self.get(mode::SQUELCH)
    }

    pub fn set_squelch(&mut self, on: bool) {
        self.set(mode::SQUELCH, on);
    }

    pub fn remote(self) -> bool {
        self.get(mode::REMOTE)
    }

    pub fn set_remote(&mut self, on: bool) {
        self.set(mode::REMOTE, on);
    }

    pub fn data_mode(self) -> bool {
        self.get(mode::DATA_MODE)
    }

    pub fn set_data_mode(&mut self, on: bool) {
        self.set(mode::DATA_MODE, on);
    }

    pub fn four_wire(self) -> bool {
        self.get(mode::WIRE_4)
    }

    pub fn set_four_wire(&mut self, on: bool) {
        self.set(mode::WIRE_4, on);
    }

    pub fn power_level(self) -> u8 {
        ((self.0 & mode::POWER_MASK) >> mode::POWER_SHIFT) as u8
    }

    pub fn set_power_level(&mut self, level: u8) {
        self.0 = (self.0 & !mode::POWER_MASK)
            | (((level as u16) << mode::POWER_SHIFT) & mode::POWER_MASK);
    }
}

/// Operating-hours register scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HoursEncoding {
    /// Canonical: one 16-bit counter saturating at 65535.
    #[default]
    Single,
    /// Legacy firmware: registers 0x00/0x01 compose a 32-bit value,
    /// high word first.
    DualWord,
}

/// Decodes the operating-hours counter from the first registers of the file.
pub fn decode_operating_hours(registers: &[u16], encoding: HoursEncoding) -> u32 {
    let high = registers.first().copied().unwrap_or(0) as u32;
    match encoding {
        HoursEncoding::Single => high,
        HoursEncoding::DualWord => {
            let low = registers.get(1).copied().unwrap_or(0) as u32;
            (high << 16) | low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlarmSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for AlarmSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmSeverity::Info => write!(f, "INFO"),
            AlarmSeverity::Warning => write!(f, "WARN"),
            AlarmSeverity::Error => write!(f, "ERROR"),
            AlarmSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One decoded fault condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub code: u16,
    pub severity: AlarmSeverity,
    pub message: &'static str,
}

/// Known fault bits: (register index into DV1..DV4, bit, code, severity, message).
/// Bits without an entry are ignored, which keeps the decoder forward
/// compatible with newer firmware.
const ALARM_TABLE: &[(usize, u16, u16, AlarmSeverity, &str)] = &[
    (0, diag::DV1_POWER_FAIL, 0x0101, AlarmSeverity::Critical, "24V power supply failure"),
    (0, diag::DV1_PLL_UNLOCK, 0x0102, AlarmSeverity::Critical, "Synthesizer PLL unlocked"),
    (0, diag::DV1_PA_FAIL, 0x0103, AlarmSeverity::Critical, "Power amplifier failure"),
    (0, diag::DV1_VSWR_HIGH, 0x0104, AlarmSeverity::Error, "Antenna VSWR too high"),
    (0, diag::DV1_TEMP_HIGH, 0x0105, AlarmSeverity::Warning, "Overtemperature"),
    (1, diag::DV2_RX_FAIL, 0x0201, AlarmSeverity::Error, "Receiver failure"),
    (1, diag::DV2_BATTERY_LOW, 0x0202, AlarmSeverity::Warning, "Battery low"),
];

/// Decodes the four diagnostic registers into the list of active alarms.
pub fn decode_diagnostics(dv: &[u16; 4]) -> Vec<Alarm> {
    ALARM_TABLE
        .iter()
        .filter(|(reg, bit, ..)| dv[*reg] & bit != 0)
        .map(|&(_, _, code, severity, message)| Alarm {
            code,
            severity,
            message,
        })
        .collect()
}
