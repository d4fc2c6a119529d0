//! Fazan-19 P5 register map.
//!
//! Canonical offsets follow the official operating manual's register table
//! (the most recent, manual-annotated revision). Earlier firmware revisions
//! used different offsets and a two-register hours counter; their names
//! survive as legacy aliases so old configs and captures stay readable.

/// Operating hours counter. Canonically a single 16-bit value saturating at
/// 65535; legacy firmware paired it with [`CNTR`] as a 32-bit value.
pub const COUNT_WORK: u16 = 0x00;

/// Request counter (canonical) / hours low word (legacy).
pub const CNTR: u16 = 0x01;

/// Mode register: TX/RX, squelch, control/work mode, line type.
pub const MOD_TR: u16 = 0x02;

/// Frequency register: 13-bit mantissa + 2-bit coefficient.
pub const FR_RS: u16 = 0x03;

/// Requested transmit power level.
pub const PKM: u16 = 0x04;

// ADC channels 0x10-0x17: supply voltage, temperature, signal level, ...
pub const AD0: u16 = 0x10;
pub const AD1: u16 = 0x11;
pub const AD2: u16 = 0x12;
pub const AD3: u16 = 0x13;
pub const AD4: u16 = 0x14;
pub const AD5: u16 = 0x15;
pub const AD6: u16 = 0x16;
pub const AD7: u16 = 0x17;

/// First diagnostic register; DV1-DV4 occupy 0x18-0x1B.
pub const DIAG_VUU: u16 = 0x18;
pub const DV1: u16 = DIAG_VUU;
pub const DV2: u16 = DIAG_VUU + 1;
pub const DV3: u16 = DIAG_VUU + 2;
pub const DV4: u16 = DIAG_VUU + 3;

/// Size of the device register file; reads of the full file use this count.
pub const TOTAL_REGISTERS: u16 = 0x1C;

// Legacy revision aliases
pub const CW1: u16 = COUNT_WORK;
pub const CW2: u16 = CNTR;
pub const MR1: u16 = MOD_TR;
pub const FRRS: u16 = FR_RS;

/// Mode register bits.
pub mod mode {
    /// Bit 0: transmitting (PTT active).
    pub const TX: u16 = 0x0001;
    /// Bits 1-2: power level.
    pub const POWER_MASK: u16 = 0x0006;
    pub const POWER_SHIFT: u16 = 1;
    /// Bit 7: squelch (noise suppressor) enabled.
    pub const SQUELCH: u16 = 0x0080;
    /// Bit 8: remote control mode (vs local front panel).
    pub const REMOTE: u16 = 0x0100;
    /// Bit 9: data mode (vs voice).
    pub const DATA_MODE: u16 = 0x0200;
    /// Bit 10: 4-wire line (vs 2-wire).
    pub const WIRE_4: u16 = 0x0400;
}

/// Diagnostic register bits, DV1 (critical) and DV2 (secondary).
pub mod diag {
    pub const DV1_POWER_FAIL: u16 = 0x0001;
    pub const DV1_PLL_UNLOCK: u16 = 0x0002;
    pub const DV1_PA_FAIL: u16 = 0x0004;
    pub const DV1_VSWR_HIGH: u16 = 0x0008;
    pub const DV1_TEMP_HIGH: u16 = 0x0010;
    pub const DV1_ANTENNA: u16 = 0x0020;

    pub const DV2_RX_FAIL: u16 = 0x0100;
    pub const DV2_BATTERY_LOW: u16 = 0x0002;
}

/// Frequency register layout and grid constants.
pub mod frequency {
    /// All frequencies are offsets from this base.
    pub const BASE_MHZ: f64 = 100.0;
    /// Channel grid: 8.333... kHz (25/3 kHz).
    pub const STEP_HZ: f64 = 8333.333_33;
    /// Hardware tuning limits imposed by the register format.
    pub const HW_MIN_MHZ: f64 = 100.0;
    pub const HW_MAX_MHZ: f64 = 149.975;
    /// Bits 0-12: mantissa in grid steps.
    pub const MANTISSA_MASK: u16 = 0x1FFF;
    /// Bits 13-14: coefficient.
    pub const KF_SHIFT: u16 = 13;
    pub const KF_MASK: u16 = 0x03;
}
