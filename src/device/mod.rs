//! Device layer: register maps, value codecs and the Fazan-19 driver.

mod codec;
mod fazan19;
pub mod registers;

pub use codec::{
    decode_diagnostics, decode_frequency, decode_operating_hours, encode_frequency, extract_kf,
    Alarm, AlarmSeverity, HoursEncoding, KfCoefficient, ModeWord,
};
pub use fazan19::{
    ControlMode, DeviceStatus, DeviceType, Fazan19Device, LineType, WorkMode,
};
