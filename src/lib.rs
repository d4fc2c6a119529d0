pub mod client;
pub mod config;
pub mod crc16;
pub mod device;
pub mod emulator;
pub mod errors;
pub mod logging;
pub mod transport;

pub use client::ModbusClient;
pub use config::RadioConfig;
pub use device::{DeviceStatus, Fazan19Device};
pub use emulator::{Fazan19Emulator, LoopbackTransport};
pub use errors::RadioError;
pub use transport::{SerialTransport, TcpTransport, Transport};
