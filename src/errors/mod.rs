mod config;
mod frame;
mod kinds;
mod radio;
mod transport;

pub use kinds::IoOperation;
pub use kinds::ProtocolErrorKind;
pub use kinds::SerialErrorKind;

pub use config::ConfigError;
pub use frame::FrameError;
pub use radio::RadioError;
pub use transport::TransportError;
