use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Frame too short: {details}")]
    TooShort {
        details: String,
        frame_data: Option<Vec<u8>>,
    },

    #[error("CRC error: calculated={calculated:04X}, received={received:04X}, frame={frame_hex}")]
    Crc {
        calculated: u16,
        received: u16,
        frame_hex: String,
    },

    #[error("Unexpected response: {details}")]
    UnexpectedResponse {
        details: String,
        frame_data: Option<Vec<u8>>,
    },
}

impl FrameError {
    pub fn too_short(details: impl Into<String>, frame_data: Option<Vec<u8>>) -> Self {
        FrameError::TooShort {
            details: details.into(),
            frame_data,
        }
    }

    pub fn crc(calculated: u16, received: u16, frame: &[u8]) -> Self {
        FrameError::Crc {
            calculated,
            received,
            frame_hex: hex::encode(frame),
        }
    }

    pub fn unexpected(details: impl Into<String>, frame_data: Option<Vec<u8>>) -> Self {
        FrameError::UnexpectedResponse {
            details: details.into(),
            frame_data,
        }
    }
}
