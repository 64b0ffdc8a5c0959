use thiserror::Error;

#[derive(Error, Debug)]
pub enum PktfeedError {
    #[error("unhandled channel type")]
    UnhandledChannelType,
    #[error("unable to create channel: {e}")]
    UnableCreateChannel { e: String },
    #[error("unable to found interface: {i}")]
    UnableFoundInterface { i: String },
    #[error("no capture device configured")]
    NoDeviceConfigured,
    #[error("capture the packet error: {e}")]
    CapturePacketError { e: String },
    #[error("frame too short for ethernet + ipv4: {len} bytes (need {min})")]
    TooShort { len: usize, min: usize },
    #[error("encode feature record error: {e}")]
    EncodingError { e: String },
    #[error("flush to {addr} failed: {e}")]
    FlushError { addr: String, e: String },
    #[error("invalid config: {e}")]
    InvalidConfig { e: String },
    #[error("thread {name} panicked: {e}")]
    ThreadPanic { name: String, e: String },
    #[error("unlock {name} failed")]
    UnlockError { name: String },
    #[error("io error")]
    IOError(#[from] std::io::Error),
    #[error("parse config file error")]
    ConfigParseError(#[from] serde_yaml::Error),
}

impl PktfeedError {
    /// Capture session setup failures are the only fatal errors.
    pub fn is_capture_open_failure(&self) -> bool {
        matches!(
            self,
            PktfeedError::UnhandledChannelType
                | PktfeedError::UnableCreateChannel { .. }
                | PktfeedError::UnableFoundInterface { .. }
                | PktfeedError::NoDeviceConfigured
        )
    }
}
