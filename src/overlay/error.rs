#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayError {
    /// Grid dimensions must both be at least one.
    InvalidGrid { width: u32, height: u32 },
    /// A label or address that does not name a cell of the current grid.
    UnknownAddress { address: String },
    /// The overlay never created its container primitive.
    NotReady,
    /// The overlay has been torn down.
    Terminated,
    /// The host element or parent container was absent at construction.
    MissingHost,
}

impl OverlayError {
    pub fn unknown_address(address: impl Into<String>) -> Self {
        Self::UnknownAddress {
            address: address.into(),
        }
    }
}

impl std::fmt::Display for OverlayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidGrid { width, height } => {
                write!(f, "invalid grid dimensions {width}x{height}")
            }
            Self::UnknownAddress { address } => {
                write!(f, "address {address} does not resolve on the current grid")
            }
            Self::NotReady => write!(f, "overlay surface has not been created"),
            Self::Terminated => write!(f, "overlay has been terminated"),
            Self::MissingHost => write!(f, "host element or parent container is missing"),
        }
    }
}

impl std::error::Error for OverlayError {}
