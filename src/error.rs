//! Error types and handling for framebridge

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Why a named region could not be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenErrorKind {
    /// No object exists under the name and creation was not requested
    NotFound,
    /// The object exists but this process may not map it
    PermissionDenied,
    /// Any other OS-level failure
    Other,
}

impl OpenErrorKind {
    /// Classify an I/O error returned by the opener
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => OpenErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => OpenErrorKind::PermissionDenied,
            _ => OpenErrorKind::Other,
        }
    }
}

impl std::fmt::Display for OpenErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpenErrorKind::NotFound => write!(f, "not found"),
            OpenErrorKind::PermissionDenied => write!(f, "permission denied"),
            OpenErrorKind::Other => write!(f, "os error"),
        }
    }
}

/// Error types for the shared memory bridge
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The named region could not be opened or mapped
    #[error("Failed to open region '{name}': {kind}")]
    Open {
        name: String,
        kind: OpenErrorKind,
        #[source]
        source: Option<std::io::Error>,
    },

    /// I/O failures after the region was opened (sizing, mapping, flushing)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// A scene or UI payload larger than its slot
    #[error("Oversized {payload} payload: {length} bytes exceeds slot capacity of {capacity}")]
    OversizedPayload {
        payload: &'static str,
        length: usize,
        capacity: usize,
    },

    /// The input queue has no free slot; the event was not enqueued
    #[error("Input queue full ({capacity} events pending)")]
    QueueFull { capacity: usize },

    /// Another live handle already holds this role's writer side
    #[error("The {role} role of this region is already held by another session")]
    RoleInUse { role: &'static str },

    /// Operation attempted after the session was shut down
    #[error("Stale handle: bridge session is closed")]
    StaleHandle,

    /// The consumer did not release a frame slot in time
    #[error("Timed out after {waited_ms} ms waiting for frame slot {slot} to be consumed")]
    ConsumerTimeout { slot: usize, waited_ms: u64 },

    /// The mapped region carries a different schema than this build
    #[error("Layout mismatch on {field}: expected {expected:#x}, found {actual:#x}")]
    LayoutMismatch {
        field: &'static str,
        expected: u32,
        actual: u32,
    },

    /// The mapped region is smaller than the layout requires
    #[error("Region too small: layout needs {required} bytes, region has {actual}")]
    RegionTooSmall { required: usize, actual: usize },

    /// An access outside the mapped region or at a misaligned offset
    #[error("Out of bounds access: offset {offset} length {length} in region of {size} bytes")]
    OutOfBounds {
        offset: usize,
        length: usize,
        size: usize,
    },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Platform-specific errors
    #[error("Platform error: {message}")]
    Platform { message: String },
}

impl BridgeError {
    /// Create an open error from the opener's I/O error
    pub fn open(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Open {
            name: name.into(),
            kind: OpenErrorKind::from_io(&source),
            source: Some(source),
        }
    }

    /// Create an I/O error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Io {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create an oversized payload error
    pub fn oversized(payload: &'static str, length: usize, capacity: usize) -> Self {
        Self::OversizedPayload {
            payload,
            length,
            capacity,
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a layout mismatch error
    pub fn layout_mismatch(field: &'static str, expected: u32, actual: u32) -> Self {
        Self::LayoutMismatch {
            field,
            expected,
            actual,
        }
    }

    /// Create an out of bounds error
    pub fn out_of_bounds(offset: usize, length: usize, size: usize) -> Self {
        Self::OutOfBounds {
            offset,
            length,
            size,
        }
    }

    /// Create a platform error
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }

    /// Whether the error ends the session rather than a single operation
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            BridgeError::QueueFull { .. } | BridgeError::ConsumerTimeout { .. }
        )
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}
