use std::fmt;

/// Errors returned by the device, its backend and shader loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// A request failed validation against the device or a shader layout.
    InvalidParameter(String),
    /// The backend can no longer accept commands.
    DeviceLost,
    /// WGSL failed to parse or validate, or a shader is missing.
    Shader(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::DeviceLost => write!(f, "GPU device lost"),
            Self::Shader(msg) => write!(f, "shader error: {msg}"),
        }
    }
}

impl std::error::Error for GraphicsError {}
