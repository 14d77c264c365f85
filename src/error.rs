use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Width or height not strictly positive, or a zoom factor that would
    /// make them so. Only reachable through misuse of the API.
    InvalidViewport { width: f64, height: f64 },
    InvalidSize(u32),
    UnsupportedAlgorithm(String),
    Export(image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidViewport { width, height } => {
                write!(f, "invalid viewport {}x{}, both sides must be positive", width, height)
            }
            Self::InvalidSize(size) => write!(f, "invalid display size {}", size),
            Self::UnsupportedAlgorithm(name) => write!(f, "unsupported algorithm '{}'", name),
            Self::Export(e) => write!(f, "could not save image: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Export(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Self::Export(e)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_messages() {
        let e = Error::UnsupportedAlgorithm("julia".to_string());
        assert_eq!(e.to_string(), "unsupported algorithm 'julia'");
        let e = Error::InvalidSize(0);
        assert_eq!(e.to_string(), "invalid display size 0");
        assert!(e.source().is_none());
    }

    #[test]
    fn test_export_error_has_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let e: Error = image::ImageError::IoError(io).into();
        assert!(e.source().is_some());
        assert!(e.to_string().starts_with("could not save image"));
    }
}
