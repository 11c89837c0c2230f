use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("media reference cannot be empty")]
    Empty,

    #[error("media reference is not a valid URL: {0}")]
    InvalidUrl(String),
}

//
// ─── MEDIA REFERENCE ───────────────────────────────────────────────────────────
//

/// Optional illustration attached to a question.
///
/// Either a bot-local file path or an absolute URL. The engine never touches
/// the bytes; the presentation layer resolves the reference when rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaUri {
    FilePath(PathBuf),
    Url(Url),
}

impl MediaUri {
    /// Builds a file-path reference.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Empty` for an empty path.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, MediaError> {
        let p = path.into();
        if p.as_os_str().is_empty() {
            return Err(MediaError::Empty);
        }
        Ok(MediaUri::FilePath(p))
    }

    /// Parses an absolute URL reference.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Empty` for blank input and
    /// `MediaError::InvalidUrl` when parsing fails.
    pub fn from_url(url: impl AsRef<str>) -> Result<Self, MediaError> {
        let s = url.as_ref().trim();
        if s.is_empty() {
            return Err(MediaError::Empty);
        }
        let u = Url::parse(s).map_err(|_| MediaError::InvalidUrl(s.to_owned()))?;
        Ok(MediaUri::Url(u))
    }

    /// Parses a stored reference: URLs when they parse, file paths otherwise.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Empty` for blank input.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, MediaError> {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            return Err(MediaError::Empty);
        }
        match Url::parse(s) {
            Ok(u) => Ok(MediaUri::Url(u)),
            Err(_) => Ok(MediaUri::FilePath(PathBuf::from(s))),
        }
    }

    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            MediaUri::FilePath(p) => Some(p.as_path()),
            MediaUri::Url(_) => None,
        }
    }

    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            MediaUri::Url(u) => Some(u),
            MediaUri::FilePath(_) => None,
        }
    }
}

impl fmt::Display for MediaUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaUri::FilePath(p) => write!(f, "{}", p.display()),
            MediaUri::Url(u) => write!(f, "{u}"),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
