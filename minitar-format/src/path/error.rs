use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntoEntryNameError {
    EmptyPath,
    TooLong(usize),
    ContainsNul,
}

impl std::error::Error for IntoEntryNameError {}

impl fmt::Display for IntoEntryNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntoEntryNameError::TooLong(len) => write!(
                f,
                "{} ({} bytes, limit is {})",
                self.as_str(),
                len,
                crate::header::NAME_LEN
            ),
            _ => f.write_str(self.as_str()),
        }
    }
}

impl IntoEntryNameError {
    pub fn as_str(&self) -> &str {
        match self {
            IntoEntryNameError::EmptyPath => "no path provided",
            IntoEntryNameError::TooLong(_) => "path too long for a ustar name field",
            IntoEntryNameError::ContainsNul => "path contains a nul byte",
        }
    }
}
