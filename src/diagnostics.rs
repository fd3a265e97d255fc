/// Non-fatal build-time conditions
///
/// `build()` never prints; it appends to a `Vec<Diagnostic>` so the caller
/// (a library consumer, or one of the `bin/` programs) decides where
/// diagnostics go.
use std::fmt;

/// A non-fatal condition encountered while building an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The 64-entry directory had no free slot left for `name`
    DirectoryFull {
        /// The file item that could not be stored
        name: String,
    },
    /// The allocator ran out of allocation blocks while extending `name`
    DiskFull {
        /// The file item that was truncated
        name: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DirectoryFull { name } => write!(f, "Directory full; skipping {name}"),
            Diagnostic::DiskFull { name } => write!(f, "Disk full; truncating {name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_full_display() {
        let d = Diagnostic::DirectoryFull { name: "FOO.BAS".into() };
        assert_eq!(d.to_string(), "Directory full; skipping FOO.BAS");
    }

    #[test]
    fn test_disk_full_display() {
        let d = Diagnostic::DiskFull { name: "BIG.BIN".into() };
        assert_eq!(d.to_string(), "Disk full; truncating BIG.BIN");
    }
}
