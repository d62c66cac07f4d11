use std::path::PathBuf;

/// Fatal errors surfaced while loading a cartridge.
///
/// Everything past cartridge construction degrades gracefully instead of
/// erroring, so this enum only covers image parsing and mapper selection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Provided buffer is shorter than the 16-byte header.
    #[error("header expected 16 bytes, got {actual}")]
    TooShort { actual: usize },
    /// Magic number ("NES<EOF>") is missing.
    #[error("missing NES magic bytes")]
    InvalidMagic,
    /// A ROM section (trainer/PRG/CHR) is shorter than advertised.
    #[error("{section} section expected {expected} bytes, got {actual}")]
    SectionTooShort {
        section: &'static str,
        expected: usize,
        actual: usize,
    },
    /// No board implementation is registered for the mapper id.
    #[error("mapper {0} is not supported")]
    UnsupportedMapper(u16),
    /// The image file could not be read.
    #[error("failed to read cartridge {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A frame was requested before any cartridge parameter was set.
    #[error("no cartridge parameter has been set")]
    NoCartridge,
}
