//! Typed error types for mural-text.

use thiserror::Error;

/// Top-level error type for the bitmap-text subsystem.
#[derive(Debug, Error)]
pub enum TextError {
    // -----------------------------------------------------------------------
    // Atlas construction
    // -----------------------------------------------------------------------
    /// The host could not provide a rasterization surface. Surface
    /// acquisition failures are fatal at font construction time; they are
    /// not retried here.
    #[error("atlas surface unavailable: {0}")]
    Surface(#[from] mural_core::CoreError),

    // -----------------------------------------------------------------------
    // BMFont descriptors
    // -----------------------------------------------------------------------
    /// A BMFont text descriptor line could not be parsed.
    #[error("BMFont descriptor parse failed at line {line}: {message}")]
    BmFontParse {
        /// 1-based line number in the descriptor.
        line: usize,
        /// What went wrong on that line.
        message: String,
    },

    /// The descriptor parsed but is missing a required block.
    #[error("BMFont descriptor incomplete: missing '{0}' block")]
    BmFontIncomplete(&'static str),
}
