use thiserror::Error;

/// Failures that abort a single portrait request.
///
/// A lookup that simply matches nothing is not an error; resolvers return
/// `Ok(None)` for that case.
#[derive(Debug, Error)]
pub enum PortraitError {
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Metadata service error: {0}")]
    MetadataService(String),
    #[error("Dictionary unavailable: {0}")]
    Lexicon(String),
    #[error("Character list unavailable: {0}")]
    ReferenceListUnavailable(String),
    #[error("Image generation failed: {0}")]
    ImageGeneration(String),
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

pub type PortraitResult<T> = Result<T, PortraitError>;
