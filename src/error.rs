use thiserror::Error;

#[derive(Debug, Error)]
pub enum CertPressError {
    #[error("template {0} not found")]
    TemplateNotFound(u32),

    #[error("background image decode failed: {0}")]
    ImageDecode(String),

    #[error("png encode failed: {0}")]
    PngEncode(String),

    #[error("template store error: {0}")]
    Store(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub(crate) fn image_decode(message: impl Into<String>) -> CertPressError {
    CertPressError::ImageDecode(message.into())
}

pub(crate) fn png_encode(message: impl Into<String>) -> CertPressError {
    CertPressError::PngEncode(message.into())
}

pub(crate) fn store(message: impl Into<String>) -> CertPressError {
    CertPressError::Store(message.into())
}
