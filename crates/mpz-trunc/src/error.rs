use mpz_trunc_core::ShareError;

/// Truncation error.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct TruncError(#[from] ErrorRepr);

impl TruncError {
    pub(crate) fn length(input: usize, output: usize) -> Self {
        Self(ErrorRepr::Length { input, output })
    }

    pub(crate) fn msb_length(input: usize, msb: usize) -> Self {
        Self(ErrorRepr::MsbLength { input, msb })
    }

    pub(crate) fn compare<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self(ErrorRepr::Compare(err.into()))
    }

    pub(crate) fn convert<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self(ErrorRepr::Convert(err.into()))
    }

    pub(crate) fn io<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self(ErrorRepr::Io(err.into()))
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ErrorRepr {
    #[error("output length {output} does not match input length {input}")]
    Length { input: usize, output: usize },
    #[error("msb length {msb} does not match input length {input}")]
    MsbLength { input: usize, msb: usize },
    #[error("share error: {0}")]
    Share(#[from] ShareError),
    #[error("compare error: {0}")]
    Compare(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("convert error: {0}")]
    Convert(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("io error: {0}")]
    Io(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl From<ShareError> for TruncError {
    fn from(err: ShareError) -> Self {
        Self(ErrorRepr::Share(err))
    }
}
