use std::fmt::Display;
use std::path::PathBuf;

#[derive(Debug)]
pub enum DataProcessingError {
    /// A spectrum whose peaks are not sorted by m/z reached the scorer.
    /// Every range lookup binary-searches the peak list, so this is fatal.
    UnsortedSpectrum {
        index: usize,
    },
    ExpectedSlicesSameLength {
        expected: usize,
        other: usize,
        context: String,
    },
    IndexOutOfBounds {
        index: usize,
        len: usize,
    },
    IncompleteOutput {
        delivered: usize,
        expected: usize,
    },
    PipelineAborted,
}

impl Display for DataProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsortedSpectrum { index } => {
                write!(f, "Spectrum {} is not sorted by m/z", index)
            }
            Self::ExpectedSlicesSameLength {
                expected,
                other,
                context,
            } => write!(
                f,
                "Expected slices of the same length ({} vs {}) in {}",
                expected, other, context
            ),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "Spectrum index {} out of bounds for {} spectra", index, len)
            }
            Self::IncompleteOutput {
                delivered,
                expected,
            } => write!(
                f,
                "Only {} of {} spectra were delivered to the output",
                delivered, expected
            ),
            Self::PipelineAborted => write!(f, "Pipeline aborted by another worker"),
        }
    }
}

#[derive(Debug)]
pub enum DataReadingError {
    Io {
        source: std::io::Error,
        path: Option<PathBuf>,
    },
    Xml(quick_xml::Error),
    Base64(base64::DecodeError),
    UnsupportedEncoding {
        encoding: String,
        spectrum: usize,
    },
    MalformedMzML {
        msg: String,
    },
}

impl Display for DataReadingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { source, path } => match path {
                Some(path) => write!(f, "Error reading file {}: {}", path.display(), source),
                None => write!(f, "I/O error: {}", source),
            },
            Self::Xml(e) => write!(f, "XML error: {}", e),
            Self::Base64(e) => write!(f, "Base64 decoding error: {}", e),
            Self::UnsupportedEncoding { encoding, spectrum } => write!(
                f,
                "Unsupported binary encoding '{}' in spectrum {}",
                encoding, spectrum
            ),
            Self::MalformedMzML { msg } => write!(f, "Malformed mzML: {}", msg),
        }
    }
}

impl From<std::io::Error> for DataReadingError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source, path: None }
    }
}

impl From<quick_xml::Error> for DataReadingError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e)
    }
}

impl From<quick_xml::events::attributes::AttrError> for DataReadingError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(e.into())
    }
}

impl From<base64::DecodeError> for DataReadingError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Base64(e)
    }
}

#[derive(Debug)]
pub enum HitimeError {
    DataProcessing(DataProcessingError),
    DataReading(DataReadingError),
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl Display for HitimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataProcessing(e) => write!(f, "{}", e),
            Self::DataReading(e) => write!(f, "{}", e),
            Self::ThreadPool(e) => write!(f, "Unable to build worker pool: {}", e),
        }
    }
}

impl std::error::Error for HitimeError {}

pub type Result<T> = std::result::Result<T, HitimeError>;

impl From<DataProcessingError> for HitimeError {
    fn from(x: DataProcessingError) -> Self {
        Self::DataProcessing(x)
    }
}

impl From<DataReadingError> for HitimeError {
    fn from(x: DataReadingError) -> Self {
        Self::DataReading(x)
    }
}

impl From<std::io::Error> for HitimeError {
    fn from(x: std::io::Error) -> Self {
        Self::DataReading(x.into())
    }
}

impl From<quick_xml::Error> for HitimeError {
    fn from(x: quick_xml::Error) -> Self {
        Self::DataReading(x.into())
    }
}

impl From<rayon::ThreadPoolBuildError> for HitimeError {
    fn from(x: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool(x)
    }
}
