use thiserror::Error;

/// Low-level failure raised while decoding a source.
/// Aggregates errors from the standard library, dependencies, and internal helpers.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("{0}")]
    Message(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    CfbHelperError(#[from] crate::helpers::cfb::CfbError),

    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    #[error("{0}")]
    Biff8HelperError(#[from] crate::helpers::biff8::Biff8Error),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    XlsError(#[from] crate::spreadsheet::xls::XlsError),
}

/// Error returned by every import operation.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The file is missing, locked, or not a recognized format.
    #[error("Source '{path}' is unavailable: {source}")]
    SourceUnavailable {
        path: String,
        #[source]
        source: FormatError,
    },

    /// Sheet names could not be read from the workbook.
    #[error("Read sheet names of '{path}' failed: {source}")]
    SchemaReadFailure {
        path: String,
        #[source]
        source: FormatError,
    },

    /// Rows or cells could not be read.
    #[error("Read '{sheet}' failed: {source}")]
    ReadFailure {
        sheet: String,
        #[source]
        source: FormatError,
    },

    /// A delimited line has more fields than the header has columns.
    #[error("Line {line} has {fields} fields but the header has {columns} columns")]
    MalformedRow {
        line: usize,
        fields: usize,
        columns: usize,
    },

    /// Two header cells produced the same column name.
    #[error("Duplicate column name '{name}'")]
    DuplicateColumn { name: String },
}

impl ImportError {
    pub(crate) fn source_unavailable(path: &str, source: impl Into<FormatError>) -> Self {
        ImportError::SourceUnavailable {
            path: path.to_owned(),
            source: source.into(),
        }
    }
}

/// Classifies a low-level failure into one public error kind.
pub(crate) trait ResultKind<T> {
    fn or_unavailable(self, path: &str) -> Result<T, ImportError>;

    fn or_schema_failure(self, path: &str) -> Result<T, ImportError>;

    fn or_read_failure(self, sheet: &str) -> Result<T, ImportError>;
}

impl<T> ResultKind<T> for Result<T, FormatError> {
    fn or_unavailable(self, path: &str) -> Result<T, ImportError> {
        self.map_err(|source| ImportError::source_unavailable(path, source))
    }

    fn or_schema_failure(self, path: &str) -> Result<T, ImportError> {
        self.map_err(|source| ImportError::SchemaReadFailure {
            path: path.to_owned(),
            source,
        })
    }

    fn or_read_failure(self, sheet: &str) -> Result<T, ImportError> {
        self.map_err(|source| ImportError::ReadFailure {
            sheet: sheet.to_owned(),
            source,
        })
    }
}

pub(crate) trait ResultOptionChain {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self;
}

impl<T, E> ResultOptionChain for Result<Option<T>, E> {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        match self {
            Ok(None) => f(),
            _ => self,
        }
    }
}
