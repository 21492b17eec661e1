use crate::database::table::Table;
use crate::error::FormatError;
use crate::error::ImportError;
use encoding_rs::Encoding;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;

/// Options for reading delimited text.
#[derive(Debug, Clone)]
pub struct DelimitedOptions {
    /// Field delimiter (default: ';')
    pub delimiter: char,
    /// Text encoding of the file, ASCII-compatible (default: UTF-8)
    pub encoding: &'static Encoding,
}

impl Default for DelimitedOptions {
    fn default() -> Self {
        DelimitedOptions {
            delimiter: ';',
            encoding: encoding_rs::UTF_8,
        }
    }
}

impl DelimitedOptions {
    /// Set the delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the text encoding
    #[must_use]
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Reads a delimited text file whose first line is the header.
pub fn read_delimited(path: &str, delimiter: char) -> Result<Table, ImportError> {
    read_delimited_with_options(path, &DelimitedOptions::default().with_delimiter(delimiter))
}

/// Reads a delimited text file with custom options.
///
/// Fields are split literally on the delimiter; quotes have no meaning.
/// Rows shorter than the header are padded with empty text, longer rows
/// fail with [`ImportError::MalformedRow`].
pub fn read_delimited_with_options(path: &str, options: &DelimitedOptions) -> Result<Table, ImportError> {
    let file = open_file(path).map_err(|error| ImportError::source_unavailable(path, error))?;
    read_lines(BufReader::new(file), options, path)
}

/// Opens a regular file for reading; a directory is not a source.
fn open_file(path: &str) -> Result<File, FormatError> {
    let file = File::open(path)?;
    if file.metadata()?.is_dir() {
        Err(FormatError::Message(format!("{path} is a directory")))?
    }
    Ok(file)
}

/// Reads delimited text from any buffered source.
pub fn read_delimited_from<R: BufRead>(reader: R, options: &DelimitedOptions) -> Result<Table, ImportError> {
    read_lines(reader, options, "<reader>")
}

fn read_lines<R: BufRead>(mut reader: R, options: &DelimitedOptions, source: &str) -> Result<Table, ImportError> {
    let mut buffer = Vec::<u8>::new();
    let Some(header) = next_line(&mut reader, &mut buffer, options.encoding, true, source)? else {
        tracing::debug!(source, "empty delimited source");
        return Ok(Table::default());
    };
    let columns = split(&header, options.delimiter);
    let mut table = Table::with_columns(columns)?;

    let mut line_number = 1usize;
    while let Some(line) = next_line(&mut reader, &mut buffer, options.encoding, false, source)? {
        line_number += 1;
        let fields = split(&line, options.delimiter);
        if fields.len() > table.width() {
            Err(ImportError::MalformedRow {
                line: line_number,
                fields: fields.len(),
                columns: table.width(),
            })?
        }
        table.push_row(fields);
    }
    tracing::debug!(
        source,
        delimiter = %options.delimiter,
        columns = table.width(),
        rows = table.len(),
        "read delimited"
    );
    Ok(table)
}

/// Reads one line without its terminator (`\n` or `\r\n`), `None` at end of input.
/// The first line also loses a byte-order mark.
fn next_line<R: BufRead>(
    reader: &mut R,
    buffer: &mut Vec<u8>,
    encoding: &'static Encoding,
    is_first: bool,
    source: &str,
) -> Result<Option<String>, ImportError> {
    buffer.clear();
    let size = reader.read_until(b'\n', buffer).map_err(|error| ImportError::ReadFailure {
        sheet: source.to_owned(),
        source: error.into(),
    })?;
    if size == 0 {
        return Ok(None);
    }
    if buffer.last() == Some(&b'\n') {
        buffer.pop();
        if buffer.last() == Some(&b'\r') {
            buffer.pop();
        }
    }
    let text = if is_first {
        encoding.decode(buffer).0
    } else {
        encoding.decode_without_bom_handling(buffer).0
    };
    Ok(Some(text.into_owned()))
}

fn split(line: &str, delimiter: char) -> Vec<String> {
    line.split(delimiter).map(str::to_owned).collect()
}
