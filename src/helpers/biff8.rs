//! Microsoft Office Binary Interchange File Format (BIFF8)
//! Record reader for the workbook stream of Excel 97-2003 files.

use crate::error::FormatError;
use crate::helpers::string::to_f64;
use crate::helpers::string::to_u16;
use crate::helpers::string::to_u32;
use crate::helpers::string::to_u64;
use crate::helpers::string::to_usize;
use encoding_rs::Encoding;
use thiserror::Error;

const CONTINUE: u16 = 60;

#[derive(Error, Debug)]
pub enum Biff8Error {
    #[error("Fewer than {0} bytes remaining")]
    NoEnoughDataError(usize),
}

/// Reader over a BIFF8 record stream.
/// A record and its CONTINUE records are exposed as one logical payload.
pub(crate) struct Biff8Reader {
    /// Code page of compressed strings; UTF-16LE means plain low bytes.
    pub(crate) encoding: &'static Encoding,
    buffer: Vec<u8>,
    pointer: usize, // Next record position in buffer
    chunks: Vec<(usize, usize)>, // Current record chunks (start, end)
    index: usize,  // Current chunk index
    offset: usize, // Offset within current chunk
}

impl Biff8Reader {
    pub(crate) fn new(data: Vec<u8>) -> Biff8Reader {
        Biff8Reader {
            encoding: encoding_rs::UTF_16LE,
            buffer: data,
            pointer: 0,
            chunks: Vec::new(),
            index: 0,
            offset: 0,
        }
    }

    /// Advances to the next record and returns its type, `None` at end of stream.
    pub(crate) fn next(&mut self) -> Result<Option<u16>, FormatError> {
        if self.pointer + 4 > self.buffer.len() {
            return Ok(None);
        }
        self.index = 0;
        self.offset = 0;
        self.chunks.clear();

        let kind = self.get_u16_at(self.pointer)?;
        self.push_chunk()?;
        while self.pointer + 4 <= self.buffer.len() && self.get_u16_at(self.pointer)? == CONTINUE {
            self.push_chunk()?;
        }
        Ok(Some(kind))
    }

    fn push_chunk(&mut self) -> Result<(), FormatError> {
        let size = self.get_u16_at(self.pointer + 2)? as usize;
        let lower = self.pointer + 4;
        let upper = lower + size;
        if upper > self.buffer.len() {
            Err(Biff8Error::NoEnoughDataError(size))?
        }
        self.pointer = upper;
        self.chunks.push((lower, upper));
        Ok(())
    }

    /// Moves to an absolute stream position, typically a sheet's BOF record.
    pub(crate) fn goto(&mut self, pointer: usize) {
        self.pointer = pointer;
        self.chunks.clear();
    }

    fn read_exact(&mut self, length: usize) -> Result<&[u8], FormatError> {
        let (data, size) = self.read(length);
        if size == length {
            Ok(data)
        } else {
            Err(Biff8Error::NoEnoughDataError(length))?
        }
    }

    /// Reads up to `length` bytes without crossing into the next chunk.
    fn read(&mut self, length: usize) -> (&[u8], usize) {
        if let Some((lower, upper)) = self.chunks.get(self.index).copied() {
            let source = upper.min(lower + self.offset);
            let target = upper.min(source + length);
            let size = target - source;
            if source < upper || length == 0 {
                if target == upper {
                    self.index += 1;
                    self.offset = 0;
                } else {
                    self.offset += size;
                }
                return (&self.buffer[source..target], size);
            }
        }
        (&[], 0)
    }

    pub(crate) fn skip(&mut self, length: usize) -> Result<(), FormatError> {
        let mut remaining = length;
        while remaining > 0 {
            let (_, size) = self.read(remaining);
            if size == 0 {
                Err(Biff8Error::NoEnoughDataError(length))?
            }
            remaining -= size;
        }
        Ok(())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, FormatError> {
        self.read_exact(1).map(|data| data[0])
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, FormatError> {
        let data = self.read_exact(2)?;
        Ok(to_u16(data).ok_or(Biff8Error::NoEnoughDataError(2))?)
    }

    /// Reads a u16 located `offset` bytes before the end of the record.
    pub(crate) fn get_u16_back(&self, offset: usize) -> Result<u16, FormatError> {
        let mut offset = offset;
        for (lower, upper) in self.chunks.iter().rev() {
            if *lower + offset <= *upper {
                return self.get_u16_at(*upper - offset);
            }
            offset -= *upper - *lower;
        }
        Err(Biff8Error::NoEnoughDataError(2))?
    }

    fn get_u16_at(&self, index: usize) -> Result<u16, FormatError> {
        self.buffer
            .get(index..index + 2)
            .and_then(to_u16)
            .ok_or_else(|| Biff8Error::NoEnoughDataError(2).into())
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, FormatError> {
        let data = self.read_exact(4)?;
        Ok(to_u32(data).ok_or(Biff8Error::NoEnoughDataError(4))?)
    }

    pub(crate) fn read_usize(&mut self) -> Result<usize, FormatError> {
        let data = self.read_exact(4)?;
        Ok(to_usize(data).ok_or(Biff8Error::NoEnoughDataError(4))?)
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, FormatError> {
        let data = self.read_exact(8)?;
        Ok(to_u64(data).ok_or(Biff8Error::NoEnoughDataError(8))?)
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64, FormatError> {
        let data = self.read_exact(8)?;
        Ok(to_f64(data).ok_or(Biff8Error::NoEnoughDataError(8))?)
    }

    /// Reads an RK number: a 30-bit integer or the high bits of a double,
    /// optionally divided by 100.
    pub(crate) fn read_rk_number(&mut self) -> Result<String, FormatError> {
        let value = self.read_u32()?;
        let is_percentage = (value & 0x01) != 0;
        let is_integer = (value & 0x02) != 0;

        let mut number = if is_integer {
            ((value as i32) >> 2) as f64
        } else {
            f64::from_bits(((value & 0xFFFF_FFFC) as u64) << 32)
        };
        if is_percentage {
            number /= 100.0;
        }
        Ok(number.to_string())
    }

    /// Reads a string with a 1-byte character count.
    pub(crate) fn read_short_xl_unicode_string(&mut self) -> Result<String, FormatError> {
        let mut string = String::new();
        let chars = self.read_u8()? as usize;
        self.read_string_into(chars, &mut string)?;
        Ok(string)
    }

    /// Reads a string with a 2-byte character count.
    pub(crate) fn read_xl_unicode_string(&mut self) -> Result<String, FormatError> {
        let mut string = String::new();
        let chars = self.read_u16()? as usize;
        self.read_string_into(chars, &mut string)?;
        Ok(string)
    }

    /// Reads a shared-string-table entry, which may continue across records.
    /// Formatting runs and phonetic data follow the last character chunk.
    pub(crate) fn read_xl_unicode_rich_extended_string(&mut self) -> Result<String, FormatError> {
        let mut string = String::new();
        let mut expected = self.read_u16()? as usize;
        let flag = self.read_u8()?;
        let rich_string_count = if (flag & 0x8) > 0 {
            self.read_u16()? as usize
        } else {
            0
        };
        let phonetic_count = if (flag & 0x4) > 0 {
            self.read_usize()?
        } else {
            0
        };
        let mut actual = self.read_chars_into(flag, expected, &mut string);
        while actual < expected {
            expected -= actual;
            actual = self.read_string_into(expected, &mut string)?;
            if actual == 0 {
                Err(Biff8Error::NoEnoughDataError(expected))?
            }
        }
        self.skip(4 * rich_string_count)?;
        self.skip(phonetic_count)?;
        Ok(string)
    }

    /// Reads the option flag and up to `chars` characters of the current chunk.
    fn read_string_into(&mut self, chars: usize, content: &mut String) -> Result<usize, FormatError> {
        let flag = self.read_u8()?;
        Ok(self.read_chars_into(flag, chars, content))
    }

    fn read_chars_into(&mut self, flag: u8, chars: usize, content: &mut String) -> usize {
        let encoding = self.encoding;
        let is_high_byte = (flag & 0x1) > 0;
        let expected = Self::chars_to_bytes(is_high_byte, chars);
        let (bytes, actual) = self.read(expected);
        if is_high_byte {
            let (string, _) = encoding_rs::UTF_16LE.decode_without_bom_handling(bytes);
            content.push_str(&string);
        } else if encoding == encoding_rs::UTF_16LE {
            // Compressed strings store the low byte of each UTF-16 unit.
            content.extend(bytes.iter().map(|byte| char::from(*byte)));
        } else {
            let (string, _) = encoding.decode_without_bom_handling(bytes);
            content.push_str(&string);
        }
        Self::bytes_to_chars(is_high_byte, actual)
    }

    #[inline]
    fn chars_to_bytes(is_high_byte: bool, chars: usize) -> usize {
        if is_high_byte { chars << 1 } else { chars }
    }

    #[inline]
    fn bytes_to_chars(is_high_byte: bool, bytes: usize) -> usize {
        if is_high_byte { bytes >> 1 } else { bytes }
    }
}

#[macro_export]
macro_rules! match_biff8_record {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(kind) = $reader.next()? {
            match kind {
                $($arms)*
                _ => (),
            }
        }
    };
}
