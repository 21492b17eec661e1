//! OLE Compound File Binary (CFB) container used by legacy `.xls` workbooks
//! and by encrypted zipped workbooks.

use crate::error::FormatError;
use crate::helpers::string::to_u16;
use crate::helpers::string::to_u64;
use crate::helpers::string::to_usize;
use crate::helpers::string::to_usize_iter;
use encoding_rs::UTF_16LE;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use thiserror::Error;

const MAX_REG_SECT: usize = 0xFFFFFFFB;
const SIGNATURE: u64 = 0xE11A_B1A1_E011_CFD0;
const HEADER_SIZE: usize = 512;
const DIRECTORY_SIZE: usize = 128;
const MINI_SECTOR_SIZE: usize = 64;
const MINI_STREAM_CUTOFF: usize = 4096;

#[derive(Error, Debug)]
pub enum CfbError {
    #[error("The file is corrupted or has an invalid CFB structure")]
    FileFormatError,

    #[error("Invalid OLE signature (not an office document?)")]
    OleSignatureError,

    #[error("Invalid Sector size '2 ^ {1}' for major version '{0}'")]
    SectorSizeError(u16, u16),

    #[error("Sector '{0}' is out of range")]
    SectorRangeError(usize),

    #[error("The number of file allocation table error: expect '{0}', actual '{1}'")]
    FileAllocationTableError(usize, usize),

    #[error("Empty Root directory")]
    RootDirectoryError,
}

/// Parsed compound file held in memory.
pub(crate) struct Cfb {
    directories: HashMap<String, Directory>,
    file_allocation_table: Vec<usize>,
    sectors: Sectors,
    mini_file_allocation_table: Vec<usize>,
    mini_sectors: Sectors,
}

impl Cfb {
    /// Reads the whole container and indexes its streams by name.
    pub(crate) fn new<RS: Read + Seek>(reader: &mut RS) -> Result<Cfb, FormatError> {
        let size = reader.seek(SeekFrom::End(0))? as usize;
        if size < HEADER_SIZE {
            Err(CfbError::FileFormatError)?;
        }
        reader.seek(SeekFrom::Start(0))?;
        let mut data = vec![0u8; size];
        reader.read_exact(&mut data)?;

        let header = Header::new(&data[..HEADER_SIZE])?;
        let sectors = Sectors { data, size: header.sector_size()? };
        let file_allocation_table = Self::load_file_allocation_table(&sectors, &header)?;
        let directories = Self::load_directories(&file_allocation_table, &sectors, header.directory_start)?;
        let mini_file_allocation_table = if header.mini_file_allocation_table_count > 0 {
            let bytes = Self::read_bytes(&file_allocation_table, &sectors, header.mini_file_allocation_table_start)?;
            to_usize_iter(&bytes).collect()
        } else {
            Vec::new()
        };
        let mini_sectors = match directories.get("Root Entry") {
            Some(root) => {
                let mut data = Self::read_bytes(&file_allocation_table, &sectors, root.start)?;
                data.truncate(root.size);
                Sectors { data, size: MINI_SECTOR_SIZE }
            }
            None => Sectors { data: Vec::new(), size: MINI_SECTOR_SIZE },
        };

        Ok(Cfb {
            directories,
            file_allocation_table,
            sectors,
            mini_file_allocation_table,
            mini_sectors,
        })
    }

    pub(crate) fn exists(&self, name: &str) -> bool {
        self.directories.contains_key(name)
    }

    /// Reads the stream with the given name, `None` if absent.
    pub(crate) fn read(&self, name: &str) -> Result<Option<Vec<u8>>, FormatError> {
        let Some(directory) = self.directories.get(name) else {
            return Ok(None);
        };
        let mut bytes = if directory.size < MINI_STREAM_CUTOFF {
            Self::read_bytes(&self.mini_file_allocation_table, &self.mini_sectors, directory.start)?
        } else {
            Self::read_bytes(&self.file_allocation_table, &self.sectors, directory.start)?
        };
        bytes.truncate(directory.size);
        Ok(Some(bytes))
    }

    /// Builds the FAT from the header DIFAT entries and the DIFAT sector chain.
    fn load_file_allocation_table(sectors: &Sectors, header: &Header) -> Result<Vec<usize>, FormatError> {
        let mut double_indirect: Vec<usize> = to_usize_iter(&sectors.data[76..HEADER_SIZE]).collect();
        let mut index = header.double_indirect_start;
        let mut visited = 0usize;
        while index < MAX_REG_SECT && visited < header.double_indirect_count {
            double_indirect.extend(to_usize_iter(sectors.get(index)?));
            index = double_indirect.pop().ok_or(CfbError::FileFormatError)?;
            visited += 1;
        }

        let mut file_allocation_table = Vec::new();
        let mut count = 0usize;
        for index in double_indirect.into_iter().filter(|index| *index < MAX_REG_SECT) {
            file_allocation_table.extend(to_usize_iter(sectors.get(index)?));
            count += 1;
        }
        if count != header.file_allocation_table_count {
            Err(CfbError::FileAllocationTableError(header.file_allocation_table_count, count))?
        }
        Ok(file_allocation_table)
    }

    fn load_directories(file_allocation_table: &[usize], sectors: &Sectors, start: usize) -> Result<HashMap<String, Directory>, FormatError> {
        let bytes = Self::read_bytes(file_allocation_table, sectors, start)?;
        let directories: HashMap<String, Directory> = bytes
            .chunks_exact(DIRECTORY_SIZE)
            .filter_map(Directory::new)
            .collect();
        if directories.is_empty() {
            Err(CfbError::RootDirectoryError)?
        }
        Ok(directories)
    }

    /// Follows a sector chain; a chain longer than the table is a cycle.
    fn read_bytes(file_allocation_table: &[usize], sectors: &Sectors, start: usize) -> Result<Vec<u8>, FormatError> {
        let mut content = Vec::new();
        let mut index = start;
        let mut steps = 0usize;
        while index < MAX_REG_SECT {
            if steps > file_allocation_table.len() {
                Err(CfbError::FileFormatError)?
            }
            content.extend_from_slice(sectors.get(index)?);
            index = *file_allocation_table.get(index).ok_or(CfbError::SectorRangeError(index))?;
            steps += 1;
        }
        Ok(content)
    }
}

/// Raw sector storage. Regular sectors are offset by the header, mini sectors are not.
struct Sectors {
    data: Vec<u8>,
    size: usize,
}

impl Sectors {
    fn get(&self, index: usize) -> Result<&[u8], CfbError> {
        let offset = if self.size == MINI_SECTOR_SIZE { 0 } else { 1 };
        let source = (index + offset) * self.size;
        let target = self.data.len().min(source + self.size);
        self.data
            .get(source..target)
            .filter(|sector| !sector.is_empty())
            .ok_or(CfbError::SectorRangeError(index))
    }
}

struct Header {
    major_version: u16,
    sector_shift: u16,
    file_allocation_table_count: usize,
    directory_start: usize,
    mini_file_allocation_table_start: usize,
    mini_file_allocation_table_count: usize,
    double_indirect_start: usize,
    double_indirect_count: usize,
}

impl Header {
    fn new(data: &[u8]) -> Result<Self, FormatError> {
        let field = |range: std::ops::Range<usize>| to_usize(&data[range]).ok_or(CfbError::FileFormatError);
        if to_u64(&data[0..8]) != Some(SIGNATURE) {
            Err(CfbError::OleSignatureError)?;
        }
        Ok(Header {
            major_version: to_u16(&data[26..28]).ok_or(CfbError::FileFormatError)?,
            sector_shift: to_u16(&data[30..32]).ok_or(CfbError::FileFormatError)?,
            file_allocation_table_count: field(44..48)?,
            directory_start: field(48..52)?,
            mini_file_allocation_table_start: field(60..64)?,
            mini_file_allocation_table_count: field(64..68)?,
            double_indirect_start: field(68..72)?,
            double_indirect_count: field(72..76)?,
        })
    }

    fn sector_size(&self) -> Result<usize, CfbError> {
        match (self.major_version, self.sector_shift) {
            (3, 0x0009) => Ok(512),
            // Version 4 pads the 512-byte header to a full 4096-byte sector.
            (4, 0x000C) => Ok(4096),
            (major, shift) => Err(CfbError::SectorSizeError(major, shift)),
        }
    }
}

struct Directory {
    start: usize,
    size: usize,
}

impl Directory {
    /// Decodes one 128-byte entry; unused entries (empty name) are skipped.
    fn new(bytes: &[u8]) -> Option<(String, Directory)> {
        let length = (to_u16(&bytes[64..66])? as usize).min(64);
        let (name, _, _) = UTF_16LE.decode(&bytes[..length]);
        let name = match name.find('\0') {
            Some(position) => name[..position].to_owned(),
            None => name.to_string(),
        };
        if name.is_empty() {
            return None;
        }
        let start = to_usize(&bytes[116..120])?;
        let size = to_u64(&bytes[120..128])? as usize;
        Some((name, Directory { start, size }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn rejects_short_file() {
        let mut reader = Cursor::new(vec![0u8; 100]);
        assert!(matches!(Cfb::new(&mut reader), Err(FormatError::CfbHelperError(CfbError::FileFormatError))));
    }

    #[test]
    fn rejects_bad_signature() {
        let mut reader = Cursor::new(vec![0u8; 1024]);
        assert!(matches!(Cfb::new(&mut reader), Err(FormatError::CfbHelperError(CfbError::OleSignatureError))));
    }

    #[test]
    fn mini_sectors_have_no_header_offset() {
        let sectors = Sectors { data: (0..128).collect(), size: MINI_SECTOR_SIZE };
        assert_eq!(sectors.get(1).unwrap()[0], 64);
        assert!(sectors.get(2).is_err());
    }
}
