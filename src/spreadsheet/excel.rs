//! Parts shared by the Excel engines: relationships, number formats,
//! and encrypted-package detection.
use crate::error::FormatError;
use crate::helpers::cfb::Cfb;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use zip::ZipArchive;

const TAG_RELATIONSHIP: &[u8] = b"Relationship";
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Loads worksheet relationships as id → part path.
pub(super) fn load_relationships<RS: Read + Seek>(zip: &mut ZipArchive<RS>, path: &str) -> Result<HashMap<String, String>, FormatError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Resolves each style's number format id to a cell type.
pub(super) fn load_number_formats(format_indexes: Vec<String>, custom_formats: HashMap<String, CellType>, is_1904: bool) -> Vec<CellType> {
    format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect()
}

/// Normalizes a relationship target to an archive path under `xl/`.
pub(crate) fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(stripped) = path.strip_prefix('/') {
        stripped.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Rejects files that are compound documents instead of zip archives:
/// encrypted packages and mislabeled legacy workbooks.
pub(super) fn ensure_zip_container<RS: Read + Seek>(reader: &mut RS, file_name: &str) -> Result<(), FormatError> {
    let mut signature = [0u8; 8];
    let size = reader.read(&mut signature)?;
    if size == signature.len() && signature == CFB_SIGNATURE {
        let cfb = Cfb::new(reader)?;
        if cfb.exists("EncryptedPackage") {
            Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?
        }
        Err(SpreadsheetError::UnexpectedFormatError(file_name.to_owned()))?
    }
    reader.seek(SeekFrom::Start(0))?;
    Ok(())
}
