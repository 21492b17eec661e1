//! Output-side types: the imported table and the range used to cut it from a sheet.
pub mod range;
pub mod table;
