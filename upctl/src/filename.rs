//! Naming of processed files offered for download.

/// Suffix inserted between the base name and the extension.
pub const PROCESSED_SUFFIX: &str = "_processed";

/// Derive the suggested download name for a processed file.
///
/// The original name is split at its last dot: `report.final.csv` becomes
/// `report.final_processed.csv`. A name without a dot gets the suffix and no extension.
pub fn processed_filename(original: &str) -> String {
    match original.rfind('.') {
        Some(idx) => {
            let (base, ext) = original.split_at(idx);
            format!("{base}{PROCESSED_SUFFIX}{ext}")
        }
        None => format!("{original}{PROCESSED_SUFFIX}"),
    }
}
