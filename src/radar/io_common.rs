use crate::radar::*;

use std::path::Path;

/// Uploads above this size are refused before decoding.
pub const MAX_INPUT_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Excel,
    Csv,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn check_file_size(path: &str, limit: u64) -> RadarResult<()> {
    let size = fs::metadata(path).context(ReadingInputSnafu { path })?.len();
    debug!("check_file_size: {:?}: {} bytes", path, size);
    ensure!(size <= limit, FileTooLargeSnafu { path, size, limit });
    Ok(())
}

/// The explicit type wins; otherwise the extension decides.
pub fn detect_input_type(path: &str, input_type: Option<&str>) -> RadarResult<InputType> {
    let requested = input_type.map(|s| s.trim().to_lowercase());
    let name = match requested.as_deref() {
        None | Some("") | Some("auto") => Path::new(path)
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default(),
        Some(x) => x.to_string(),
    };
    match name.as_str() {
        "xlsx" | "xlsm" | "xls" | "excel" => Ok(InputType::Excel),
        "csv" | "txt" => Ok(InputType::Csv),
        _ => UnknownInputTypeSnafu {
            input_type: input_type.unwrap_or(name.as_str()),
        }
        .fail(),
    }
}
