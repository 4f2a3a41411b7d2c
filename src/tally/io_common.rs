use std::path::Path;

use crate::tally::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Blt,
    Csv,
    SurveyMonkey,
    Xlsx,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

pub fn parse_input_type(input_type: &str) -> MwResult<InputType> {
    match input_type.to_lowercase().as_str() {
        "blt" => Ok(InputType::Blt),
        "csv" => Ok(InputType::Csv),
        "surveymonkey" => Ok(InputType::SurveyMonkey),
        "xlsx" | "excel" => Ok(InputType::Xlsx),
        _ => UnknownInputTypeSnafu { input_type }.fail(),
    }
}

/// The input type from the extension of the file, `csv` by default.
pub fn infer_input_type(path: &str) -> InputType {
    let ext = Path::new(path)
        .extension()
        .map(|s| s.to_string_lossy().to_lowercase());
    match ext.as_deref() {
        Some("blt") => InputType::Blt,
        Some("xlsx") => InputType::Xlsx,
        _ => InputType::Csv,
    }
}
