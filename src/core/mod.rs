/*!
# Core Module

Core functionality shared by all parsers: error taxonomy, diagnostics
and encoding-aware file reading.
*/

pub mod errors;
pub mod fs_utils;

pub use errors::{
    ContractError, ContractResult, Diagnostic, DiagnosticCollector, DiagnosticKind, ErrorLevel,
};
pub use fs_utils::{decode_text, read_text_file, DecodedText};
