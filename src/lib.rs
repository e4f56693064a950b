pub mod error;
pub mod metric;
pub mod parse;
pub mod plot;
pub mod policy;
pub mod report;
pub mod run;
pub mod summary;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
use wasm_bindgen::prelude::*;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
#[wasm_bindgen]
pub fn summarize_log(log: &str) -> String {
    use run::parse_log;
    use summary::format_summary;

    match parse_log(log.as_bytes()) {
        Ok(reports) => format_summary("log", &reports),
        Err(e) => e.to_string(),
    }
}
