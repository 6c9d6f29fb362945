//! WASM bindings for in-browser previews.
//!
//! Structured results cross the boundary as JSON strings.

use wasm_bindgen::prelude::*;

use crate::align::{AlignOptions, Occurrence, QuoteSpec};
use crate::html::Section;
use crate::scripture::{ParsedBook, RawBook, SourceFormat, normalize};

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn options(delimiter: Option<String>) -> AlignOptions {
    match delimiter {
        Some(delimiter) => AlignOptions { delimiter },
        None => AlignOptions::default(),
    }
}

fn parse(usfm: &str) -> ParsedBook {
    normalize(RawBook::Text(usfm), SourceFormat::Usfm)
}

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Parse USFM and return the book as JSON.
#[wasm_bindgen]
pub fn normalize_usfm(usfm: &str) -> Result<String, JsValue> {
    serde_json::to_string(&parse(usfm)).map_err(js_error)
}

/// Gateway quote for an origin-language quote; empty when it cannot be aligned.
#[wasm_bindgen]
pub fn align_quote(
    quote: &str,
    reference: &str,
    occurrence: i32,
    origin_usfm: &str,
    target_usfm: &str,
    delimiter: Option<String>,
) -> String {
    let spec = QuoteSpec::new(quote, reference, Occurrence::parse(&occurrence.to_string()));
    crate::align::align_quote(&spec, &parse(origin_usfm), &parse(target_usfm), &options(delimiter))
}

/// Pivot and annotate a TSV resource; returns chapter → verse → rows as JSON.
#[wasm_bindgen]
pub fn pivot_tsv(
    tsv: &str,
    origin_usfm: Option<String>,
    target_usfms: Vec<String>,
    delimiter: Option<String>,
) -> Result<String, JsValue> {
    let origin = origin_usfm.as_deref().map(parse);
    let targets: Vec<ParsedBook> = target_usfms.iter().map(|u| parse(u)).collect();
    let pivot = crate::tsv::pivot_tsv(tsv, origin.as_ref(), &targets, &options(delimiter)).map_err(js_error)?;
    serde_json::to_string(&pivot).map_err(js_error)
}

/// Flatten a JSON array of manual trees into HTML.
#[wasm_bindgen]
pub fn assemble_html(manuals_json: &str) -> Result<String, JsValue> {
    let manuals: Vec<Section> = serde_json::from_str(manuals_json).map_err(js_error)?;
    Ok(crate::html::assemble_html(&manuals))
}
