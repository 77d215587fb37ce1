//! Parsing of the `.index` sidecar published next to every forecast file.
//!
//! Each line of an index is a JSON object describing one GRIB message of the forecast file,
//! including its byte offset and length. This lets the client download only the messages it
//! needs with HTTP range requests.

use crate::retrieve::error::RetrieveError;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub(crate) struct IndexEntry {
    pub param: String,
    #[serde(rename = "type")]
    pub product_type: String,
    #[serde(default)]
    pub step: Option<String>,
    #[serde(rename = "_offset")]
    pub offset: u64,
    #[serde(rename = "_length")]
    pub length: u64,
}

/// A contiguous span of bytes in a remote file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

impl ByteRange {
    fn end(&self) -> u64 {
        self.offset + self.length
    }

    /// Value for an HTTP `Range` header. The end position is inclusive.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.offset, self.end() - 1)
    }
}

pub(crate) fn parse_index(text: &str, url: &str) -> Result<Vec<IndexEntry>, RetrieveError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<IndexEntry>(line).map_err(|e| RetrieveError::IndexParse {
                url: url.to_string(),
                line: idx + 1,
                source: e,
            })
        })
        .collect()
}

pub(crate) fn is_selected(entry: &IndexEntry, params: &[String], product_type: &str) -> bool {
    entry.length > 0 && entry.product_type == product_type && params.contains(&entry.param)
}

/// Picks the messages matching `params` and `product_type`, merging neighbouring messages
/// into a single range so they can be fetched with one request. Empty messages are dropped.
pub(crate) fn select_ranges(
    entries: &[IndexEntry],
    params: &[String],
    product_type: &str,
) -> Vec<ByteRange> {
    let mut ranges: Vec<ByteRange> = entries
        .iter()
        .filter(|e| is_selected(e, params, product_type))
        .map(|e| ByteRange {
            offset: e.offset,
            length: e.length,
        })
        .collect();
    ranges.sort();

    let mut merged: Vec<ByteRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if last.end() >= range.offset => {
                let end = last.end().max(range.end());
                last.length = end - last.offset;
            }
            _ => merged.push(range),
        }
    }
    merged
}
