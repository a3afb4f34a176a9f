//! Text normalization and paragraph-aware chunking.
//!
//! Both functions are pure: the pipeline feeds `normalize` the raw text the
//! fetcher extracted, then hands the result to `chunk` before persisting.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default chunk budget, in whitespace-delimited words.
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// One bounded slice of a document's text.
///
/// `chunk_number` is 1-based and contiguous within a document; the store
/// upserts on `(legislation_id, chunk_number)`, so renumbering between runs
/// would silently orphan rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_number: u32,
    pub text: String,
}

fn excess_newlines() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("static regex"))
}

fn page_markers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Page \d+ of \d+").expect("static regex"))
}

fn copyright_banners() -> &'static Regex {
    // The portal serves the copyright sign both correctly and as the
    // latin-1 mojibake "Â©".
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Â?© Crown Copyright \d+").expect("static regex"))
}

/// Strips print artifacts and collapses whitespace.
///
/// Runs of three or more newlines become a paragraph separator, `Page N of
/// M` markers and Crown-copyright banners are deleted, and every remaining
/// whitespace run (newlines included) collapses to a single space. Empty
/// input yields an empty string.
pub fn normalize(raw: &str) -> String {
    let text = excess_newlines().replace_all(raw, "\n\n");
    let text = page_markers().replace_all(&text, "");
    let text = copyright_banners().replace_all(&text, "");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits `text` into word-bounded, paragraph-atomic chunks.
///
/// Paragraphs (separated by blank lines) are packed greedily: a paragraph
/// that would push the running word count past `max_length` flushes the
/// accumulated chunk first. A single paragraph longer than `max_length` is
/// never split; it occupies a chunk by itself. Chunk numbers start at 1 and
/// are contiguous in text order.
pub fn chunk(text: &str, max_length: usize) -> Vec<Chunk> {
    let paragraphs: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for para in paragraphs {
        let para_len = para.split_whitespace().count();

        if current_len + para_len > max_length && !current.is_empty() {
            chunks.push(Chunk {
                chunk_number: chunks.len() as u32 + 1,
                text: current.join(" "),
            });
            current.clear();
            current_len = 0;
        }

        current.push(para);
        current_len += para_len;
    }

    if !current.is_empty() {
        chunks.push(Chunk {
            chunk_number: chunks.len() as u32 + 1,
            text: current.join(" "),
        });
    }

    chunks
}
