use std::io::{Cursor, Read};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use zip::ZipArchive;

use super::{DocumentKind, ExtractError};

const DOCUMENT_PART: &str = "word/document.xml";

/// WordprocessingML elements that affect plain text
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"<(/?)(w:p|w:r|w:t|w:tab|w:br|w:cr|w:txbxContent|mc:Fallback)(?:\s[^>]*?)?(/?)>",
    )
    .expect("valid regex")
});

/// Subtrees that are not part of the body text flow. Text boxes are skipped
/// the way body-paragraph readers skip them; `mc:Fallback` repeats `mc:Choice`.
const SKIPPED_SUBTREES: [&str; 2] = ["w:txbxContent", "mc:Fallback"];

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|lt|gt|amp|quot|apos);").expect("valid regex")
});

/// Extract paragraph text from a `.docx` archive, one line per paragraph
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::parse(DocumentKind::Word, e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractError::parse(DocumentKind::Word, format!("{}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::parse(DocumentKind::Word, e.to_string()))?;

    Ok(extract_plaintext_from_document_xml(&xml).join("\n"))
}

/// Walk the document body and collect the text of every paragraph.
///
/// Open paragraphs are kept on a stack, so a nested paragraph never discards
/// the text of the one around it.
fn extract_plaintext_from_document_xml(xml: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut skip_depth = 0usize;
    let mut in_run = false;
    let mut in_text = false;
    let mut cursor = 0;

    for caps in TAG_RE.captures_iter(xml) {
        let Some(tag) = caps.get(0) else { continue };

        if in_text
            && skip_depth == 0
            && let Some(paragraph) = open.last_mut()
        {
            paragraph.push_str(&decode_entities(&xml[cursor..tag.start()]));
        }
        cursor = tag.end();

        let name = &caps[2];
        let closing = !caps[1].is_empty();
        let self_closing = !caps[3].is_empty();

        if SKIPPED_SUBTREES.iter().any(|skipped| *skipped == name) {
            match (closing, self_closing) {
                (false, false) => skip_depth += 1,
                (true, _) => skip_depth = skip_depth.saturating_sub(1),
                (false, true) => {}
            }
            continue;
        }
        if skip_depth > 0 {
            continue;
        }

        match (name, closing, self_closing) {
            ("w:p", false, true) => paragraphs.push(String::new()),
            ("w:p", false, false) => open.push(String::new()),
            ("w:p", true, _) => {
                if let Some(paragraph) = open.pop() {
                    paragraphs.push(paragraph);
                }
                in_text = false;
                if open.is_empty() {
                    in_run = false;
                }
            }
            ("w:r", false, false) => in_run = true,
            ("w:r", true, _) => in_run = false,
            ("w:t", false, false) => in_text = true,
            ("w:t", true, _) => in_text = false,
            (name, false, _) if in_run => {
                if let Some(paragraph) = open.last_mut() {
                    match name {
                        "w:tab" => paragraph.push('\t'),
                        "w:br" | "w:cr" => paragraph.push('\n'),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    paragraphs
}

fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(|dec| dec.parse::<u32>()))
                    .and_then(|code| code.ok())
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
