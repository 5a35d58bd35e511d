//! Response Cleaner
//!
//! Normalizes refiner output that arrives wrapped in markdown code fences
//! or preceded by conversational preamble.
//!
//! One pass applies, in order:
//! 1. Drop every line that opens with a code fence (three backticks plus an
//!    optional language tag).
//! 2. Drop a closing fence left at the end of any line.
//! 3. Discard everything before the first structural heading line.
//! 4. Trim surrounding whitespace.
//!
//! Passes repeat until the text stops changing, so the result is always a
//! fixed point and `clean_response(clean_response(x)) == clean_response(x)`.

const FENCE: &str = "```";

/// Line prefixes that mark the start of the structured answer
const HEADING_MARKERS: &[&str] = &["#", "**", "Project Title:", "Role:"];

/// Strip code fences and preamble, returning text from the first heading on
pub fn clean_response(text: &str) -> String {
    let mut current = clean_pass(text);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_pass(text: &str) -> String {
    let lines: Vec<&str> = text
        .lines()
        .filter(|line| !line.starts_with(FENCE))
        .map(|line| line.strip_suffix(FENCE).unwrap_or(line))
        .collect();

    let start = lines
        .iter()
        .position(|line| is_heading(line))
        .unwrap_or(0);

    lines[start..].join("\n").trim().to_string()
}

fn is_heading(line: &str) -> bool {
    HEADING_MARKERS
        .iter()
        .any(|marker| line.starts_with(marker))
}
