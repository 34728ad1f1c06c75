use anyhow::{Context, Result};
use log::{debug, info};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::record::Reading;

/// `sample/total ... Valor ADC: <adc> | Voltaje: <volts> V`, anywhere in the line.
///
/// The leading `(?:^|\D)` keeps the sample counter from starting in the middle
/// of a longer number, including one written with non-ASCII digits. Captured
/// integers are ASCII only so that every match parses. Anything may sit between
/// the counter and the ADC label, which is how prefixes like `stra 28/30` (a
/// typo on the rig) still match.
static READING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|\D)([0-9]+)\s*/\s*([0-9]+).*?Valor\s*ADC:\s*([0-9]+)\s*\|\s*Voltaje:\s*([0-9]+(?:[.,][0-9]+)?)\s*V",
    )
    .expect("reading pattern compiles")
});

/// Lines of a log, split at every boundary a serial capture may use.
///
/// Breaks on `\n`, `\r\n`, a bare `\r`, `\x0b`, `\x0c`, `\x1c`..=`\x1e`, `\u{85}`,
/// `\u{2028}` and `\u{2029}`. A trailing break does not start an empty line.
pub struct LogLines<'a> {
    rest: &'a str,
}

impl<'a> Iterator for LogLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        match self.rest.char_indices().find(|&(_, c)| is_line_break(c)) {
            Some((idx, c)) => {
                let line = &self.rest[..idx];
                let mut end = idx + c.len_utf8();
                if c == '\r' && self.rest[end..].starts_with('\n') {
                    end += 1;
                }
                self.rest = &self.rest[end..];
                Some(line)
            }
            None => Some(std::mem::take(&mut self.rest)),
        }
    }
}

pub fn split_lines(text: &str) -> LogLines<'_> {
    LogLines { rest: text }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c'..='\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Line-level outcome of scanning a whole log.
#[derive(Debug, Clone, Default)]
pub struct LogScan {
    /// Readings in file order
    pub readings: Vec<Reading>,
    pub total_lines: usize,
    pub blank_lines: usize,
    /// Non-blank lines that did not carry a reading
    pub unmatched_lines: usize,
}

/// Pull a reading out of a single line, or `None` if the line carries none.
pub fn extract_reading(line: &str) -> Option<Reading> {
    let caps = READING_PATTERN.captures(line)?;
    let sample_no = caps[1].parse().ok()?;
    let total_in_stage = caps[2].parse().ok()?;
    let adc = caps[3].parse().ok()?;
    let voltage = parse_decimal(&caps[4])?;
    Some(Reading {
        sample_no,
        total_in_stage,
        adc,
        voltage,
    })
}

/// Lazily extract readings from lines, skipping lines without one.
pub fn extract_readings<'a, I>(lines: I) -> impl Iterator<Item = Reading> + 'a
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: 'a,
{
    lines.into_iter().filter_map(extract_reading)
}

/// Scan a full log, keeping count of the lines that were skipped.
pub fn scan_log(text: &str) -> LogScan {
    let mut scan = LogScan::default();
    for (idx, line) in split_lines(text).enumerate() {
        scan.total_lines += 1;
        if line.trim().is_empty() {
            scan.blank_lines += 1;
            continue;
        }
        match extract_reading(line) {
            Some(reading) => scan.readings.push(reading),
            None => {
                scan.unmatched_lines += 1;
                debug!("line {} has no reading: {}", idx + 1, line.trim());
            }
        }
    }
    info!(
        "extracted {} reading(s) from {} line(s); {} non-blank line(s) skipped",
        scan.readings.len(),
        scan.total_lines,
        scan.unmatched_lines
    );
    scan
}

/// Decode bytes as UTF-8, dropping invalid sequences instead of failing.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// Read a log file from disk with lenient decoding.
pub fn read_log(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(decode_lossy(&bytes))
}

fn parse_decimal(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse().ok()
}
