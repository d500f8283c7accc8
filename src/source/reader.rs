//! `FortranReader` - converts physical source lines to logical items.
//!
//! This module handles:
//! - Joining line continuations (trailing `&` in free form, column-6 cards
//!   in fixed form)
//! - Splitting semicolon-separated statements
//! - Separating comments from code
//! - Masking string literals behind placeholders (via [`super::masker`])
//! - Extracting numeric statement labels and `name:` construct prefixes
//! - Lowercasing code (Fortran is case-insensitive; literals keep case)

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;

use super::masker::Masker;
use super::{Dialect, Item, ItemSource, Span};
use crate::error::{FatalError, Result};

/// Maximum number of physical lines allowed in a single logical line.
/// This prevents memory exhaustion from pathological inputs with many
/// continuations.
const MAX_CONTINUATION_LINES: usize = 10_000;

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,5})\s+(\S.*)$").expect("label pattern"));

static CONSTRUCT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z_]\w*)\s*:(.*)$").expect("construct-name pattern"));

/// `FortranReader` reads logical items from a buffered reader.
pub struct FortranReader<R: BufRead> {
    reader: R,
    dialect: Dialect,
    pending: VecDeque<Item>,
    peeked: Option<Option<(usize, String)>>,
    raw_line_no: usize,
}

impl FortranReader<BufReader<File>> {
    pub fn from_file(path: &Path, dialect: Dialect) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), dialect))
    }
}

impl<'a> FortranReader<BufReader<&'a [u8]>> {
    #[must_use]
    pub fn from_source(s: &'a str, dialect: Dialect) -> Self {
        Self::new(BufReader::new(s.as_bytes()), dialect)
    }
}

impl<R: BufRead> FortranReader<R> {
    pub fn new(reader: R, dialect: Dialect) -> Self {
        Self {
            reader,
            dialect,
            pending: VecDeque::new(),
            peeked: None,
            raw_line_no: 0,
        }
    }

    fn read_raw(&mut self) -> Result<Option<(usize, String)>> {
        let mut raw = String::new();
        if self.reader.read_line(&mut raw)? == 0 {
            return Ok(None);
        }
        self.raw_line_no += 1;
        if raw.ends_with('\n') {
            raw.pop();
            if raw.ends_with('\r') {
                raw.pop();
            }
        }
        // Tabs break the fixed-form column rules; expand like most tooling.
        let raw = raw.replace('\t', "        ");
        Ok(Some((self.raw_line_no, raw)))
    }

    fn next_physical(&mut self) -> Result<Option<(usize, String)>> {
        if let Some(p) = self.peeked.take() {
            return Ok(p);
        }
        self.read_raw()
    }

    fn peek_physical(&mut self) -> Result<Option<&(usize, String)>> {
        if self.peeked.is_none() {
            self.peeked = Some(self.read_raw()?);
        }
        Ok(self.peeked.as_ref().and_then(Option::as_ref))
    }

    /// One joined, masked logical line: `(code, explicit label, span,
    /// literal map)`. `None` at end of input.
    fn read_logical(&mut self) -> Result<Option<(String, Option<u32>, Span, Vec<String>)>> {
        if self.dialect.is_fixed() {
            self.read_logical_fixed()
        } else {
            self.read_logical_free()
        }
    }

    fn read_logical_free(&mut self) -> Result<Option<(String, Option<u32>, Span, Vec<String>)>> {
        let mut masker = Masker::new();
        let mut parts: Vec<String> = Vec::new();
        let mut start = 0usize;
        let mut end = 0usize;

        loop {
            let Some((lineno, line)) = self.next_physical()? else {
                if parts.is_empty() {
                    return Ok(None);
                }
                // Unterminated continuation at end of input.
                masker.close_open();
                break;
            };

            if parts.is_empty() {
                let t = line.trim();
                if t.is_empty() || t.starts_with('!') {
                    continue;
                }
                start = lineno;
            }

            let was_in_string = masker.in_string();
            let content = if parts.is_empty() {
                line
            } else if was_in_string {
                masker.resume_continuation(&line, true).to_string()
            } else {
                let t = line.trim_start();
                t.strip_prefix('&').unwrap_or(t).to_string()
            };

            let masked = masker.mask_line(&content, true);
            end = lineno;

            if masked.continues_string {
                parts.push(masked.code);
            } else if masked.code.trim_end().ends_with('&') {
                let code = masked.code.trim_end().trim_end_matches('&').trim_end();
                parts.push(code.to_string());
            } else if !parts.is_empty() && !was_in_string && masked.code.trim().is_empty() {
                // Comment-only line inside a continuation: keep reading for
                // the actual continuation content.
                continue;
            } else {
                parts.push(masked.code);
                break;
            }

            if parts.len() > MAX_CONTINUATION_LINES {
                return Err(FatalError::TooManyContinuations {
                    line: end,
                    max: MAX_CONTINUATION_LINES,
                }
                .into());
            }
        }

        let code = join_parts(&parts);
        Ok(Some((code, None, Span::new(start, end), masker.into_literals())))
    }

    fn read_logical_fixed(&mut self) -> Result<Option<(String, Option<u32>, Span, Vec<String>)>> {
        // Find the initial card.
        let (start, first) = loop {
            let Some((lineno, line)) = self.next_physical()? else {
                return Ok(None);
            };
            if is_fixed_comment(&line) {
                continue;
            }
            break (lineno, line);
        };

        let label = parse_fixed_label(&first);
        let mut masker = Masker::new();
        let mut parts = Vec::new();
        let mut end = start;

        let content = card_content(&first);
        parts.push(masker.mask_line(content, false).code);

        // Pull continuation cards (column 6 nonblank, nonzero). Comment
        // cards between continuations are consumed and dropped.
        loop {
            let Some((_, line)) = self.peek_physical()? else {
                break;
            };
            if is_fixed_comment(line) {
                self.next_physical()?;
                continue;
            }
            if !is_continuation_card(line) {
                break;
            }
            let (lineno, line) = self.next_physical()?.expect("peeked line");
            end = lineno;
            parts.push(masker.mask_line(card_content(&line), false).code);
            if parts.len() > MAX_CONTINUATION_LINES {
                return Err(FatalError::TooManyContinuations {
                    line: end,
                    max: MAX_CONTINUATION_LINES,
                }
                .into());
            }
        }

        masker.close_open();
        // Fixed-form continuations resume mid-token, so the parts are
        // concatenated without an inserted blank.
        let code = parts.concat();
        Ok(Some((code, label, Span::new(start, end), masker.into_literals())))
    }

    /// Split a masked logical line into statement items, extracting labels
    /// and construct names.
    fn queue_items(
        &mut self,
        code: &str,
        fixed_label: Option<u32>,
        span: Span,
        literals: Vec<String>,
    ) {
        let map = Rc::new(literals);
        let lowered = code.to_lowercase();
        let mut first = true;
        for piece in lowered.split(';') {
            let mut text = piece.trim().to_string();
            if text.is_empty() {
                first = false;
                continue;
            }

            let mut label = if first { fixed_label } else { None };
            if label.is_none() {
                let extracted = LABEL_RE
                    .captures(&text)
                    .map(|caps| (caps[1].parse().ok(), caps[2].trim().to_string()));
                if let Some((lab, rest)) = extracted {
                    label = lab;
                    text = rest;
                }
            }

            let mut name = None;
            let named = CONSTRUCT_NAME_RE
                .captures(&text)
                .map(|caps| (caps[1].to_string(), caps[2].trim_start().to_string()));
            if let Some((prefix, rest)) = named {
                if !rest.is_empty() && !rest.starts_with(':') && !rest.starts_with('=') {
                    name = Some(prefix);
                    text = rest;
                }
            }

            let mut item = Item::new(text, span, Rc::clone(&map));
            item.label = label;
            item.name = name;
            self.pending.push_back(item);
            first = false;
        }
    }
}

impl<R: BufRead> ItemSource for FortranReader<R> {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn next_item(&mut self) -> Result<Option<Item>> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Ok(Some(item));
            }
            let Some((code, label, span, literals)) = self.read_logical()? else {
                return Ok(None);
            };
            if code.trim().is_empty() {
                continue;
            }
            self.queue_items(&code, label, span, literals);
        }
    }

    fn push_back(&mut self, item: Item) {
        self.pending.push_front(item);
    }
}

fn join_parts(parts: &[String]) -> String {
    match parts {
        [] => String::new(),
        [one] => one.trim().to_string(),
        [head, tail @ ..] => {
            let mut out = head.trim().to_string();
            for part in tail {
                let part = part.trim();
                if !part.is_empty() {
                    out.push(' ');
                    out.push_str(part);
                }
            }
            out
        }
    }
}

fn is_fixed_comment(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('!') {
        return true;
    }
    matches!(line.chars().next(), Some('c' | 'C' | '*' | 'd' | 'D'))
}

fn is_continuation_card(line: &str) -> bool {
    let chars: Vec<char> = line.chars().take(6).collect();
    if chars.len() < 6 {
        return false;
    }
    chars[..5].iter().all(|c| c.is_whitespace()) && !chars[5].is_whitespace() && chars[5] != '0'
}

fn parse_fixed_label(line: &str) -> Option<u32> {
    let field: String = line
        .chars()
        .take(5)
        .filter(|c| !c.is_whitespace())
        .collect();
    if field.is_empty() {
        None
    } else {
        field.parse().ok()
    }
}

fn card_content(line: &str) -> &str {
    let mut indices = line.char_indices().skip(6);
    match indices.next() {
        Some((i, _)) => &line[i..],
        None => "",
    }
}
