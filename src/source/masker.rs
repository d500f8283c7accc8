//! String and comment masking for source lines.
//!
//! The masker walks one physical line at a time, maintaining string state
//! across lines so that continued literals are handled correctly. String
//! literals are replaced in the code stream with word-shaped placeholders
//! (`__str_N__`) and collected into a per-item map; trailing `!` comments
//! outside strings are split off. Doubled quotes inside a literal
//! (`'it''s'`) are part of the literal.

/// Result of masking one physical line.
#[derive(Debug)]
pub struct MaskedLine {
    /// Code with literals replaced by placeholders and the comment removed.
    pub code: String,
    /// The trailing `!` comment, if any.
    pub comment: Option<String>,
    /// True when the line ended inside a string whose last character was a
    /// free-form `&`: the literal continues on the next line.
    pub continues_string: bool,
}

/// Stateful masker for one logical line's worth of physical lines.
#[derive(Debug, Default)]
pub struct Masker {
    /// Open string delimiter and the literal index it is accumulating into.
    open: Option<(char, usize)>,
    literals: Vec<String>,
}

impl Masker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn in_string(&self) -> bool {
        self.open.is_some()
    }

    /// The collected literal map, consuming the masker.
    #[must_use]
    pub fn into_literals(self) -> Vec<String> {
        self.literals
    }

    /// Mask one physical line. `free_form` enables `&` string-continuation
    /// handling; fixed-form continuation cards resume an open literal
    /// directly.
    pub fn mask_line(&mut self, line: &str, free_form: bool) -> MaskedLine {
        let mut code = String::with_capacity(line.len());
        let mut comment = None;
        let mut chars = line.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            if let Some((delim, idx)) = self.open {
                if c == delim {
                    // Doubled delimiter stays inside the literal.
                    if chars.peek().map(|&(_, n)| n) == Some(delim) {
                        chars.next();
                        self.literals[idx].push(delim);
                        self.literals[idx].push(delim);
                    } else {
                        self.literals[idx].push(delim);
                        self.open = None;
                    }
                } else {
                    self.literals[idx].push(c);
                }
                continue;
            }

            match c {
                '!' => {
                    comment = Some(line[pos..].to_string());
                    break;
                }
                '\'' | '"' => {
                    let idx = self.literals.len();
                    self.literals.push(String::from(c));
                    code.push_str(&format!("__str_{idx}__"));
                    self.open = Some((c, idx));
                }
                _ => code.push(c),
            }
        }

        // A free-form literal ending in `&` at end of line continues on the
        // next line; the ampersand itself is not part of the literal.
        let mut continues_string = false;
        if free_form {
            if let Some((_, idx)) = self.open {
                let lit = &mut self.literals[idx];
                if lit.ends_with('&') {
                    lit.pop();
                    continues_string = true;
                }
            }
        }

        MaskedLine {
            code,
            comment,
            continues_string,
        }
    }

    /// Resume an open literal on a continuation line. In free form the
    /// leading `&` (after indentation) belongs to the continuation marker,
    /// not the literal.
    pub fn resume_continuation<'l>(&self, line: &'l str, free_form: bool) -> &'l str {
        if free_form && self.in_string() {
            let trimmed = line.trim_start();
            if let Some(rest) = trimmed.strip_prefix('&') {
                return rest;
            }
            return trimmed;
        }
        line
    }

    /// Close an unterminated literal at end of input (best effort: the
    /// partial literal stays in the map, code already holds its
    /// placeholder).
    pub fn close_open(&mut self) {
        self.open = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_strings() {
        let mut m = Masker::new();
        let r = m.mask_line("x = 5 + y", true);
        assert_eq!(r.code, "x = 5 + y");
        assert!(r.comment.is_none());
        assert!(m.into_literals().is_empty());
    }

    #[test]
    fn test_masks_single_and_double() {
        let mut m = Masker::new();
        let r = m.mask_line(r#"call f('a', "b")"#, true);
        assert_eq!(r.code, "call f(__str_0__, __str_1__)");
        assert_eq!(m.into_literals(), vec!["'a'", "\"b\""]);
    }

    #[test]
    fn test_doubled_quote() {
        let mut m = Masker::new();
        let r = m.mask_line("s = 'it''s'", true);
        assert_eq!(r.code, "s = __str_0__");
        assert_eq!(m.into_literals(), vec!["'it''s'"]);
    }

    #[test]
    fn test_comment_split() {
        let mut m = Masker::new();
        let r = m.mask_line("x = 1 ! set x", true);
        assert_eq!(r.code, "x = 1 ");
        assert_eq!(r.comment.as_deref(), Some("! set x"));
    }

    #[test]
    fn test_bang_inside_string_is_not_comment() {
        let mut m = Masker::new();
        let r = m.mask_line("s = 'a!b' ! real comment", true);
        assert_eq!(r.code, "s = __str_0__ ");
        assert_eq!(r.comment.as_deref(), Some("! real comment"));
        assert_eq!(m.into_literals(), vec!["'a!b'"]);
    }

    #[test]
    fn test_string_continuation() {
        let mut m = Masker::new();
        let r1 = m.mask_line("s = 'abc&", true);
        assert!(r1.continues_string);
        assert!(m.in_string());
        let rest = m.resume_continuation("  &def'", true).to_string();
        let r2 = m.mask_line(&rest, true);
        assert!(!r2.continues_string);
        assert!(!m.in_string());
        assert_eq!(m.into_literals(), vec!["'abcdef'"]);
    }

    #[test]
    fn test_fixed_form_literal_across_cards() {
        let mut m = Masker::new();
        let r1 = m.mask_line("data c /'ab", false);
        assert!(m.in_string());
        assert_eq!(r1.code, "data c /__str_0__");
        m.mask_line("cd'/", false);
        assert!(!m.in_string());
        assert_eq!(m.into_literals(), vec!["'abcd'"]);
    }
}
