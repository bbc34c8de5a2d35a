//! Translation of glob patterns into anchored regular expressions.
//!
//! - `*` matches zero or more characters within one path segment
//! - `**` matches zero or more characters across segments, and `**/` may
//!   also match no directory at all
//! - `?` matches exactly one character other than `/`
//! - `[abc]`, `[a-z]`, `[!abc]` / `[^abc]` character classes (never `/`)
//! - `{a,b,c}` alternatives
//! - `\x` matches `x` literally

/// A glob pattern that can't be translated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid glob pattern \"{pattern}\" at offset {offset}: {reason}")]
pub struct GlobError {
    /// The pattern being translated.
    pub pattern: String,
    /// Byte offset of the offending character.
    pub offset: usize,
    /// What went wrong.
    pub reason: &'static str,
}

impl GlobError {
    fn new(pattern: &str, offset: usize, reason: &'static str) -> Self {
        GlobError {
            pattern: pattern.to_string(),
            offset,
            reason,
        }
    }
}

/// Translate `glob` into an equivalent regular expression anchored at both
/// ends of the input.
///
/// ```
/// let re = module_fs::glob::glob_to_regex("*.txt").unwrap();
/// assert_eq!(re, r"^[^/]*\.txt$");
/// ```
pub fn glob_to_regex(glob: &str) -> Result<String, GlobError> {
    let chars: Vec<(usize, char)> = glob.char_indices().collect();
    let mut regex = String::with_capacity(glob.len() * 2 + 2);
    let mut group_start = None;
    let mut i = 0;

    regex.push('^');

    while let Some(&(offset, c)) = chars.get(i) {
        i += 1;
        match c {
            '\\' => {
                let &(_, escaped) = chars
                    .get(i)
                    .ok_or_else(|| GlobError::new(glob, offset, "trailing escape"))?;
                i += 1;
                push_literal(&mut regex, escaped);
            }
            '*' => {
                if peek(&chars, i) == Some('*') {
                    i += 1;
                    if peek(&chars, i) == Some('/') {
                        i += 1;
                        regex.push_str("(?:.*/)?");
                    } else {
                        regex.push_str(".*");
                    }
                } else {
                    regex.push_str("[^/]*");
                }
            }
            '?' => regex.push_str("[^/]"),
            '[' => i = translate_class(glob, &chars, i, offset, &mut regex)?,
            '{' => {
                if group_start.is_some() {
                    return Err(GlobError::new(glob, offset, "nested group"));
                }
                group_start = Some(offset);
                regex.push_str("(?:");
            }
            '}' if group_start.is_some() => {
                group_start = None;
                regex.push(')');
            }
            ',' if group_start.is_some() => regex.push('|'),
            other => push_literal(&mut regex, other),
        }
    }

    if let Some(offset) = group_start {
        return Err(GlobError::new(glob, offset, "unterminated group"));
    }

    regex.push('$');
    Ok(regex)
}

fn peek(chars: &[(usize, char)], i: usize) -> Option<char> {
    chars.get(i).map(|&(_, c)| c)
}

fn push_literal(regex: &mut String, c: char) {
    let mut buf = [0u8; 4];
    regex.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

/// Translate the class starting right after the `[` at `open`, returning the
/// index just past the closing `]`.
///
/// The class is emitted intersected with `[^/]`, so ranges such as `[+-0]`
/// can't match the separator either.
fn translate_class(
    glob: &str,
    chars: &[(usize, char)],
    mut i: usize,
    open: usize,
    regex: &mut String,
) -> Result<usize, GlobError> {
    regex.push_str("[[");

    if matches!(peek(chars, i), Some('!' | '^')) {
        i += 1;
        regex.push('^');
    }
    if peek(chars, i) == Some(']') {
        i += 1;
        regex.push_str("\\]");
    }

    loop {
        let &(offset, c) = chars
            .get(i)
            .ok_or_else(|| GlobError::new(glob, open, "unterminated character class"))?;
        i += 1;
        match c {
            ']' => {
                regex.push_str("]&&[^/]]");
                return Ok(i);
            }
            '/' => {
                return Err(GlobError::new(
                    glob,
                    offset,
                    "separator in character class",
                ));
            }
            '\\' => {
                let &(_, escaped) = chars
                    .get(i)
                    .ok_or_else(|| GlobError::new(glob, offset, "trailing escape"))?;
                i += 1;
                push_literal(regex, escaped);
            }
            '[' | '&' | '~' | '^' => {
                regex.push('\\');
                regex.push(c);
            }
            other => regex.push(other),
        }
    }
}
