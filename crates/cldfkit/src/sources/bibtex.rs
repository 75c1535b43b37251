//! BibTeX reading and writing.

use std::fs;
use std::path::Path;

use crate::error::{CldfError, Result};

use super::Source;

/// Entry types that carry no bibliography entry.
const NON_ENTRIES: &[&str] = &["comment", "preamble", "string"];

/// Parse a BibTeX file.
pub fn parse_bibtex_file(path: impl AsRef<Path>) -> Result<Vec<Source>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| CldfError::io(path, e))?;
    parse_bibtex(&text)
}

/// Parse BibTeX text into entries, in file order.
///
/// Text outside `@type{...}` blocks is ignored. `@comment`, `@preamble` and
/// `@string` blocks are skipped; string macros are kept as bare words.
pub fn parse_bibtex(text: &str) -> Result<Vec<Source>> {
    let mut cursor = Cursor::new(text);
    let mut sources = Vec::new();

    while cursor.skip_past('@') {
        let genre = cursor
            .take_while(|c| c.is_alphanumeric() || c == '_' || c == '-')
            .to_lowercase();
        if genre.is_empty() {
            return Err(cursor.error("expected entry type after '@'"));
        }
        cursor.skip_whitespace();
        let close = match cursor.next() {
            Some('{') => '}',
            Some('(') => ')',
            _ => return Err(cursor.error(format!("expected '{{' after @{}", genre))),
        };

        if NON_ENTRIES.contains(&genre.as_str()) {
            cursor.skip_block(close)?;
            continue;
        }

        cursor.skip_whitespace();
        let key = cursor.take_while(|c| c != ',' && c != close && !c.is_whitespace());
        if key.is_empty() {
            return Err(cursor.error(format!("@{} entry without a citation key", genre)));
        }
        let mut source = Source::new(genre, key);

        loop {
            cursor.skip_whitespace();
            match cursor.peek() {
                Some(',') => {
                    cursor.next();
                }
                Some(c) if c == close => {
                    cursor.next();
                    break;
                }
                Some(_) => {
                    let (name, value) = cursor.field(close)?;
                    source.fields.insert(name, value);
                }
                None => {
                    return Err(cursor.error(format!("unterminated entry '{}'", source.key)));
                }
            }
        }
        sources.push(source);
    }

    Ok(sources)
}

/// Serialize entries as BibTeX.
pub fn to_bibtex(sources: &[Source]) -> String {
    sources
        .iter()
        .map(Source::to_bibtex)
        .collect::<Vec<_>>()
        .join("\n")
}

impl Source {
    /// This entry in BibTeX form.
    pub fn to_bibtex(&self) -> String {
        let mut out = format!("@{}{{{}", self.genre, self.key);
        for (name, value) in &self.fields {
            out.push_str(&format!(",\n    {} = {{{}}}", name, value));
        }
        out.push_str("\n}\n");
        out
    }
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn line(&self) -> usize {
        1 + self.chars[..self.pos.min(self.chars.len())]
            .iter()
            .filter(|&&c| c == '\n')
            .count()
    }

    fn error(&self, message: impl Into<String>) -> CldfError {
        CldfError::Bibliography {
            line: self.line(),
            message: message.into(),
        }
    }

    /// Advance past the next occurrence of `target`; false at end of input.
    fn skip_past(&mut self, target: char) -> bool {
        while let Some(c) = self.next() {
            if c == target {
                return true;
            }
        }
        false
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&keep) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Skip the rest of a block opened just before the cursor.
    fn skip_block(&mut self, close: char) -> Result<()> {
        let open = if close == ')' { '(' } else { '{' };
        let mut depth = 0usize;
        while let Some(c) = self.next() {
            if c == open {
                depth += 1;
            } else if c == close {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
        }
        Err(self.error("unterminated block"))
    }

    /// `name = value`, with the value possibly concatenated with `#`.
    fn field(&mut self, close: char) -> Result<(String, String)> {
        let name = self
            .take_while(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.'))
            .to_lowercase();
        if name.is_empty() {
            return Err(self.error("expected field name"));
        }
        self.skip_whitespace();
        if self.next() != Some('=') {
            return Err(self.error(format!("expected '=' after field '{}'", name)));
        }

        let mut value = String::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('{') => {
                    self.next();
                    value.push_str(&self.delimited(None)?);
                }
                Some('"') => {
                    self.next();
                    value.push_str(&self.delimited(Some('"'))?);
                }
                Some(_) => {
                    let bare = self.take_while(|c| {
                        c != ',' && c != close && c != '#' && !c.is_whitespace()
                    });
                    if bare.is_empty() {
                        return Err(self.error(format!("missing value for field '{}'", name)));
                    }
                    value.push_str(&bare);
                }
                None => return Err(self.error(format!("missing value for field '{}'", name))),
            }
            self.skip_whitespace();
            if self.peek() == Some('#') {
                self.next();
            } else {
                break;
            }
        }

        let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok((name, value))
    }

    /// Read up to the closing brace (`quote: None`) or closing quote, keeping
    /// nested braces.
    fn delimited(&mut self, quote: Option<char>) -> Result<String> {
        let start_line = self.line();
        let mut depth = 0usize;
        let mut out = String::new();
        while let Some(c) = self.next() {
            match c {
                '{' => {
                    depth += 1;
                    out.push(c);
                }
                '}' if depth == 0 && quote.is_none() => return Ok(out),
                '}' => {
                    depth = depth.saturating_sub(1);
                    out.push(c);
                }
                '"' if depth == 0 && quote == Some('"') => return Ok(out),
                '\\' => {
                    out.push(c);
                    if let Some(escaped) = self.next() {
                        out.push(escaped);
                    }
                }
                _ => out.push(c),
            }
        }
        Err(CldfError::Bibliography {
            line: start_line,
            message: "unterminated field value".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
This preamble text is ignored.

@comment{ anything { nested } here }

@Book{meier2005,
    author = {Meier, Anna and {van} Dijk, Jan},
    title = "A grammar of {Ikpeng}",
    year = 2005,
    publisher = {Some
                 Press}
}

@article(smith1999,
  title = {Tones} # " and " # {stress},
)
"#;

    #[test]
    fn test_parse_entries() {
        let sources = parse_bibtex(SAMPLE).unwrap();
        assert_eq!(sources.len(), 2);

        let meier = &sources[0];
        assert_eq!(meier.key, "meier2005");
        assert_eq!(meier.genre, "book");
        assert_eq!(meier.field("author"), Some("Meier, Anna and {van} Dijk, Jan"));
        assert_eq!(meier.field("title"), Some("A grammar of {Ikpeng}"));
        assert_eq!(meier.field("year"), Some("2005"));
        assert_eq!(meier.field("publisher"), Some("Some Press"));

        let smith = &sources[1];
        assert_eq!(smith.genre, "article");
        assert_eq!(smith.field("title"), Some("Tones and stress"));
    }

    #[test]
    fn test_serialize_and_parse_again() {
        let sources = parse_bibtex(SAMPLE).unwrap();
        let text = to_bibtex(&sources);
        assert!(text.starts_with("@book{meier2005,\n"));
        assert_eq!(parse_bibtex(&text).unwrap(), sources);
    }

    #[test]
    fn test_unterminated_entry() {
        let err = parse_bibtex("@book{key,\n title = {Open").unwrap_err();
        assert!(matches!(err, CldfError::Bibliography { line: 2, .. }));
    }

    #[test]
    fn test_missing_key() {
        assert!(parse_bibtex("@book{, title = {x}}").is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_bibtex("").unwrap().is_empty());
        assert!(parse_bibtex("no entries at all").unwrap().is_empty());
    }
}
