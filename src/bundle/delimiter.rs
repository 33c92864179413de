use std::fmt::{self, Write as _};

/**
    A pair of Luau long bracket markers of a given level.

    Level `0` is `[[` / `]]`, level `2` is `[==[` / `]==]`, and so on.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongBracket {
    level: usize,
}

impl LongBracket {
    pub fn new(level: usize) -> Self {
        Self { level }
    }

    /**
        Selects the narrowest long bracket that can embed the given text verbatim.

        Neither marker may appear anywhere in the text, and the close marker
        may also not be formed by the end of the text joined with the close
        marker itself - text ending in `]` would otherwise close a level `0`
        bracket one character early.
    */
    pub fn select(text: &str) -> Self {
        let mut level = 0;
        loop {
            let bracket = Self::new(level);
            if bracket.fits(text) {
                return bracket;
            }
            level += 1;
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn open(&self) -> String {
        format!("[{}[", "=".repeat(self.level))
    }

    pub fn close(&self) -> String {
        format!("]{}]", "=".repeat(self.level))
    }

    fn fits(&self, text: &str) -> bool {
        let open = self.open();
        let close = self.close();
        if text.contains(&open) || text.contains(&close) {
            return false;
        }
        let terminated = format!("{text}{close}");
        terminated.find(&close) == Some(text.len())
    }
}

/**
    The form a module's source text takes inside the artifact.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedText<'a> {
    /// Empty text, emitted as `""` instead of an empty long bracket.
    Empty,
    /// Text embedded verbatim between long bracket markers.
    LongBracket(&'a str, LongBracket),
    /// Text the Luau lexer would alter or reject inside a long bracket, emitted escaped.
    Quoted(&'a str),
}

impl<'a> EmbeddedText<'a> {
    pub fn encode(text: &'a str) -> Self {
        if text.is_empty() {
            Self::Empty
        } else if text.contains(['\r', '\0']) {
            // Long brackets normalize line endings and can't hold a NUL byte
            Self::Quoted(text)
        } else {
            Self::LongBracket(text, LongBracket::select(text))
        }
    }
}

impl fmt::Display for EmbeddedText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("\"\""),
            Self::Quoted(text) => f.write_str(&quote_string(text)),
            // NOTE: The lexer skips a newline directly after the open marker,
            // so the text always starts on its own line and is kept as-is
            Self::LongBracket(text, bracket) => {
                write!(f, "{}\n{text}{}", bracket.open(), bracket.close())
            }
        }
    }
}

/**
    Quotes a string as a double-quoted Luau string literal.

    Control characters are written as three-digit decimal
    escapes so that a following digit can never extend them.
*/
pub fn quote_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_ascii_control() => {
                let _ = write!(quoted, "\\{:03}", c as u32);
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
