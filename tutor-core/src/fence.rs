//! Code fence grammar
//!
//! Model output that should be bare JSON sometimes comes wrapped in a
//! markdown code fence. The accepted shape is:
//!
//! ```text
//! fenced := ws* open? body close? ws*
//! open   := "```" tag? hspace* newline?
//! close  := "```"
//! tag    := [A-Za-z0-9_+.-]+
//! ```
//!
//! Both delimiters are optional and independent, so a missing closing fence
//! (truncated output) or a stray closing fence is tolerated. Unfenced text
//! parses to its trimmed self.

const FENCE: &str = "```";

/// The pieces of a possibly-fenced block of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fenced<'a> {
    /// Language tag of the opening fence, if any
    pub language: Option<&'a str>,
    /// Trimmed content between the fences
    pub body: &'a str,
    pub opened: bool,
    pub closed: bool,
}

/// Splits `text` into fence delimiters and body
pub fn parse(text: &str) -> Fenced<'_> {
    let mut rest = text.trim();
    let mut language = None;
    let opened = rest.starts_with(FENCE);

    if opened {
        rest = &rest[FENCE.len()..];

        let tag_len = rest
            .find(|c: char| !is_tag_char(c))
            .unwrap_or(rest.len());
        if tag_len > 0 {
            language = Some(&rest[..tag_len]);
            rest = &rest[tag_len..];
        }

        rest = rest.trim_start_matches([' ', '\t']);
        rest = rest
            .strip_prefix("\r\n")
            .or_else(|| rest.strip_prefix('\n'))
            .unwrap_or(rest);
    }

    let trimmed = rest.trim_end();
    let closed = trimmed.ends_with(FENCE);
    if closed {
        rest = &trimmed[..trimmed.len() - FENCE.len()];
    }

    Fenced {
        language,
        body: rest.trim(),
        opened,
        closed,
    }
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '.' | '-')
}
