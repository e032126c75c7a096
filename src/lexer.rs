//! Splits a raw command line into the argument vector handed to `execvp`.
//!
//! Only double quotes group words. A quoted run keeps its quote characters
//! unless the quotes bracket the whole token, in which case exactly one pair is
//! stripped. Nothing else (escapes, single quotes, substitutions) is special.

const QUOTE: char = '"';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Unquoted,
    Quoted(char),
}

struct LexingFSM<'a> {
    input: &'a str,
    /// Byte offset where the pending token begins.
    start: usize,
    state: LexingState,
}

impl<'a> LexingFSM<'a> {
    fn new(input: &'a str) -> Self {
        LexingFSM {
            input,
            start: 0,
            state: LexingState::Unquoted,
        }
    }

    /// Runs the scanner over the whole input and returns the emitted tokens.
    ///
    /// An unterminated quote is not an error: the scanner still reaches the
    /// end of input and emits the pending span as-is.
    fn make_tokens(mut self) -> Vec<String> {
        let mut out = Vec::new();

        for (pos, ch) in self.input.char_indices() {
            match self.state {
                LexingState::Unquoted if is_separator(ch) => {
                    self.finalize_span(pos, &mut out);
                    self.start = pos + ch.len_utf8();
                }
                LexingState::Unquoted if ch == QUOTE => self.state = LexingState::Quoted(ch),
                LexingState::Quoted(open) if ch == open => self.state = LexingState::Unquoted,
                _ => {}
            }
        }

        self.finalize_span(self.input.len(), &mut out);
        out
    }

    fn finalize_span(&self, end: usize, out: &mut Vec<String>) {
        let span = &self.input[self.start..end];
        if span.is_empty() {
            return;
        }
        out.push(strip_bracketing_quotes(span).to_string());
    }
}

/// Mirrors C `isspace` in the "C" locale.
fn is_separator(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r')
}

/// Removes one leading and one trailing quote, but only when the quotes
/// bracket the whole span. `"a"b` is returned untouched.
fn strip_bracketing_quotes(span: &str) -> &str {
    if span.len() >= 2 && span.starts_with(QUOTE) && span.ends_with(QUOTE) {
        &span[1..span.len() - 1]
    } else {
        span
    }
}

/// Tokenizes a command line into its ordered argument list.
///
/// The first token names the program. Whitespace outside a double-quoted run
/// separates tokens and never produces an empty token; `""` on its own yields
/// a single empty token.
///
/// ```
/// use command_capture::tokenize;
/// assert_eq!(tokenize(r#"ls -l "my file.txt""#), ["ls", "-l", "my file.txt"]);
/// assert_eq!(tokenize(r#""a"b"#), [r#""a"b"#]);
/// ```
pub fn tokenize(line: &str) -> Vec<String> {
    LexingFSM::new(line).make_tokens()
}
