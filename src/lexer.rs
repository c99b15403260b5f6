//! Splitting of a pass-through line into argument words.
//!
//! Variable substitution has already happened by the time a line gets here,
//! so the lexer only deals with whitespace, quotes and backslash escapes.

use std::fmt;

/// Errors that can occur while splitting a line into words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexingError {
    /// A closing quote (single or double) was not found.
    UnfinishedQuote(char),
    /// The line ends with a backslash that escapes nothing.
    DanglingEscape,
}

impl fmt::Display for LexingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexingError::UnfinishedQuote(q) => write!(f, "no closing quotation ({q})"),
            LexingError::DanglingEscape => write!(f, "no escaped character"),
        }
    }
}

impl std::error::Error for LexingError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
    // A word was opened, even if it is still empty (`""`).
    in_word: bool,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
            in_word: false,
        }
    }

    /// Runs the state machine over the whole input and returns the words.
    fn make_words(&mut self) -> Result<Vec<String>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start | LexingState::ReadingWord => self.handle_word(ch, &mut out)?,
                LexingState::ReadingSingleQuote => self.handle_single_quote(ch),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch)?,
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote => return Err(LexingError::UnfinishedQuote('\'')),
            LexingState::ReadingDoubleQuote => return Err(LexingError::UnfinishedQuote('"')),
            _ => {}
        }

        self.finish_word(&mut out);
        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<String>) -> Result<(), LexingError> {
        match ch {
            ' ' | '\t' | '\n' => {
                self.finish_word(out);
                self.state = LexingState::Start;
            }
            '\'' => {
                self.in_word = true;
                self.state = LexingState::ReadingSingleQuote;
            }
            '"' => {
                self.in_word = true;
                self.state = LexingState::ReadingDoubleQuote;
            }
            '\\' => {
                let escaped = self.read_char().ok_or(LexingError::DanglingEscape)?;
                self.push(escaped);
            }
            c => self.push(c),
        }
        Ok(())
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::ReadingWord,
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) -> Result<(), LexingError> {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            '\\' => match self.peek_char() {
                Some(next @ ('"' | '\\')) => {
                    self.read_char();
                    self.buffer.push(next);
                }
                Some(_) => self.buffer.push('\\'),
                None => return Err(LexingError::UnfinishedQuote('"')),
            },
            c => self.buffer.push(c),
        }
        Ok(())
    }

    fn push(&mut self, ch: char) {
        self.in_word = true;
        self.state = LexingState::ReadingWord;
        self.buffer.push(ch);
    }

    fn finish_word(&mut self, out: &mut Vec<String>) {
        if self.in_word {
            out.push(std::mem::take(&mut self.buffer));
            self.in_word = false;
        }
    }
}

/// Split a line into words the way a POSIX shell would, minus expansions.
///
/// `'...'` keeps its content literally, `"..."` understands `\"` and `\\`
/// escapes and a backslash outside quotes escapes the next character.
/// Quoted and unquoted pieces that touch form a single word.
pub fn split_words(line: &str) -> Result<Vec<String>, LexingError> {
    LexingFSM::new(line).make_words()
}
