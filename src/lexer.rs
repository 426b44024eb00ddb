use super::{
  error::{
    ErrorMsg,
    MsgType::{self, *},
  },
  token::{self, Number, Token},
};
use codespan_reporting::{
  diagnostic::{Diagnostic, Label},
  files::SimpleFiles,
  term,
};
use std::{
  fmt,
  iter::Peekable,
  num, result,
  str::CharIndices,
};

use lexical_core as lexical;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Alias for `Result` with an error of type `cddl_typing::LexerError`
pub type Result<T> = result::Result<T, Error>;

const DEFAULT_MARKER: &str = ".default";

/// Lexer position
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Position {
  /// Line number
  pub line: usize,
  /// Column number
  pub column: usize,
  /// Token begin and end index range
  pub range: (usize, usize),
  /// Lexer index
  pub index: usize,
}

impl Default for Position {
  fn default() -> Self {
    Position {
      line: 1,
      column: 1,
      range: (0, 0),
      index: 0,
    }
  }
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.column)
  }
}

/// Lexer error
#[derive(Debug)]
pub struct Error {
  /// Error type
  pub error_type: LexerErrorType,
  input: String,
  /// Position of the offending input
  pub position: Position,
}

/// Various error types emitted by the lexer
#[derive(Debug)]
pub enum LexerErrorType {
  /// Lexing syntax error
  LEXER(MsgType),
  /// Error parsing integer
  PARSEINT(num::ParseIntError),
  /// Error parsing float
  PARSEFLOAT(lexical::Error),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut files = SimpleFiles::new();
    let file_id = files.add("input", self.input.as_str());
    let config = term::Config::default();
    let mut buffer = Vec::new();
    let mut writer = term::termcolor::NoColor::new(&mut buffer);

    let msg = match &self.error_type {
      LexerErrorType::LEXER(le) => ErrorMsg::from(*le).to_string(),
      LexerErrorType::PARSEINT(pie) => pie.to_string(),
      LexerErrorType::PARSEFLOAT(pfe) => format!("{:#?}", pfe),
    };

    let diagnostic = Diagnostic::error()
      .with_message("lexer error")
      .with_labels(vec![Label::primary(
        file_id,
        self.position.range.0..self.position.range.1,
      )
      .with_message(msg)]);

    term::emit(&mut writer, &config, &files, &diagnostic).map_err(|_| fmt::Error)?;

    write!(f, "{}", String::from_utf8(buffer).map_err(|_| fmt::Error)?)
  }
}

impl From<(&str, Position, MsgType)> for Error {
  fn from(e: (&str, Position, MsgType)) -> Self {
    Error {
      error_type: LexerErrorType::LEXER(e.2),
      input: e.0.to_string(),
      position: e.1,
    }
  }
}

impl From<(&str, Position, num::ParseIntError)> for Error {
  fn from(e: (&str, Position, num::ParseIntError)) -> Self {
    Error {
      error_type: LexerErrorType::PARSEINT(e.2),
      input: e.0.to_string(),
      position: e.1,
    }
  }
}

impl From<(&str, Position, lexical::Error)> for Error {
  fn from(e: (&str, Position, lexical::Error)) -> Self {
    Error {
      error_type: LexerErrorType::PARSEFLOAT(e.2),
      input: e.0.to_string(),
      position: e.1,
    }
  }
}

/// Lexer which holds a string slice and iterators over its characters.
///
/// Illegal characters are recorded in `errors`, logged and skipped; lexing
/// resumes at the next character. Once `EOF` has been yielded the iterator is
/// exhausted.
#[derive(Debug)]
pub struct Lexer<'a> {
  /// Normalized input string
  pub str_input: &'a str,
  input: Peekable<CharIndices<'a>>,
  multipeek: itertools::MultiPeek<CharIndices<'a>>,
  /// Lexer position in input
  pub position: Position,
  /// Recovered lexing errors
  pub errors: Vec<Error>,
  end: usize,
  finished: bool,
}

/// Iterated lexer token item
pub type Item<'a> = std::result::Result<(Position, Token<'a>), Error>;

impl<'a> Iterator for Lexer<'a> {
  type Item = Item<'a>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.finished {
      return None;
    }

    let next_token = self.next_token();
    if let Ok((_, Token::EOF)) = next_token {
      self.finished = true;
    }

    Some(next_token)
  }
}

/// Creates a `Lexer` from a string slice
///
/// # Arguments
///
/// `str_input` - String slice with input
pub fn lexer_from_str(str_input: &str) -> Lexer {
  Lexer::new(str_input)
}

impl<'a> Lexer<'a> {
  /// Creates a new `Lexer` from a given `&str` input
  pub fn new(str_input: &'a str) -> Lexer<'a> {
    Lexer {
      str_input,
      input: str_input.char_indices().peekable(),
      multipeek: itertools::multipeek(str_input.char_indices()),
      position: Position::default(),
      errors: Vec::new(),
      end: 0,
      finished: false,
    }
  }

  fn read_char(&mut self) -> Option<(usize, char)> {
    self.multipeek.next();

    self.input.next().map(|c| {
      if c.1 == '\n' {
        self.position.line += 1;
        self.position.column = 1;
      } else {
        self.position.column += 1;
      }

      if !c.1.is_whitespace() {
        self.position.index = c.0;
      }
      self.end = c.0 + c.1.len_utf8();

      c
    })
  }

  /// Advances the index of the str iterator over the input and returns a
  /// `Token`
  pub fn next_token(&mut self) -> Result<(Position, Token<'a>)> {
    loop {
      self.skip_whitespace();
      let start = self.position;

      let (idx, ch) = match self.read_char() {
        Some(c) => c,
        None => {
          self.position.range = (self.end, self.end);
          return Ok((self.position, Token::EOF));
        }
      };

      let token = match ch {
        '=' => Token::ASSIGN,
        ':' => Token::COLON,
        '?' => Token::QUESTION,
        '*' => Token::STAR,
        '+' => Token::PLUS,
        '(' => Token::LPAREN,
        ')' => Token::RPAREN,
        '[' => Token::LBRACKET,
        ']' => Token::RBRACKET,
        '{' => Token::LBRACE,
        '}' => Token::RBRACE,
        ',' => Token::COMMA,
        ';' => Token::SEMICOLON,
        '/' => match self.peek_char().map(|c| c.1) {
          Some('/') => {
            let _ = self.read_char();
            Token::UNION
          }
          _ => Token::JOIN,
        },
        '.' => match self.peek_char().map(|c| c.1) {
          Some('.') => {
            let _ = self.read_char();
            Token::RANGE
          }
          _ if self.str_input[idx..].starts_with(DEFAULT_MARKER) => {
            for _ in 1..DEFAULT_MARKER.len() {
              let _ = self.read_char();
            }
            Token::DEFAULT
          }
          _ => {
            self.illegal(start, idx, InvalidCharacter);
            continue;
          }
        },
        '"' => match self.read_text_value(idx) {
          Some(text) => Token::STRING(text),
          None => {
            self.illegal(start, idx, UnterminatedTextStringLiteral);
            continue;
          }
        },
        ch if is_digit(ch) => {
          let number = self.read_number(idx)?;
          Token::NUMBER(number)
        }
        ch if is_alpha(ch) => token::lookup_ident(self.read_identifier(idx)),
        _ => {
          self.illegal(start, idx, InvalidCharacter);
          continue;
        }
      };

      self.position.range = (idx, self.end);

      return Ok((
        Position {
          range: (idx, self.end),
          index: idx,
          ..start
        },
        token,
      ));
    }
  }

  fn illegal(&mut self, start: Position, idx: usize, mt: MsgType) {
    let mut position = start;
    position.range = (idx, idx + self.str_input[idx..].chars().next().map_or(1, char::len_utf8));

    let error = Error::from((self.str_input, position, mt));
    log::warn!(
      "illegal character {:?} at {}:{}, skipping",
      &self.str_input[position.range.0..position.range.1],
      position.line,
      position.column
    );
    self.errors.push(error);
  }

  fn read_identifier(&mut self, idx: usize) -> &'a str {
    let mut qualified = false;

    while let Some(&(next_idx, ch)) = self.peek_char() {
      if is_ident_char(ch) {
        let _ = self.read_char();
        continue;
      }

      // A single module separator, which must not introduce a range or the
      // default marker
      if ch == '.'
        && !qualified
        && !self.str_input[next_idx..].starts_with(DEFAULT_MARKER)
        && !self.str_input[next_idx..].starts_with("..")
      {
        qualified = true;
        let _ = self.read_char();
        continue;
      }

      break;
    }

    &self.str_input[idx..self.end]
  }

  fn read_text_value(&mut self, idx: usize) -> Option<&'a str> {
    let close = self.str_input[idx + 1..].find('"')? + idx + 1;

    while let Some(&(i, _)) = self.peek_char() {
      let _ = self.read_char();
      if i == close {
        break;
      }
    }

    Some(&self.str_input[idx + 1..close])
  }

  fn read_number(&mut self, idx: usize) -> Result<Number> {
    self.read_digits();

    // A fraction only when the dot is followed by a digit; '..' is a range
    if let Some(&(_, '.')) = self.peek_char() {
      self.multipeek.reset_peek();
      let _ = self.multipeek.peek();
      if let Some(&(_, c)) = self.multipeek.peek() {
        if is_digit(c) {
          let _ = self.read_char();
          self.read_digits();

          return lexical::parse::<f64>(self.str_input[idx..self.end].as_bytes())
            .map(Number::FLOAT)
            .map_err(|e| self.number_error(idx, e));
        }
      }
    }

    self.str_input[idx..self.end]
      .parse::<i64>()
      .map(Number::INT)
      .map_err(|e| self.number_error(idx, e))
  }

  fn number_error<E>(&self, idx: usize, e: E) -> Error
  where
    Error: for<'s> From<(&'s str, Position, E)>,
  {
    let mut position = self.position;
    position.range = (idx, self.end);
    Error::from((self.str_input, position, e))
  }

  fn read_digits(&mut self) {
    while let Some(&(_, c)) = self.peek_char() {
      if is_digit(c) {
        let _ = self.read_char();
      } else {
        break;
      }
    }
  }

  fn skip_whitespace(&mut self) {
    while let Some(&(idx, ch)) = self.peek_char() {
      if ch.is_whitespace() {
        let _ = self.read_char();
      } else {
        self.position.index = idx;
        break;
      }
    }
  }

  fn peek_char(&mut self) -> Option<&(usize, char)> {
    self.input.peek()
  }
}

fn is_alpha(ch: char) -> bool {
  ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_char(ch: char) -> bool {
  ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

fn is_digit(ch: char) -> bool {
  ch.is_ascii_digit()
}
