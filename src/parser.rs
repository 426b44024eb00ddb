//! Recursive descent parser producing the type model from normalized text.
//!
//! ```text
//! cddl          = 1*assignment
//! assignment    = SYMBOL "=" type ";"
//! type          = type1 *(("//" / "/") [type1])
//! type1         = NUMBER ".." NUMBER / type2
//! type2         = SYMBOL / NUMBER / STRING / BOOL / array
//!               / "(" params ")" / "{" params "}"
//! array         = "[" ["*" / "+"] type "]"
//! params        = param *("," param) [","]
//! param         = ["?"] SYMBOL ":" type [".default" type1]
//!               / ["?"] type
//! ```
//!
//! Errors are recovered from as locally as possible. A single '/' where '//'
//! is expected is treated as '//', an unexpected '(' and everything up to its
//! matching ')' is discarded, and any other error abandons the current entry
//! only. Parsing resumes after the entry's ';'.

use super::{
  ast::*,
  error::{
    ErrorMsg,
    MsgType::{self, *},
  },
  lexer::{self, Lexer, Position},
  normalizer::Normalizer,
  token::{Number, Token},
};
use codespan_reporting::{
  diagnostic::{Diagnostic, Label},
  files::SimpleFiles,
  term,
};
use std::{convert::TryFrom, mem, result};

use displaydoc::Display;

/// Alias for `Result` with an error of type `cddl_typing::ParserError`
pub type Result<T> = result::Result<T, Error>;

const CONTEXT_WIDTH: usize = 20;

/// Parsing error types
#[derive(Debug, Display)]
pub enum Error {
  /// Syntax error
  #[displaydoc("parsing error at {position}, token '{token}': {msg}. context: {context}")]
  PARSER {
    /// Error position
    position: Position,
    /// Offending token
    token: String,
    /// Error message
    msg: ErrorMsg,
    /// Input surrounding the offending token
    context: String,
  },
  /// Lexing error that could not be skipped
  #[displaydoc("{0}")]
  LEXER(lexer::Error),
  /// Grammar produced a shape the type model cannot hold
  #[displaydoc("construction error at {position}: {msg}")]
  CONSTRUCTION {
    /// Error position
    position: Position,
    /// Error message
    msg: ErrorMsg,
  },
  /// Invalid entry name pattern
  #[displaydoc("regex parsing error: {0}")]
  REGEX(regex::Error),
  /// Errors were recovered from and strict mode is on
  #[displaydoc("incremental parsing error")]
  INCREMENTAL,
}

impl std::error::Error for Error {}

impl From<regex::Error> for Error {
  fn from(e: regex::Error) -> Self {
    Error::REGEX(e)
  }
}

/// Pipeline configuration
#[derive(Debug, Clone, Default)]
pub struct Options {
  /// Case-insensitive pattern entry names must match. Empty matches all.
  pub pattern: String,
  /// Case policy for module prefixes
  pub module_case: ModuleCase,
  /// Fail with `Error::INCREMENTAL` if any error was recovered from
  pub strict: bool,
}

impl Options {
  /// Sets the entry name pattern
  pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
    self.pattern = pattern.into();
    self
  }

  /// Sets the module case policy
  pub fn with_module_case(mut self, module_case: ModuleCase) -> Self {
    self.module_case = module_case;
    self
  }

  /// Sets strict mode
  pub fn with_strict(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }
}

/// Normalizes and parses `input`, returning every entry that could be
/// translated. Entries that fail to parse are logged and skipped unless
/// `options.strict` is set.
///
/// # Example
///
/// ```
/// use cddl_typing::{cddl_from_str, Options};
///
/// let input = "session.Status = {\n  ready: bool\n  message: tstr\n}\n";
/// let entries = cddl_from_str(input, &Options::default()).unwrap();
///
/// assert_eq!(entries[0].name.qualified(), "session.Status");
/// ```
pub fn cddl_from_str(input: &str, options: &Options) -> Result<Vec<Entry>> {
  let normalized = Normalizer::new(&options.pattern)?.normalize(input)?;

  let mut p = Parser::new(&normalized).with_module_case(options.module_case);
  let entries = p.parse_cddl();

  if options.strict && !p.errors.is_empty() {
    if let Some(report) = p.report_errors() {
      log::error!("{}", report);
    }

    return Err(Error::INCREMENTAL);
  }

  Ok(entries)
}

/// Parser over a pull-based token stream
#[derive(Debug)]
pub struct Parser<'a> {
  lexer: Lexer<'a>,
  str_input: &'a str,
  cur_token: Token<'a>,
  peek_token: Token<'a>,
  cur_position: Position,
  peek_position: Position,
  module_case: ModuleCase,
  /// Errors that abandoned an entry, followed by skipped lexing errors
  pub errors: Vec<Error>,
}

impl<'a> Parser<'a> {
  /// Creates a new `Parser` over normalized input
  pub fn new(str_input: &'a str) -> Parser<'a> {
    let mut p = Parser {
      lexer: Lexer::new(str_input),
      str_input,
      cur_token: Token::EOF,
      peek_token: Token::EOF,
      cur_position: Position::default(),
      peek_position: Position::default(),
      module_case: ModuleCase::default(),
      errors: Vec::new(),
    };

    p.advance();
    p.advance();

    p
  }

  /// Sets the case policy for module prefixes
  pub fn with_module_case(mut self, module_case: ModuleCase) -> Self {
    self.module_case = module_case;
    self
  }

  /// Parses every entry of the input
  pub fn parse_cddl(&mut self) -> Vec<Entry> {
    let mut entries = Vec::new();

    while self.cur_token != Token::EOF {
      match self.parse_assignment() {
        Ok(entry) => entries.push(entry),
        Err(e) => {
          log::error!("abandoning entry: {}", e);
          self.errors.push(e);
          self.synchronize();
        }
      }
    }

    self
      .errors
      .extend(self.lexer.errors.drain(..).map(Error::LEXER));

    entries
  }

  /// Renders all collected errors. Syntax and construction errors share a
  /// single diagnostic.
  pub fn report_errors(&self) -> Option<String> {
    if self.errors.is_empty() {
      return None;
    }

    let mut files = SimpleFiles::new();
    let file_id = files.add("input", self.str_input);

    let mut labels = Vec::new();
    let mut other = Vec::new();
    for error in self.errors.iter() {
      match error {
        Error::PARSER { position, msg, .. } | Error::CONSTRUCTION { position, msg } => labels.push(
          Label::primary(file_id, position.range.0..position.range.1).with_message(msg.to_string()),
        ),
        e => other.push(e.to_string()),
      }
    }

    let mut report = String::new();
    if !labels.is_empty() {
      let diagnostic = Diagnostic::error()
        .with_message("parser errors")
        .with_labels(labels);

      let config = term::Config::default();
      let mut buffer = Vec::new();
      let mut writer = term::termcolor::NoColor::new(&mut buffer);

      term::emit(&mut writer, &config, &files, &diagnostic).ok()?;
      report.push_str(&String::from_utf8(buffer).ok()?);
    }

    for e in other {
      report.push_str(&e);
    }

    Some(report)
  }

  fn next_token(&mut self) -> Result<()> {
    self.cur_token = mem::replace(&mut self.peek_token, Token::EOF);
    self.cur_position = self.peek_position;

    let mut failure = None;
    loop {
      match self.lexer.next() {
        Some(Ok((position, token))) => {
          self.peek_token = token;
          self.peek_position = position;
          break;
        }
        Some(Err(e)) if failure.is_none() => failure = Some(Error::LEXER(e)),
        Some(Err(e)) => self.errors.push(Error::LEXER(e)),
        None => break,
      }
    }

    failure.map_or(Ok(()), Err)
  }

  fn advance(&mut self) {
    if let Err(e) = self.next_token() {
      self.errors.push(e);
    }
  }

  // Skips past the ';' ending the current entry
  fn synchronize(&mut self) {
    while self.cur_token != Token::EOF {
      let terminator = self.cur_token == Token::SEMICOLON;
      self.advance();

      if terminator {
        break;
      }
    }
  }

  fn parse_assignment(&mut self) -> Result<Entry> {
    let name = match self.cur_token {
      Token::SYMBOL(ident) => QualifiedName::new(ident, self.module_case),
      _ => return Err(self.parser_error(InvalidRuleIdentifier)),
    };
    self.next_token()?;

    if self.cur_token != Token::ASSIGN {
      return Err(self.parser_error(MissingAssignmentToken));
    }
    self.next_token()?;

    if !self.cur_token.starts_type() {
      return Err(self.parser_error(IncompleteRuleEntry));
    }

    let params = match self.parse_type()? {
      TypeNode::Group(members) => Params::from(members),
      t => Params::Type(t),
    };

    if self.cur_token != Token::SEMICOLON {
      return Err(self.parser_error(MissingRuleTerminator));
    }
    self.next_token()?;

    Ok(Entry { name, params })
  }

  fn parse_type(&mut self) -> Result<TypeNode> {
    let first = self.parse_type1()?;
    let mut rest = Vec::new();

    while self.cur_token.is_choice() {
      if self.cur_token == Token::JOIN {
        log::warn!(
          "{}: unexpected '/', replacing with '//'",
          self.cur_position
        );
        self.cur_token = Token::UNION;
      }
      self.next_token()?;

      // Repeated and dangling choice operators are tolerated
      if self.cur_token.starts_type() {
        rest.push(self.parse_type1()?);
      }
    }

    Ok(TypeNode::union(first, rest))
  }

  fn parse_type1(&mut self) -> Result<TypeNode> {
    let node = match self.cur_token {
      Token::NUMBER(lower) if self.peek_token == Token::RANGE => {
        self.next_token()?;
        self.next_token()?;

        if let Token::NUMBER(_) = self.cur_token {
          self.next_token()?;
        } else {
          return Err(self.parser_error(InvalidRangeSyntax));
        }

        TypeNode::Range(match lower {
          Number::INT(_) => NumericKind::Int,
          Number::FLOAT(_) => NumericKind::Float,
        })
      }
      _ => self.parse_type2()?,
    };

    while self.cur_token == Token::LPAREN {
      self.skip_parenthesized()?;
    }

    Ok(node)
  }

  fn parse_type2(&mut self) -> Result<TypeNode> {
    let node = match self.cur_token {
      Token::SYMBOL(ident) => TypeNode::from_symbol(ident, self.module_case),
      Token::NUMBER(Number::INT(i)) => TypeNode::Literal(Value::INT(i)),
      Token::NUMBER(Number::FLOAT(f)) => TypeNode::Literal(Value::FLOAT(f)),
      Token::STRING(s) => TypeNode::Literal(Value::TEXT(s.to_string())),
      Token::BOOL(Some(b)) => TypeNode::Literal(Value::BOOL(b)),
      Token::BOOL(None) => TypeNode::Literal(Value::NULL),
      Token::LBRACKET => return self.parse_array(),
      Token::LPAREN => return self.parse_params(Token::RPAREN).map(TypeNode::group),
      Token::LBRACE => return self.parse_params(Token::RBRACE).map(TypeNode::group),
      _ => return Err(self.parser_error(InvalidTypeSyntax)),
    };
    self.next_token()?;

    Ok(node)
  }

  fn parse_array(&mut self) -> Result<TypeNode> {
    self.next_token()?;

    let optional = match self.cur_token {
      Token::STAR => {
        self.next_token()?;
        true
      }
      Token::PLUS => {
        self.next_token()?;
        false
      }
      _ => false,
    };

    let sequence = TypeNode::sequence(self.parse_type()?);

    if self.cur_token != Token::RBRACKET {
      return Err(self.parser_error(MissingClosingBracket));
    }
    self.next_token()?;

    if optional {
      return Ok(TypeNode::optional(sequence));
    }

    Ok(sequence)
  }

  fn parse_params(&mut self, close: Token<'a>) -> Result<Vec<Member>> {
    self.next_token()?;

    let mut members = Vec::new();
    while self.cur_token != close {
      members.push(self.parse_param()?);

      if self.cur_token == Token::COMMA {
        self.next_token()?;
      } else if self.cur_token != close {
        return Err(self.parser_error(if close == Token::RPAREN {
          MissingClosingParend
        } else {
          MissingClosingDelimiter
        }));
      }
    }

    if members.is_empty() {
      return Err(self.parser_error(MissingGroupEntry));
    }
    self.next_token()?;

    Ok(members)
  }

  fn parse_param(&mut self) -> Result<Member> {
    let optional = self.cur_token == Token::QUESTION;
    if optional {
      self.next_token()?;
    }

    let name = match (&self.cur_token, &self.peek_token) {
      (Token::SYMBOL(ident), Token::COLON) => QualifiedName::new(ident, self.module_case),
      _ => {
        let value = self.parse_type()?;

        if optional {
          return Ok(Member::Type(TypeNode::optional(value)));
        }
        return Ok(Member::Type(value));
      }
    };
    self.next_token()?;
    self.next_token()?;

    if !self.cur_token.starts_type() {
      return Err(self.parser_error(InvalidGroupEntrySyntax));
    }

    let mut key = Key::new(name);
    let mut value = self.parse_type()?;

    if self.cur_token == Token::DEFAULT {
      self.next_token()?;
      key.default = Some(self.parse_default_value()?);
    }

    if optional {
      value = TypeNode::optional(value);
    }

    Ok(Member::Pair(Pair { key, value }))
  }

  fn parse_default_value(&mut self) -> Result<Value> {
    let position = self.cur_position;
    let node = self.parse_type1()?;

    Value::try_from(&node).map_err(|NotALiteral(node)| Error::CONSTRUCTION {
      position,
      msg: ErrorMsg {
        short: ErrorMsg::from(InvalidDefaultValue).short,
        extended: Some(format!("found {:?}", node)),
      },
    })
  }

  fn skip_parenthesized(&mut self) -> Result<()> {
    log::warn!(
      "{}: unmatched '(', discarding up to the matching ')'",
      self.cur_position
    );

    let mut depth = 0usize;
    loop {
      match self.cur_token {
        Token::LPAREN => depth += 1,
        Token::RPAREN => {
          depth -= 1;
          if depth == 0 {
            return self.next_token();
          }
        }
        Token::EOF => {
          log::warn!("no matching ')' found, discarding");
          return Ok(());
        }
        _ => (),
      }

      self.next_token()?;
    }
  }

  fn parser_error(&self, mt: MsgType) -> Error {
    let msg = if self.cur_token == Token::EOF {
      ErrorMsg {
        short: ErrorMsg::from(UnexpectedEndOfInput).short,
        extended: Some(ErrorMsg::from(mt).short),
      }
    } else {
      ErrorMsg::from(mt)
    };

    Error::PARSER {
      position: self.cur_position,
      token: self.cur_token.to_string(),
      msg,
      context: error_context(self.str_input, self.cur_position.range.0).to_string(),
    }
  }
}

// Up to CONTEXT_WIDTH bytes either side of `index`, widened to char boundaries
fn error_context(input: &str, index: usize) -> &str {
  let index = index.min(input.len());

  let mut start = index.saturating_sub(CONTEXT_WIDTH);
  while !input.is_char_boundary(start) {
    start -= 1;
  }

  let mut end = (index + CONTEXT_WIDTH).min(input.len());
  while !input.is_char_boundary(end) {
    end += 1;
  }

  &input[start..end]
}
