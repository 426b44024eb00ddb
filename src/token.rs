use std::fmt;

/// Token which represents a valid character or sequence of the normalized
/// schema text
#[derive(PartialEq, Debug, Clone)]
pub enum Token<'a> {
  /// End of file
  EOF,

  /// Identifier, optionally qualified with a single `module.` prefix
  SYMBOL(&'a str),
  /// Numeric literal
  NUMBER(Number),
  /// `true`, `false` or `null`/`nil` (the latter two as `None`)
  BOOL(Option<bool>),
  /// Text string literal, without the enclosing quotes
  STRING(&'a str),

  // Operators
  /// Range operator '..'
  RANGE,
  /// Assignment operator '='
  ASSIGN,
  /// Member key separator ':'
  COLON,
  /// Choice operator '//'
  UNION,
  /// Single slash '/'
  JOIN,
  /// Zero or more occurrence indicator '*'
  STAR,
  /// One or more occurrence indicator '+'
  PLUS,
  /// Optional occurrence indicator '?'
  QUESTION,
  /// .default control operator
  DEFAULT,

  // Delimiters
  /// Left opening parend
  LPAREN,
  /// Right closing parend
  RPAREN,
  /// Left opening bracket
  LBRACKET,
  /// Right closing bracket
  RBRACKET,
  /// Left opening brace
  LBRACE,
  /// Right closing brace
  RBRACE,
  /// Comma ','
  COMMA,
  /// Rule terminator ';'
  SEMICOLON,
}

/// Numeric literal value
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Number {
  /// Integer
  INT(i64),
  /// Float
  FLOAT(f64),
}

impl fmt::Display for Number {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Number::INT(i) => write!(f, "{}", i),
      Number::FLOAT(fl) => write!(f, "{:?}", fl),
    }
  }
}

impl<'a> Token<'a> {
  /// Returns whether the token can begin a type
  pub fn starts_type(&self) -> bool {
    matches!(
      self,
      Token::SYMBOL(_)
        | Token::NUMBER(_)
        | Token::BOOL(_)
        | Token::STRING(_)
        | Token::LBRACKET
        | Token::LPAREN
        | Token::LBRACE
    )
  }

  /// Returns whether the token is either of the choice operators
  pub fn is_choice(&self) -> bool {
    matches!(self, Token::UNION | Token::JOIN)
  }
}

/// Returns the token for a reserved word, or a `SYMBOL` for everything else
///
/// # Example
///
/// ```
/// use cddl_typing::token::{lookup_ident, Token};
///
/// assert_eq!(lookup_ident("nil"), Token::BOOL(None));
/// assert_eq!(lookup_ident("truthy"), Token::SYMBOL("truthy"));
/// ```
pub fn lookup_ident(ident: &str) -> Token {
  match ident {
    "true" => Token::BOOL(Some(true)),
    "false" => Token::BOOL(Some(false)),
    "null" | "nil" => Token::BOOL(None),
    _ => Token::SYMBOL(ident),
  }
}

impl<'a> fmt::Display for Token<'a> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Token::EOF => write!(f, ""),
      Token::SYMBOL(ident) => write!(f, "{}", ident),
      Token::NUMBER(n) => write!(f, "{}", n),
      Token::BOOL(Some(true)) => write!(f, "true"),
      Token::BOOL(Some(false)) => write!(f, "false"),
      Token::BOOL(None) => write!(f, "null"),
      Token::STRING(s) => write!(f, "\"{}\"", s),
      Token::RANGE => write!(f, ".."),
      Token::ASSIGN => write!(f, "="),
      Token::COLON => write!(f, ":"),
      Token::UNION => write!(f, "//"),
      Token::JOIN => write!(f, "/"),
      Token::STAR => write!(f, "*"),
      Token::PLUS => write!(f, "+"),
      Token::QUESTION => write!(f, "?"),
      Token::DEFAULT => write!(f, ".default"),
      Token::LPAREN => write!(f, "("),
      Token::RPAREN => write!(f, ")"),
      Token::LBRACKET => write!(f, "["),
      Token::RBRACKET => write!(f, "]"),
      Token::LBRACE => write!(f, "{{"),
      Token::RBRACE => write!(f, "}}"),
      Token::COMMA => write!(f, ","),
      Token::SEMICOLON => write!(f, ";"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn verify_reserved_words() {
    assert_eq!(lookup_ident("true"), Token::BOOL(Some(true)));
    assert_eq!(lookup_ident("false"), Token::BOOL(Some(false)));
    assert_eq!(lookup_ident("null"), Token::BOOL(None));
    assert_eq!(lookup_ident("nullable"), Token::SYMBOL("nullable"));
  }

  #[test]
  fn verify_token_display() {
    assert_eq!(Token::NUMBER(Number::FLOAT(1.0)).to_string(), "1.0");
    assert_eq!(Token::STRING("a b").to_string(), "\"a b\"");
    assert_eq!(Token::LBRACE.to_string(), "{");
  }
}
