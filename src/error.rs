use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Short and optional extended description of a lexer or parser failure
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMsg {
  /// One-line message
  pub short: String,
  /// Additional detail, e.g. the surrounding input
  pub extended: Option<String>,
}

impl fmt::Display for ErrorMsg {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.short)
  }
}

/// Known failure kinds
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MsgType {
  // Parser
  InvalidRuleIdentifier,
  MissingAssignmentToken,
  IncompleteRuleEntry,
  MissingRuleTerminator,
  InvalidGroupEntrySyntax,
  MissingGroupEntry,
  MissingClosingDelimiter,
  MissingClosingParend,
  MissingClosingBracket,
  InvalidTypeSyntax,
  InvalidRangeSyntax,
  InvalidDefaultValue,
  UnexpectedEndOfInput,

  // Lexer
  InvalidCharacter,
  UnterminatedTextStringLiteral,
}

impl From<MsgType> for ErrorMsg {
  fn from(mt: MsgType) -> ErrorMsg {
    let short = match mt {
      MsgType::InvalidRuleIdentifier => "expected rule identifier followed by an assignment token '='",
      MsgType::MissingAssignmentToken => "expected assignment token '=' after rule identifier",
      MsgType::IncompleteRuleEntry => "missing rule entry after assignment",
      MsgType::MissingRuleTerminator => "expected ';' after rule entry",
      MsgType::InvalidGroupEntrySyntax => "invalid group entry syntax",
      MsgType::MissingGroupEntry => "missing group entry",
      MsgType::MissingClosingDelimiter => "missing closing delimiter '}'",
      MsgType::MissingClosingParend => "missing closing parend ')'",
      MsgType::MissingClosingBracket => "missing closing bracket ']'",
      MsgType::InvalidTypeSyntax => "expected a type name, literal, array, range or group",
      MsgType::InvalidRangeSyntax => "expected numeric upper bound after range operator '..'",
      MsgType::InvalidDefaultValue => "default value must be a single literal",
      MsgType::UnexpectedEndOfInput => "unexpected end of input",
      MsgType::InvalidCharacter => "invalid character",
      MsgType::UnterminatedTextStringLiteral => {
        "invalid character in text string literal. expected closing \""
      }
    };

    ErrorMsg {
      short: short.into(),
      extended: None,
    }
  }
}
