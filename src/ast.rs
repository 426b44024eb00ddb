use std::{convert::TryFrom, fmt};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Case policy applied to the module segment of a qualified name
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleCase {
  /// `browsingContext` becomes `browsing_context`
  Snake,
  /// Module segments are kept as written
  Preserve,
}

impl Default for ModuleCase {
  fn default() -> Self {
    ModuleCase::Snake
  }
}

impl ModuleCase {
  fn apply(self, module: &str) -> String {
    match self {
      ModuleCase::Snake => to_snake_case(module),
      ModuleCase::Preserve => module.to_string(),
    }
  }
}

/// Inserts `_` before every uppercase character except the first and
/// lowercases the result
///
/// # Example
///
/// ```
/// use cddl_typing::ast::to_snake_case;
///
/// assert_eq!(to_snake_case("browsingContext"), "browsing_context");
/// ```
pub fn to_snake_case(camel_case: &str) -> String {
  let mut snake_case = String::with_capacity(camel_case.len() + 4);

  for (idx, ch) in camel_case.chars().enumerate() {
    if idx > 0 && ch.is_uppercase() {
      snake_case.push('_');
    }
    snake_case.extend(ch.to_lowercase());
  }

  snake_case
}

/// Identifier with an optional module prefix, `module.name`
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
  /// Case-normalized module segment
  pub module: Option<String>,
  /// Name segment
  pub name: String,
}

impl QualifiedName {
  /// Splits `raw` at its dot, if any, normalizing the module segment
  pub fn new(raw: &str, case: ModuleCase) -> Self {
    match raw.split_once('.') {
      Some((module, name)) => QualifiedName {
        module: Some(case.apply(module)),
        name: name.to_string(),
      },
      None => QualifiedName {
        module: None,
        name: raw.to_string(),
      },
    }
  }

  /// `module.name` when a module exists, otherwise `name`
  pub fn qualified(&self) -> String {
    self.to_string()
  }

  /// Whether the name lives in the given module
  pub fn in_module(&self, module: Option<&str>) -> bool {
    match (&self.module, module) {
      (Some(m), Some(current)) => m == current,
      _ => false,
    }
  }
}

impl fmt::Display for QualifiedName {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match &self.module {
      Some(module) => write!(f, "{}.{}", module, self.name),
      None => write!(f, "{}", self.name),
    }
  }
}

/// Scalar literal value
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  /// Integer value
  INT(i64),
  /// Float value
  FLOAT(f64),
  /// Text value
  TEXT(String),
  /// Boolean value
  BOOL(bool),
  /// `null` / `nil`
  NULL,
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Value::INT(i) => write!(f, "{}", i),
      Value::FLOAT(fl) => write!(f, "{}", float_repr(*fl)),
      Value::TEXT(text) => write!(f, "{}", quote_text(text)),
      Value::BOOL(true) => write!(f, "True"),
      Value::BOOL(false) => write!(f, "False"),
      Value::NULL => write!(f, "None"),
    }
  }
}

// Python repr of a float: scientific notation below 1e-4 and from 1e16 up,
// with a signed exponent of at least two digits
fn float_repr(fl: f64) -> String {
  if fl.is_nan() {
    return "nan".to_string();
  }
  if fl.is_infinite() {
    return if fl > 0.0 { "inf" } else { "-inf" }.to_string();
  }

  let abs = fl.abs();
  if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
    let sci = format!("{:e}", fl);
    return match sci.split_once('e') {
      Some((mantissa, exp)) => {
        let (sign, digits) = match exp.strip_prefix('-') {
          Some(digits) => ('-', digits),
          None => ('+', exp),
        };
        format!("{}e{}{:0>2}", mantissa, sign, digits)
      }
      None => sci,
    };
  }

  let plain = fl.to_string();
  if plain.contains('.') {
    plain
  } else {
    format!("{}.0", plain)
  }
}

// Python repr quoting: single quotes unless only the single quote occurs
fn quote_text(text: &str) -> String {
  if text.contains('\'') && !text.contains('"') {
    return format!("\"{}\"", text.replace('\\', "\\\\"));
  }

  format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Predefined types
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
  /// int
  Int,
  /// float
  Float,
  /// text / str
  Str,
  /// bool
  Bool,
  /// bytes / bstr
  Bytes,
  /// dict
  Dict,
  /// any
  Any,
}

impl Builtin {
  /// Returns the predefined type named by `ident`, if any
  pub fn lookup(ident: &str) -> Option<Builtin> {
    match ident {
      "int" | "integer" => Some(Builtin::Int),
      "float" | "float16" | "float32" | "float64" => Some(Builtin::Float),
      "text" | "str" => Some(Builtin::Str),
      "bool" => Some(Builtin::Bool),
      "bytes" | "bstr" => Some(Builtin::Bytes),
      "dict" => Some(Builtin::Dict),
      "any" => Some(Builtin::Any),
      _ => None,
    }
  }
}

/// Scalar kind a numeric range collapses to
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
  /// Integer bounds
  Int,
  /// Float bounds
  Float,
}

/// Type expression
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
  /// Predefined type
  Builtin(Builtin),
  /// Reference to a named type
  Ref(QualifiedName),
  /// Fixed scalar value
  Literal(Value),
  /// Type choice, at least two distinct alternatives in source order
  Union(Vec<TypeNode>),
  /// Homogeneous array
  Sequence(Box<TypeNode>),
  /// Absence is valid
  Optional(Box<TypeNode>),
  /// Anonymous record
  Group(Vec<Member>),
  /// Numeric range with its bounds discarded
  Range(NumericKind),
}

impl TypeNode {
  /// Resolves a symbol to a predefined type or a qualified reference
  pub fn from_symbol(ident: &str, case: ModuleCase) -> TypeNode {
    match Builtin::lookup(ident) {
      Some(b) => TypeNode::Builtin(b),
      None => TypeNode::Ref(QualifiedName::new(ident, case)),
    }
  }

  /// Builds a choice. Nested unions are flattened, repeated alternatives are
  /// dropped and a single remaining alternative is returned as is.
  pub fn union<I>(first: TypeNode, rest: I) -> TypeNode
  where
    I: IntoIterator<Item = TypeNode>,
  {
    let mut alternatives: Vec<TypeNode> = Vec::new();

    for alternative in std::iter::once(first).chain(rest) {
      let members = match alternative {
        TypeNode::Union(members) => members,
        other => vec![other],
      };

      for member in members {
        if !alternatives.contains(&member) {
          alternatives.push(member);
        }
      }
    }

    if alternatives.len() == 1 {
      return alternatives.remove(0);
    }

    TypeNode::Union(alternatives)
  }

  /// Wraps in `Optional` unless already optional
  pub fn optional(node: TypeNode) -> TypeNode {
    match node {
      TypeNode::Optional(_) => node,
      other => TypeNode::Optional(Box::new(other)),
    }
  }

  /// Wraps in `Sequence`
  pub fn sequence(node: TypeNode) -> TypeNode {
    TypeNode::Sequence(Box::new(node))
  }

  /// Builds the type for a parenthesized member list, collapsing a single
  /// keyless member to that member's type
  pub fn group(mut members: Vec<Member>) -> TypeNode {
    if members.len() == 1 {
      if let Member::Type(_) = members[0] {
        if let Some(Member::Type(t)) = members.pop() {
          return t;
        }
      }
    }

    TypeNode::Group(members)
  }

  /// `Optional`, or a union admitting `null`
  pub fn is_optional(&self) -> bool {
    match self {
      TypeNode::Optional(_) => true,
      TypeNode::Union(members) => members.contains(&TypeNode::Literal(Value::NULL)),
      _ => false,
    }
  }
}

/// Error returned when a default qualifier is not a single literal
#[derive(Debug, Clone, PartialEq)]
pub struct NotALiteral(pub TypeNode);

impl TryFrom<&TypeNode> for Value {
  type Error = NotALiteral;

  fn try_from(node: &TypeNode) -> Result<Self, Self::Error> {
    match node {
      TypeNode::Literal(v) => Ok(v.clone()),
      other => Err(NotALiteral(other.clone())),
    }
  }
}

/// Member key with an optional default
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
  /// Key name
  pub name: QualifiedName,
  /// Value of a `.default` qualifier
  pub default: Option<Value>,
}

impl Key {
  /// Key without a default
  pub fn new(name: QualifiedName) -> Self {
    Key {
      name,
      default: None,
    }
  }
}

/// One key mapped to one type
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Pair {
  /// Member key
  pub key: Key,
  /// Member type
  pub value: TypeNode,
}

impl Pair {
  /// Whether the member may be absent
  pub fn is_optional(&self) -> bool {
    self.value.is_optional()
  }

  /// Value the member takes when absent: the explicit default, else `None`
  /// for optional members, else the value of a single literal type
  pub fn default_value(&self) -> Option<Value> {
    if let Some(default) = &self.key.default {
      return Some(default.clone());
    }

    if self.is_optional() {
      return Some(Value::NULL);
    }

    match &self.value {
      TypeNode::Literal(v) => Some(v.clone()),
      _ => None,
    }
  }

  /// Rendered default suffix, e.g. `" = None"`, or empty
  pub fn default_suffix(&self) -> String {
    self
      .default_value()
      .map(|v| format!(" = {}", v))
      .unwrap_or_default()
  }
}

/// Member of a record: a key/value pair or a keyless type
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
  /// `key: type`
  Pair(Pair),
  /// Keyless member, e.g. an included group or a choice alternative
  Type(TypeNode),
}

/// Body of an entry
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
  /// Body collapsed to one bare type
  Type(TypeNode),
  /// Record members
  Members(Vec<Member>),
}

impl From<Vec<Member>> for Params {
  fn from(mut members: Vec<Member>) -> Self {
    if members.len() == 1 {
      if let Member::Type(_) = members[0] {
        if let Some(Member::Type(t)) = members.pop() {
          return Params::Type(t);
        }
      }
    }

    Params::Members(members)
  }
}

/// Top-level named definition
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
  /// Entry name
  pub name: QualifiedName,
  /// Entry body
  pub params: Params,
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn int() -> TypeNode {
    TypeNode::Builtin(Builtin::Int)
  }

  #[test]
  fn verify_qualified_name() {
    let name = QualifiedName::new("browsingContext.Navigate", ModuleCase::Snake);
    assert_eq!(name.module.as_deref(), Some("browsing_context"));
    assert_eq!(name.name, "Navigate");
    assert_eq!(name.qualified(), "browsing_context.Navigate");

    let name = QualifiedName::new("browsingContext.Navigate", ModuleCase::Preserve);
    assert_eq!(name.qualified(), "browsingContext.Navigate");

    let name = QualifiedName::new("Navigate", ModuleCase::Snake);
    assert_eq!(name.module, None);
    assert_eq!(name.qualified(), "Navigate");
  }

  #[test]
  fn verify_snake_case() {
    assert_eq!(to_snake_case("Foo"), "foo");
    assert_eq!(to_snake_case("networkRequest"), "network_request");
    assert_eq!(to_snake_case("log"), "log");
  }

  #[test]
  fn verify_union_flattening() {
    assert_eq!(TypeNode::union(int(), vec![]), int());
    assert_eq!(TypeNode::union(int(), vec![int()]), int());

    let text = TypeNode::Builtin(Builtin::Str);
    let nested = TypeNode::union(int(), vec![text.clone()]);
    assert_eq!(
      TypeNode::union(nested, vec![int(), TypeNode::Literal(Value::NULL)]),
      TypeNode::Union(vec![int(), text, TypeNode::Literal(Value::NULL)])
    );
  }

  #[test]
  fn verify_optional_collapses() {
    let opt = TypeNode::optional(TypeNode::optional(int()));
    assert_eq!(opt, TypeNode::Optional(Box::new(int())));
    assert!(opt.is_optional());
    assert!(TypeNode::union(int(), vec![TypeNode::Literal(Value::NULL)]).is_optional());
    assert!(!TypeNode::Literal(Value::NULL).is_optional());
  }

  #[test]
  fn verify_default_suffix() {
    let pair = Pair {
      key: Key::new(QualifiedName::new("a", ModuleCase::Snake)),
      value: TypeNode::optional(int()),
    };
    assert_eq!(pair.default_suffix(), " = None");

    let pair = Pair {
      key: Key {
        name: QualifiedName::new("a", ModuleCase::Snake),
        default: Some(Value::INT(0)),
      },
      value: TypeNode::optional(int()),
    };
    assert_eq!(pair.default_suffix(), " = 0");

    let pair = Pair {
      key: Key::new(QualifiedName::new("method", ModuleCase::Snake)),
      value: TypeNode::Literal(Value::TEXT("log.entryAdded".into())),
    };
    assert_eq!(pair.default_suffix(), " = 'log.entryAdded'");

    let pair = Pair {
      key: Key::new(QualifiedName::new("a", ModuleCase::Snake)),
      value: int(),
    };
    assert_eq!(pair.default_suffix(), "");
  }

  #[test]
  fn verify_value_repr() {
    assert_eq!(Value::FLOAT(1.0).to_string(), "1.0");
    assert_eq!(Value::FLOAT(0.5).to_string(), "0.5");
    assert_eq!(Value::FLOAT(0.0001).to_string(), "0.0001");
    assert_eq!(Value::FLOAT(1e15).to_string(), "1000000000000000.0");
    assert_eq!(Value::FLOAT(1e16).to_string(), "1e+16");
    assert_eq!(Value::FLOAT(1e20).to_string(), "1e+20");
    assert_eq!(Value::FLOAT(-2.5e100).to_string(), "-2.5e+100");
    assert_eq!(Value::FLOAT(1.5e-7).to_string(), "1.5e-07");
    assert_eq!(Value::TEXT("it's".into()).to_string(), "\"it's\"");
    assert_eq!(Value::TEXT("a\"b'".into()).to_string(), "'a\"b\\''");
    assert_eq!(Value::BOOL(false).to_string(), "False");
  }

  #[test]
  fn verify_literal_unwrap() {
    assert_eq!(
      Value::try_from(&TypeNode::Literal(Value::INT(5))),
      Ok(Value::INT(5))
    );
    assert!(Value::try_from(&int()).is_err());
  }

  #[test]
  fn verify_params_flattening() {
    assert_eq!(
      Params::from(vec![Member::Type(int())]),
      Params::Type(int())
    );

    let pair = Member::Pair(Pair {
      key: Key::new(QualifiedName::new("a", ModuleCase::Snake)),
      value: int(),
    });
    assert_eq!(
      Params::from(vec![pair.clone()]),
      Params::Members(vec![pair])
    );
  }
}
