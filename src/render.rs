//! Serializes the type model to Python `typing` annotations.
//!
//! Rendering is pure: the same node and module always produce the same text.
//! References into `module` render as bare names, all others fully qualified.

use super::ast::*;
use itertools::{Either, Itertools};
use std::fmt;

/// Words that cannot be used as a field name as is
const RESERVED_KEYS: &[&str] = &[
  "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
  "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in",
  "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "type", "while",
  "with", "yield",
];

const INDENT: &str = "    ";

/// Canonical type-annotation text
pub trait Render {
  /// Renders `self` as seen from inside `module`
  fn render(&self, module: Option<&str>) -> String;
}

/// Renders each entry within its own module, separated by blank lines
///
/// # Example
///
/// ```
/// use cddl_typing::{cddl_from_str, render::render_entries, Options};
///
/// let entries = cddl_from_str("log.Level = \"debug\" / \"info\"\n", &Options::default()).unwrap();
///
/// assert_eq!(render_entries(&entries), "Level = typing.Literal['debug', 'info']\n");
/// ```
pub fn render_entries(entries: &[Entry]) -> String {
  if entries.is_empty() {
    return String::new();
  }

  format!("{}\n", entries.iter().join("\n\n"))
}

fn escape_key(key: &str) -> String {
  if RESERVED_KEYS.contains(&key) {
    return format!("{}_", key);
  }

  key.to_string()
}

impl Render for Value {
  fn render(&self, _module: Option<&str>) -> String {
    self.to_string()
  }
}

impl Render for Builtin {
  fn render(&self, _module: Option<&str>) -> String {
    match self {
      Builtin::Int => "int",
      Builtin::Float => "float",
      Builtin::Str => "str",
      Builtin::Bool => "bool",
      Builtin::Bytes => "bytes",
      Builtin::Dict => "dict",
      Builtin::Any => "typing.Any",
    }
    .to_string()
  }
}

impl Render for QualifiedName {
  fn render(&self, module: Option<&str>) -> String {
    if self.in_module(module) {
      return self.name.clone();
    }

    self.qualified()
  }
}

impl Render for TypeNode {
  fn render(&self, module: Option<&str>) -> String {
    match self {
      TypeNode::Builtin(b) => b.render(module),
      TypeNode::Ref(name) => name.render(module),
      TypeNode::Literal(Value::NULL) => "None".to_string(),
      TypeNode::Literal(v) => format!("typing.Literal[{}]", v),
      TypeNode::Union(members) => render_union(members, module),
      TypeNode::Sequence(inner) => format!("typing.List[{}]", inner.render(module)),
      TypeNode::Optional(inner) if inner.is_optional() => inner.render(module),
      TypeNode::Optional(inner) => format!("typing.Optional[{}]", inner.render(module)),
      TypeNode::Group(members) => render_group(members, module),
      TypeNode::Range(NumericKind::Int) => "int".to_string(),
      TypeNode::Range(NumericKind::Float) => "float".to_string(),
    }
  }
}

fn render_union(members: &[TypeNode], module: Option<&str>) -> String {
  let null = TypeNode::Literal(Value::NULL);

  if members.contains(&null) {
    let mut rest = members.iter().filter(|m| **m != null).cloned();

    return match rest.next() {
      Some(first) => format!(
        "typing.Optional[{}]",
        TypeNode::union(first, rest).render(module)
      ),
      None => "None".to_string(),
    };
  }

  match members {
    [] => "None".to_string(),
    [single] => single.render(module),
    _ => {
      let literals = members
        .iter()
        .map(|m| match m {
          TypeNode::Literal(v) => Some(v),
          _ => None,
        })
        .collect::<Option<Vec<_>>>();

      match literals {
        Some(values) => format!("typing.Literal[{}]", values.iter().join(", ")),
        None => format!(
          "typing.Union[{}]",
          members.iter().map(|m| m.render(module)).join(", ")
        ),
      }
    }
  }
}

fn render_typed_dict(pairs: &[&Pair], module: Option<&str>) -> String {
  let fields = pairs
    .iter()
    .map(|p| {
      format!(
        "{}: {}",
        Value::TEXT(p.key.name.qualified()),
        p.value.render(module)
      )
    })
    .join(", ");

  format!("typing.TypedDict('Group', {{{}}})", fields)
}

// Keyless members become alternatives, pairs a single anonymous TypedDict
fn render_group(members: &[Member], module: Option<&str>) -> String {
  let (pairs, bare): (Vec<&Pair>, Vec<TypeNode>) = members.iter().partition_map(|m| match m {
    Member::Pair(p) => Either::Left(p),
    Member::Type(t) => Either::Right(t.clone()),
  });

  let mut bare = bare.into_iter();
  let alternatives = match bare.next() {
    Some(first) => TypeNode::union(first, bare),
    None => return render_typed_dict(&pairs, module),
  };

  if pairs.is_empty() {
    return alternatives.render(module);
  }

  let mut rendered: Vec<String> = match alternatives {
    TypeNode::Union(members) => members.iter().map(|m| m.render(module)).collect(),
    other => vec![other.render(module)],
  };
  rendered.push(render_typed_dict(&pairs, module));

  format!("typing.Union[{}]", rendered.join(", "))
}

impl Render for Pair {
  fn render(&self, module: Option<&str>) -> String {
    format!(
      "{}: {}{}",
      escape_key(&self.key.name.qualified()),
      self.value.render(module),
      self.default_suffix()
    )
  }
}

impl Render for Member {
  fn render(&self, module: Option<&str>) -> String {
    match self {
      Member::Pair(p) => p.render(module),
      Member::Type(t) => t.render(module),
    }
  }
}

impl Render for Entry {
  fn render(&self, module: Option<&str>) -> String {
    let members = match &self.params {
      Params::Type(t) => return format!("{} = {}", self.name.name, t.render(module)),
      Params::Members(members) => members,
    };

    let bases = members
      .iter()
      .filter_map(|m| match m {
        Member::Type(t) => Some(t.render(module)),
        Member::Pair(_) => None,
      })
      .join(", ");

    let mut lines = vec![if bases.is_empty() {
      format!("class {}:", self.name.name)
    } else {
      format!("class {}({}):", self.name.name, bases)
    }];

    for member in members.iter() {
      if let Member::Pair(p) = member {
        lines.push(format!("{}{}", INDENT, p.render(module)));
      }
    }

    if lines.len() == 1 {
      lines.push(format!("{}pass", INDENT));
    }

    lines.join("\n")
  }
}

impl fmt::Display for Entry {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.render(self.name.module.as_deref()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use indoc::indoc;
  use pretty_assertions::assert_eq;

  fn int() -> TypeNode {
    TypeNode::Builtin(Builtin::Int)
  }

  fn text(s: &str) -> TypeNode {
    TypeNode::Literal(Value::TEXT(s.into()))
  }

  fn reference(raw: &str) -> TypeNode {
    TypeNode::Ref(QualifiedName::new(raw, ModuleCase::Snake))
  }

  fn pair(name: &str, value: TypeNode) -> Pair {
    Pair {
      key: Key::new(QualifiedName::new(name, ModuleCase::Snake)),
      value,
    }
  }

  #[test]
  fn verify_single_alternative_union() {
    for node in vec![
      int(),
      text("a"),
      reference("script.Target"),
      TypeNode::sequence(int()),
      TypeNode::optional(reference("Other")),
    ] {
      assert_eq!(
        TypeNode::Union(vec![node.clone()]).render(None),
        node.render(None)
      );
    }
  }

  #[test]
  fn verify_union_rendering() {
    let null = TypeNode::Literal(Value::NULL);
    let s = TypeNode::Builtin(Builtin::Str);

    assert_eq!(
      TypeNode::union(int(), vec![null.clone()]).render(None),
      "typing.Optional[int]"
    );
    assert_eq!(
      TypeNode::union(int(), vec![s.clone(), null]).render(None),
      "typing.Optional[typing.Union[int, str]]"
    );
    assert_eq!(
      TypeNode::union(text("none"), vec![text("complete")]).render(None),
      "typing.Literal['none', 'complete']"
    );
    assert_eq!(
      TypeNode::union(text("none"), vec![s]).render(None),
      "typing.Union[typing.Literal['none'], str]"
    );
  }

  #[test]
  fn verify_reference_qualification() {
    let node = reference("browsingContext.BrowsingContext");

    assert_eq!(node.render(Some("browsing_context")), "BrowsingContext");
    assert_eq!(
      node.render(Some("script")),
      "browsing_context.BrowsingContext"
    );
    assert_eq!(node.render(None), "browsing_context.BrowsingContext");
    assert_eq!(reference("Local").render(Some("script")), "Local");
  }

  #[test]
  fn verify_scalar_rendering() {
    assert_eq!(TypeNode::Literal(Value::NULL).render(None), "None");
    assert_eq!(
      TypeNode::Literal(Value::BOOL(true)).render(None),
      "typing.Literal[True]"
    );
    assert_eq!(TypeNode::Range(NumericKind::Float).render(None), "float");
    assert_eq!(TypeNode::Builtin(Builtin::Any).render(None), "typing.Any");
    assert_eq!(
      TypeNode::optional(TypeNode::sequence(int())).render(None),
      "typing.Optional[typing.List[int]]"
    );
    assert_eq!(
      TypeNode::optional(TypeNode::union(int(), vec![TypeNode::Literal(Value::NULL)]))
        .render(None),
      "typing.Optional[int]"
    );
  }

  #[test]
  fn verify_pair_rendering() {
    assert_eq!(
      pair("type", text("event")).render(None),
      "type_: typing.Literal['event'] = 'event'"
    );
    assert_eq!(
      pair("class", TypeNode::optional(int())).render(None),
      "class_: typing.Optional[int] = None"
    );

    let mut p = pair("count", int());
    p.key.default = Some(Value::INT(0));
    assert_eq!(p.render(None), "count: int = 0");
  }

  #[test]
  fn verify_group_rendering() {
    let pairs = TypeNode::Group(vec![
      Member::Pair(pair("a", int())),
      Member::Pair(pair("b", TypeNode::optional(int()))),
    ]);
    assert_eq!(
      pairs.render(None),
      "typing.TypedDict('Group', {'a': int, 'b': typing.Optional[int]})"
    );

    let bare = TypeNode::Group(vec![
      Member::Type(reference("A")),
      Member::Type(reference("B")),
    ]);
    assert_eq!(bare.render(None), "typing.Union[A, B]");

    let mixed = TypeNode::Group(vec![
      Member::Type(reference("A")),
      Member::Pair(pair("a", int())),
    ]);
    assert_eq!(
      mixed.render(None),
      "typing.Union[A, typing.TypedDict('Group', {'a': int})]"
    );
  }

  #[test]
  fn verify_entry_rendering() {
    let entry = Entry {
      name: QualifiedName::new("script.ContextTarget", ModuleCase::Snake),
      params: Params::Members(vec![
        Member::Type(reference("script.BaseTarget")),
        Member::Pair(pair("context", reference("browsingContext.BrowsingContext"))),
        Member::Pair(pair("sandbox", TypeNode::optional(TypeNode::Builtin(Builtin::Str)))),
      ]),
    };

    assert_eq!(
      entry.to_string(),
      indoc!(
        r#"
          class ContextTarget(BaseTarget):
              context: browsing_context.BrowsingContext
              sandbox: typing.Optional[str] = None"#
      )
    );

    let entry = Entry {
      name: QualifiedName::new("script.Empty", ModuleCase::Snake),
      params: Params::Members(vec![
        Member::Type(reference("A")),
        Member::Type(reference("B")),
      ]),
    };
    assert_eq!(entry.to_string(), "class Empty(A, B):\n    pass");

    let entry = Entry {
      name: QualifiedName::new("script.Target", ModuleCase::Snake),
      params: Params::Type(TypeNode::union(
        reference("script.RealmTarget"),
        vec![reference("script.ContextTarget")],
      )),
    };
    assert_eq!(
      entry.to_string(),
      "Target = typing.Union[RealmTarget, ContextTarget]"
    );
  }

  #[test]
  fn verify_render_entries() {
    let entries = vec![
      Entry {
        name: QualifiedName::new("A", ModuleCase::Snake),
        params: Params::Type(int()),
      },
      Entry {
        name: QualifiedName::new("B", ModuleCase::Snake),
        params: Params::Members(vec![Member::Pair(pair("a", reference("A")))]),
      },
    ];

    assert_eq!(render_entries(&entries), "A = int\n\nclass B:\n    a: A\n");
    assert_eq!(render_entries(&[]), "");
  }
}
