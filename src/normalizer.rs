//! Rewrites raw schema text into the strict form accepted by the lexer: one
//! `name=value;` entry per blank-line-separated block, no whitespace or
//! comments, canonical type names and a single choice operator.
//!
//! Entries built on unsupported operators are dropped, and their names are
//! recorded so that references to them elsewhere can be pruned as well.

use regex::{Captures, Regex, RegexBuilder};

/// Operators the type model has no counterpart for
pub const UNSUPPORTED_OPERATORS: &[&str] = &["=>"];

/// Normalizes `text`, keeping only entries whose name matches `pattern`
/// (case-insensitive; an empty pattern keeps everything). Each call uses a
/// fresh unsupported-name registry.
///
/// # Example
///
/// ```
/// use cddl_typing::normalize;
///
/// let text = "; comment\nfoo.Bar = {\n  a: uint\n  b: tstr\n}\n\nbaz = int\n";
///
/// assert_eq!(normalize(text, "^foo").unwrap(), "foo.Bar={a:int,b:text,};");
/// ```
pub fn normalize(text: &str, pattern: &str) -> Result<String, regex::Error> {
  Normalizer::new(pattern)?.normalize(text)
}

/// Text normalizer owning the registry of unsupported entry names
#[derive(Debug)]
pub struct Normalizer {
  pattern: Regex,
  unsupported: Vec<String>,
  substitutions: Vec<(Regex, &'static str)>,
  and_suffix: Regex,
  entry: Regex,
  entry_separator: Regex,
  pair: Regex,
  member: Regex,
  dangling_choice: Regex,
  empty_body: Regex,
  delimiter: Regex,
}

impl Normalizer {
  /// Creates a normalizer filtering entry names with `pattern`
  pub fn new(pattern: &str) -> Result<Self, regex::Error> {
    Ok(Normalizer {
      pattern: RegexBuilder::new(pattern).case_insensitive(true).build()?,
      unsupported: Vec::new(),
      substitutions: vec![
        (Regex::new(r"\bjs-uint\b")?, "int"),
        (Regex::new(r"\bjs-int\b")?, "int"),
        (Regex::new(r"\buint\b")?, "int"),
        (Regex::new(r"\btstr\b")?, "text"),
        (
          Regex::new(r"\b(float|int)\s*\.(?:ge|le|gt|lt)\s*\d+(?:\.\d+)?")?,
          "$1",
        ),
      ],
      and_suffix: Regex::new(r"\}\s*\.and\b.*")?,
      entry: Regex::new(r"(?s)^\s*([\w.-]+)\s*=\s*(.+?)\s*$")?,
      entry_separator: Regex::new(r"\n[ \t]*\n")?,
      pair: Regex::new(
        r"(?m)[?*+]?\s*[A-Za-z_][\w.-]*\s*:\s*\[?\s*[*+]?\s*(?P<name>[A-Za-z_][\w.-]*)\s*\]?(?P<end>[ \t]*(?:,|$|[)}\]]))",
      )?,
      member: Regex::new(r"/*\s*[?*+]?\s*(?P<name>[A-Za-z_][\w.-]*)(?P<tail>\s*[,:]?)")?,
      dangling_choice: Regex::new(r"(?P<open>[{(,:\[])\s*/+")?,
      empty_body: Regex::new(r"\{[,\s]*\}|\([,\s]*\)|\[[,\s]*\]")?,
      delimiter: Regex::new(r"[{}()\[\]]")?,
    })
  }

  /// Names of entries dropped so far
  pub fn unsupported(&self) -> &[String] {
    &self.unsupported
  }

  /// Normalizes `text`. Dropped names accumulate in this normalizer's
  /// registry.
  pub fn normalize(&mut self, text: &str) -> Result<String, regex::Error> {
    let text = remove_comments(&text.replace("\r\n", "\n"));
    let text = self.prune(&text);

    let entries = self
      .entry_separator
      .split(&text)
      .filter(|e| !e.trim().is_empty())
      .filter_map(|e| match self.split_entry(e) {
        Some(entry) => Some(entry),
        None => {
          log::debug!("skipping malformed entry {:?}", e.trim());
          None
        }
      })
      .collect::<Vec<_>>();

    for (name, value) in entries.iter() {
      if is_unsupported(value) {
        log::debug!("dropping {}: unsupported operator", name);
        self.register(name);
      }
    }

    // Pruning can empty an entry, which in turn prunes its referrers
    loop {
      let registered = self.unsupported.len();

      for (name, value) in entries.iter() {
        if !self.is_registered(name) && self.is_empty(&self.remove_unsupported(value)) {
          log::debug!("dropping {}: empty body", name);
          self.register(name);
        }
      }

      if self.unsupported.len() == registered {
        break;
      }
    }

    let mut normalized = Vec::with_capacity(entries.len());
    for (name, value) in entries.iter() {
      if self.is_registered(name) {
        continue;
      }

      if !self.pattern.is_match(name) {
        log::debug!("filtering {}: no match for {:?}", name, self.pattern.as_str());
        continue;
      }

      let value = self.remove_unsupported(value);
      let value = self.fix_comma(&value);
      let value = ensure_semicolon(&remove_spaces(&value));

      normalized.push(format!("{}={}", name, value));
    }

    Ok(collapse_slashes(&normalized.join("\n\n")))
  }

  fn register(&mut self, name: &str) {
    if !self.is_registered(name) {
      self.unsupported.push(name.to_string());
    }
  }

  fn is_registered(&self, name: &str) -> bool {
    self.unsupported.iter().any(|u| u == name)
  }

  fn prune(&self, text: &str) -> String {
    let text = map_unquoted(text, |segment| {
      self
        .substitutions
        .iter()
        .fold(segment.to_string(), |segment, (re, rep)| {
          re.replace_all(&segment, *rep).into_owned()
        })
    });

    self.and_suffix.replace_all(&text, "}").into_owned()
  }

  fn split_entry(&self, entry: &str) -> Option<(String, String)> {
    let caps = self.entry.captures(entry.trim())?;

    Some((caps[1].to_string(), caps[2].to_string()))
  }

  // Removes members referring to unsupported names: a keyless member with its
  // occurrence marker and choice operator, or a whole pair whose value is
  // only such a name. Member keys and quoted text are left alone.
  fn remove_unsupported(&self, value: &str) -> String {
    if self.unsupported.is_empty() {
      return value.to_string();
    }

    let pruned = map_unquoted(value, |segment| {
      let segment = self.pair.replace_all(segment, |caps: &Captures| {
        if !self.is_registered(&caps["name"]) {
          return caps[0].to_string();
        }

        caps["end"].trim_start_matches(|c: char| c == ',' || c.is_whitespace()).to_string()
      });

      let segment = self.member.replace_all(&segment, |caps: &Captures| {
        if self.is_registered(&caps["name"]) && !caps["tail"].contains(':') {
          String::new()
        } else {
          caps[0].to_string()
        }
      });

      self
        .dangling_choice
        .replace_all(&segment, "$open")
        .into_owned()
    });

    pruned.trim_start().trim_start_matches('/').to_string()
  }

  fn is_empty(&self, value: &str) -> bool {
    value.trim().trim_end_matches(';').trim().is_empty() || self.empty_body.is_match(value)
  }

  // Terminates every member line of a multi-line group with a comma
  fn fix_comma(&self, value: &str) -> String {
    if !self.delimiter.is_match(value) {
      return value.to_string();
    }

    value
      .lines()
      .map(|line| {
        let line = line.trim();
        if line.is_empty() || self.delimiter.is_match(line) || line.contains('/') {
          return line.to_string();
        }

        format!("{},", line.trim_end_matches(','))
      })
      .collect::<Vec<_>>()
      .join("\n")
  }
}

fn is_unsupported(value: &str) -> bool {
  UNSUPPORTED_OPERATORS.iter().any(|op| value.contains(op))
}

// Drops whole-line comments and cuts inline ones
fn remove_comments(text: &str) -> String {
  let mut out = String::with_capacity(text.len());

  for line in text.split_inclusive('\n') {
    if line.trim_start().starts_with(';') {
      continue;
    }

    match comment_start(line) {
      Some(idx) => {
        out.push_str(line[..idx].trim_end());
        if line.ends_with('\n') {
          out.push('\n');
        }
      }
      None => out.push_str(line),
    }
  }

  out
}

fn comment_start(line: &str) -> Option<usize> {
  let mut quoted = false;

  for (idx, ch) in line.char_indices() {
    match ch {
      '"' => quoted = !quoted,
      ';' if !quoted => return Some(idx),
      _ => (),
    }
  }

  None
}

// Applies `f` to the parts of `text` outside double-quoted literals
fn map_unquoted<F>(text: &str, f: F) -> String
where
  F: Fn(&str) -> String,
{
  text
    .split('"')
    .enumerate()
    .map(|(idx, segment)| {
      if idx % 2 == 0 {
        f(segment)
      } else {
        segment.to_string()
      }
    })
    .collect::<Vec<_>>()
    .join("\"")
}

fn remove_spaces(value: &str) -> String {
  map_unquoted(value, |s| s.chars().filter(|c| !c.is_whitespace()).collect())
}

fn ensure_semicolon(value: &str) -> String {
  format!("{};", value.trim_end_matches(';'))
}

// Any run of '/' becomes the choice operator '//'
fn collapse_slashes(text: &str) -> String {
  map_unquoted(text, |s| {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
      if ch == '/' {
        while chars.peek() == Some(&'/') {
          chars.next();
        }
        out.push_str("//");
      } else {
        out.push(ch);
      }
    }

    out
  })
}
