use cddl_typing::{
  ast::*,
  cddl_from_str,
  normalizer::Normalizer,
  parser::{self, Parser},
  render::render_entries,
  Options,
};
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::fs;

#[test]
fn verify_bidi_compiles() -> parser::Result<()> {
  let input = fs::read_to_string("tests/fixtures/bidi.cddl").unwrap();
  let entries = cddl_from_str(&input, &Options::default().with_strict(true))?;

  assert_eq!(
    render_entries(&entries),
    indoc!(
      r#"
        class CapabilitiesRequest:
            alwaysMatch: typing.Optional[CapabilityRequest] = None
            firstMatch: typing.Optional[typing.List[CapabilityRequest]] = None

        class CapabilityRequest:
            acceptInsecureCerts: typing.Optional[bool] = None
            browserName: typing.Optional[str] = None
            browserVersion: typing.Optional[str] = None
            platformName: typing.Optional[str] = None
            proxy: typing.Optional[ProxyConfiguration] = None

        class ProxyConfiguration:
            proxyType: typing.Literal['direct', 'manual', 'system']
            ftpProxy: typing.Optional[str] = ''
            httpProxy: typing.Optional[str] = None

        Level = typing.Literal['debug', 'info', 'warn', 'error']

        Entry = typing.Union[GenericLogEntry, ConsoleLogEntry]

        class BaseLogEntry:
            level: Level
            text: typing.Optional[str] = None
            timestamp: int
            stackTrace: typing.Optional[script.StackTrace] = None

        class GenericLogEntry(BaseLogEntry):
            type_: str

        class SetViewportParameters:
            context: BrowsingContext
            devicePixelRatio: typing.Optional[float] = None
            width: typing.Optional[int] = None
            type_: typing.Literal['viewport'] = 'viewport'
      "#
    )
  );

  Ok(())
}

#[test]
fn verify_unsupported_entries_are_pruned() -> parser::Result<()> {
  let input = fs::read_to_string("tests/fixtures/bidi.cddl").unwrap();

  let mut normalizer = Normalizer::new("^session")?;
  let normalized = normalizer.normalize(&input)?;
  assert_eq!(normalizer.unsupported(), ["Extensible"]);

  let mut p = Parser::new(&normalized);
  let entries = p.parse_cddl();
  assert!(p.errors.is_empty());

  let names = entries
    .iter()
    .map(|e| e.name.qualified())
    .collect::<Vec<_>>();
  assert_eq!(
    names,
    [
      "session.CapabilitiesRequest",
      "session.CapabilityRequest",
      "session.ProxyConfiguration"
    ]
  );

  let refers_to_pruned = |m: &Member| match m {
    Member::Type(TypeNode::Ref(name)) => name.name == "Extensible",
    _ => false,
  };
  for entry in entries.iter() {
    if let Params::Members(members) = &entry.params {
      assert!(!members.iter().any(refers_to_pruned));
    }
  }

  Ok(())
}

#[test]
fn verify_members_referring_to_pruned_entries_are_dropped() -> parser::Result<()> {
  let input = indoc!(
    r#"
      Optional = {
        a: int,
        ? Ext
      }

      Keyed = {
        a: int,
        b: Ext
      }

      Ext = (*text => any)
    "#
  );

  let entries = cddl_from_str(input, &Options::default().with_strict(true))?;

  assert_eq!(
    render_entries(&entries),
    indoc!(
      r#"
        class Optional:
            a: int

        class Keyed:
            a: int
      "#
    )
  );

  Ok(())
}

#[test]
fn verify_malformed_entries_are_skipped() {
  let input = fs::read_to_string("tests/fixtures/malformed.cddl").unwrap();
  let normalized = cddl_typing::normalize(&input, "").unwrap();

  let mut p = Parser::new(&normalized);
  let entries = p.parse_cddl();

  assert_eq!(
    render_entries(&entries),
    indoc!(
      r#"
        Handle = str

        class Unbalanced:
            value: int
            ownership: typing.Optional[typing.Literal['root', 'none']] = None

        Doubled = typing.Union[int, str]
      "#
    )
  );

  assert_eq!(p.errors.len(), 1);
  assert!(p
    .report_errors()
    .unwrap()
    .contains("invalid group entry syntax"));

  assert!(matches!(
    cddl_from_str(&input, &Options::default().with_strict(true)),
    Err(parser::Error::INCREMENTAL)
  ));
}

#[test]
fn verify_preserved_module_case() -> parser::Result<()> {
  let input = indoc!(
    r#"
      browsingContext.Info = {
        context: browsingContext.BrowsingContext,
        parent: script.Realm / null
      }
    "#
  );

  let options = Options::default().with_module_case(ModuleCase::Preserve);
  let entries = cddl_from_str(input, &options)?;

  assert_eq!(entries[0].name.qualified(), "browsingContext.Info");
  assert_eq!(
    entries[0].to_string(),
    indoc!(
      r#"
        class Info:
            context: BrowsingContext
            parent: typing.Optional[script.Realm] = None"#
    )
  );

  Ok(())
}

#[cfg(feature = "std")]
#[test]
fn verify_json_serialization() -> parser::Result<()> {
  let entries = cddl_from_str("a = [+ int]\n", &Options::default())?;

  assert_eq!(
    serde_json::to_value(&entries).unwrap(),
    serde_json::json!([{
      "name": { "module": null, "name": "a" },
      "params": { "Type": { "Sequence": { "Builtin": "Int" } } }
    }])
  );

  Ok(())
}
