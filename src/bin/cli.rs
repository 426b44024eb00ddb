#[macro_use]
extern crate clap;

use cddl_typing::{
  ast::ModuleCase, lexer_from_str, normalizer::Normalizer, parser::Parser, render::render_entries,
};
use clap::{Arg, ArgMatches, Command};
use codespan_reporting::term::termcolor::{
  Buffer, BufferWriter, Color, ColorChoice, ColorSpec, WriteColor,
};
use simplelog::{ColorChoice as LogColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::{error::Error, fs, io::Write, path::Path, process};

fn cddl_arg() -> Arg<'static> {
  Arg::new("cddl")
    .short('c')
    .long("cddl")
    .value_name("FILE")
    .help("CDDL input file")
    .takes_value(true)
    .required(true)
}

fn pattern_arg() -> Arg<'static> {
  Arg::new("pattern")
    .short('p')
    .long("pattern")
    .value_name("PATTERN")
    .help("Only keep entries whose name matches PATTERN (case-insensitive)")
    .takes_value(true)
    .default_value("")
}

fn main() -> Result<(), Box<dyn Error>> {
  let app = Command::new("cddl-typing")
    .version(crate_version!())
    .about("Tool for compiling CDDL definitions to Python typing annotations")
    .subcommand_required(true)
    .arg_required_else_help(true)
    .arg(
      Arg::new("verbose")
        .short('v')
        .long("verbose")
        .multiple_occurrences(true)
        .global(true)
        .help("Increase log verbosity"),
    )
    .subcommand(
      Command::new("compile")
        .about("Compile CDDL to Python typing annotations")
        .arg(cddl_arg())
        .arg(pattern_arg())
        .arg(
          Arg::new("preserve-module-case")
            .long("preserve-module-case")
            .help("Keep module prefixes as written instead of snake_case"),
        )
        .arg(
          Arg::new("strict")
            .long("strict")
            .help("Fail if any entry could not be parsed"),
        )
        .arg(
          Arg::new("output")
            .short('o')
            .long("output")
            .value_name("OUT")
            .takes_value(true)
            .help("Write the output to OUT instead of stdout"),
        )
        .arg(
          Arg::new("json")
            .long("json")
            .help("Emit the type model as JSON"),
        ),
    )
    .subcommand(
      Command::new("normalize")
        .about("Print the normalized CDDL")
        .arg(cddl_arg())
        .arg(pattern_arg()),
    )
    .subcommand(
      Command::new("lex")
        .about("Print the token stream of the normalized CDDL")
        .arg(cddl_arg()),
    );

  let matches = app.get_matches();

  let level = match matches.occurrences_of("verbose") {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Info,
    2 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  };
  TermLogger::init(
    level,
    ConfigBuilder::new().set_time_level(LevelFilter::Off).build(),
    TerminalMode::Stderr,
    LogColorChoice::Auto,
  )?;

  let stdoutbuffwrtr = BufferWriter::stdout(ColorChoice::Auto);
  let mut stdout = stdoutbuffwrtr.buffer();

  let stderrbuffwrtr = BufferWriter::stderr(ColorChoice::Auto);
  let mut stderr = stderrbuffwrtr.buffer();
  stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;

  let (name, matches) = match matches.subcommand() {
    Some(subcommand) => subcommand,
    None => return Ok(()),
  };

  let file_content = match read_cddl(matches, &mut stderr) {
    Some(content) => content,
    None => {
      stderrbuffwrtr.print(&stderr)?;
      process::exit(1);
    }
  };

  match name {
    "compile" => {
      let pattern = matches.value_of("pattern").unwrap_or_default();
      let module_case = if matches.is_present("preserve-module-case") {
        ModuleCase::Preserve
      } else {
        ModuleCase::Snake
      };

      let normalized = Normalizer::new(pattern)?.normalize(&file_content)?;
      let mut p = Parser::new(&normalized).with_module_case(module_case);
      let entries = p.parse_cddl();

      if let Some(report) = p.report_errors() {
        writeln!(&mut stderr, "{}", report)?;
        stderrbuffwrtr.print(&stderr)?;

        if matches.is_present("strict") {
          process::exit(1);
        }
      }

      let output = if matches.is_present("json") {
        serde_json::to_string_pretty(&entries)?
      } else {
        render_entries(&entries)
      };

      match matches.value_of("output") {
        Some(out) => fs::write(out, output)?,
        None => {
          write!(&mut stdout, "{}", output)?;
          stdoutbuffwrtr.print(&stdout)?;
        }
      }
    }
    "normalize" => {
      let pattern = matches.value_of("pattern").unwrap_or_default();

      writeln!(&mut stdout, "{}", Normalizer::new(pattern)?.normalize(&file_content)?)?;
      stdoutbuffwrtr.print(&stdout)?;
    }
    "lex" => {
      let normalized = Normalizer::new("")?.normalize(&file_content)?;

      for item in lexer_from_str(&normalized) {
        match item {
          Ok((position, token)) => writeln!(&mut stdout, "{}\t{:?}", position, token)?,
          Err(e) => writeln!(&mut stderr, "{}", e)?,
        }
      }

      stdoutbuffwrtr.print(&stdout)?;
      stderrbuffwrtr.print(&stderr)?;
    }
    _ => (),
  }

  Ok(())
}

fn read_cddl(matches: &ArgMatches, stderr: &mut Buffer) -> Option<String> {
  let c = matches.value_of("cddl")?;

  let p = Path::new(c);
  if !p.exists() {
    writeln!(stderr, "CDDL document at path {:?} does not exist", p).ok()?;
    return None;
  }

  if let Some(e) = p.extension() {
    if e.to_string_lossy() != "cddl" {
      writeln!(stderr, "File \"{}\" must have the \".cddl\" extension", c).ok()?;
      return None;
    }
  }

  match fs::read_to_string(p) {
    Ok(content) => Some(content),
    Err(e) => {
      writeln!(stderr, "Could not read {:?}: {}", p, e).ok()?;
      None
    }
  }
}
