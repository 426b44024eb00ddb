//! # cddl-typing
//!
//! Compiles a constrained dialect of the Concise data definition language
//! (CDDL, [RFC 8610](https://tools.ietf.org/html/rfc8610)) into Python
//! `typing` annotations. The dialect is the one protocol specifications such
//! as WebDriver BiDi are written in: blank-line separated `name = value`
//! definitions, maps, groups, arrays, choices, ranges and `.default`
//! qualifiers.
//!
//! The pipeline runs in four stages:
//!
//! 1. [`normalizer`] rewrites raw text into one `name=value;` entry per
//!    block, drops comments, canonicalizes type names, filters entries by
//!    name and prunes entries built on unsupported operators (`=>`).
//! 2. [`lexer`] turns normalized text into a lazy stream of tokens, skipping
//!    illegal characters.
//! 3. [`parser`] builds the type model in [`ast`] with a recursive descent
//!    parser, recovering from errors one entry at a time.
//! 4. [`render`] serializes the type model to annotation text.
//!
//! ## Usage
//!
//! ```
//! use cddl_typing::{cddl_from_str, render::render_entries, Options};
//!
//! let input = r#"
//! script.ContextTarget = {
//!   context: browsingContext.BrowsingContext,
//!   ? sandbox: tstr
//! }
//! "#;
//!
//! let entries = cddl_from_str(input, &Options::default()).unwrap();
//!
//! assert_eq!(
//!   render_entries(&entries),
//!   "class ContextTarget:\n    context: browsing_context.BrowsingContext\n    sandbox: typing.Optional[str] = None\n"
//! );
//! ```
//!
//! Each stage can be driven on its own:
//!
//! ```
//! use cddl_typing::{lexer_from_str, normalize, parser::Parser};
//!
//! let normalized = normalize("a = uint / tstr\n", "").unwrap();
//! assert_eq!(normalized, "a=int//text;");
//!
//! assert_eq!(lexer_from_str(&normalized).count(), 7);
//!
//! let mut p = Parser::new(&normalized);
//! let entries = p.parse_cddl();
//! assert_eq!(entries.len(), 1);
//! assert!(p.errors.is_empty());
//! ```
//!
//! ## Error handling
//!
//! Illegal characters are logged and skipped. A single `/` in place of `//`
//! is accepted, and an unexpected parenthesized span is discarded. Any other
//! syntax error abandons only the entry it occurs in. All errors are
//! collected in [`Parser::errors`](parser::Parser) and can be rendered with
//! [`Parser::report_errors`](parser::Parser::report_errors).
//!
//! ## Command line
//!
//! With the default `std` feature a `cddl-typing` binary is built:
//!
//! ```sh
//! cddl-typing compile --cddl bidi.cddl --pattern '^script' -o script.py
//! cddl-typing normalize --cddl bidi.cddl
//! cddl-typing lex --cddl bidi.cddl
//! ```

#![warn(missing_docs)]

/// Type model
pub mod ast;
/// Error messages shared by the lexer and parser
pub mod error;
/// Lexer for normalized text
pub mod lexer;
pub mod normalizer;
pub mod parser;
pub mod render;
/// Token types
pub mod token;

#[doc(inline)]
pub use self::{
  lexer::{lexer_from_str, Error as LexerError},
  normalizer::normalize,
  parser::{cddl_from_str, Error as ParserError, Options},
  render::Render,
  token::Token,
};
