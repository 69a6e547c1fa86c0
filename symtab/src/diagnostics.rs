//! Typed complaints collected while the symbol table is built. The engine
//! records what went wrong; rendering is left to this sink.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, NoColor, StandardStream, WriteColor};
use std::fmt;

use crate::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  /// a hard error; the grammar is rejected
  Complaint,
  /// POSIX Yacc compatibility warning
  Yacc,
  /// warning about precedence and associativity declarations
  Precedence,
  /// any other warning
  Other,
}

impl Severity {
  pub fn is_error(self) -> bool {
    matches!(self, Severity::Complaint)
  }
}

/// What went wrong, with enough payload for the sink to format it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
  DashesInName { tag: String },
  Redeclaration { what: &'static str, tag: String },
  TypeRedeclaration { what: &'static str, tag: String },
  SymbolRedefined { tag: String },
  SymbolRedeclared { tag: String },
  UserTokenNumberRedefined { tag: String },
  StringUsedTwice { tag: String },
  MultipleLiteralStrings { tag: String },
  UndefinedSymbol { tag: String },
  UselessCodeProps { what: &'static str, tag: String },
  TypeUnassociated { tag: String },
  UserTokenNumberRedeclaration { number: i32, tag: String, prev_tag: String },
  MultipleStartDeclarations,
  UselessPrecedence { tag: String },
  UselessAssociativity { tag: String },
}

impl ErrorKind {
  /// Message for the nested "previous declaration" note, when one applies.
  pub fn note_message(&self) -> Option<String> {
    match self {
      ErrorKind::Redeclaration { .. } | ErrorKind::TypeRedeclaration { .. } => {
        Some("previous declaration".to_owned())
      }
      ErrorKind::UserTokenNumberRedeclaration { prev_tag, .. } => {
        Some(format!("previous declaration for {}", prev_tag))
      }
      _ => None,
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      ErrorKind::DashesInName { tag } => {
        write!(f, "POSIX Yacc forbids dashes in symbol names: {}", tag)
      }
      ErrorKind::Redeclaration { what, tag } => {
        write!(f, "{} redeclaration for {}", what, tag)
      }
      ErrorKind::TypeRedeclaration { what, tag } => {
        write!(f, "{} redeclaration for <{}>", what, tag)
      }
      ErrorKind::SymbolRedefined { tag } => write!(f, "symbol {} redefined", tag),
      ErrorKind::SymbolRedeclared { tag } => write!(f, "symbol {} redeclared", tag),
      ErrorKind::UserTokenNumberRedefined { tag } => {
        write!(f, "redefining user token number of {}", tag)
      }
      ErrorKind::StringUsedTwice { tag } => {
        write!(f, "symbol {} used more than once as a literal string", tag)
      }
      ErrorKind::MultipleLiteralStrings { tag } => {
        write!(f, "symbol {} given more than one literal string", tag)
      }
      ErrorKind::UndefinedSymbol { tag } => {
        write!(
          f,
          "symbol {} is used, but is not defined as a token and has no rules",
          tag
        )
      }
      ErrorKind::UselessCodeProps { what, tag } => {
        write!(f, "useless {} for type <{}>", what, tag)
      }
      ErrorKind::TypeUnassociated { tag } => {
        write!(f, "type <{}> is used, but is not associated to any symbol", tag)
      }
      ErrorKind::UserTokenNumberRedeclaration { number, tag, .. } => {
        write!(f, "user token number {} redeclaration for {}", number, tag)
      }
      ErrorKind::MultipleStartDeclarations => write!(f, "multiple %start declarations"),
      ErrorKind::UselessPrecedence { tag } => write!(f, "useless precedence for {}", tag),
      ErrorKind::UselessAssociativity { tag } => {
        write!(f, "useless associativity for {}", tag)
      }
    }
  }
}

/// A recorded diagnostic. `note` points at the previous declaration when
/// the kind carries one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Complaint {
  pub severity: Severity,
  pub location: Option<Location>,
  pub kind: ErrorKind,
  pub note: Option<Location>,
}

/// An unrecoverable condition; processing cannot continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalError {
  pub location: Option<Location>,
  pub kind: FatalErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalErrorKind {
  TooManySymbols { limit: i32 },
  StartSymbolUndefined { tag: String },
  StartSymbolIsToken { tag: String },
}

impl fmt::Display for FatalErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      FatalErrorKind::TooManySymbols { limit } => {
        write!(f, "too many symbols in input grammar (limit is {})", limit)
      }
      FatalErrorKind::StartSymbolUndefined { tag } => {
        write!(f, "the start symbol {} is undefined", tag)
      }
      FatalErrorKind::StartSymbolIsToken { tag } => {
        write!(f, "the start symbol {} is a token", tag)
      }
    }
  }
}

impl fmt::Display for FatalError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    self.kind.fmt(f)
  }
}

/// Collecting sink. Complaints accumulate and never abort.
#[derive(Debug, Default)]
pub struct Diagnostics {
  items: Vec<Complaint>,
}

impl Diagnostics {
  pub fn new() -> Self {
    Diagnostics { items: vec![] }
  }

  pub fn complain(&mut self, severity: Severity, location: Location, kind: ErrorKind) {
    self.items.push(Complaint {
      severity,
      location: Some(location),
      kind,
      note: None,
    });
  }

  pub fn complain_with_note(
    &mut self,
    severity: Severity,
    location: Location,
    kind: ErrorKind,
    note: Location,
  ) {
    self.items.push(Complaint {
      severity,
      location: Some(location),
      kind,
      note: Some(note),
    });
  }

  pub fn iter(&self) -> impl Iterator<Item = &Complaint> {
    self.items.iter()
  }

  pub fn complaints(&self) -> impl Iterator<Item = &Complaint> {
    self.items.iter().filter(|c| c.severity.is_error())
  }

  pub fn warnings(&self) -> impl Iterator<Item = &Complaint> {
    self.items.iter().filter(|c| !c.severity.is_error())
  }

  pub fn error_count(&self) -> usize {
    self.complaints().count()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Print every recorded diagnostic to stderr.
  pub fn print(&self, source_name: &str, source: &str) {
    let writer = StandardStream::stderr(ColorChoice::Always);
    self.emit(&mut writer.lock(), source_name, source);
  }

  /// Render every recorded diagnostic to a plain string.
  pub fn render(&self, source_name: &str, source: &str) -> String {
    let mut buf = NoColor::new(Vec::new());
    self.emit(&mut buf, source_name, source);
    String::from_utf8(buf.into_inner()).unwrap_or_default()
  }

  fn emit(&self, writer: &mut dyn WriteColor, source_name: &str, source: &str) {
    let config = term::Config::default();
    let files = SimpleFile::new(source_name, source);

    for complaint in &self.items {
      let diagnostic = if complaint.severity.is_error() {
        Diagnostic::error()
      } else {
        Diagnostic::warning()
      };

      let mut labels = vec![];
      if let Some(loc) = complaint.location {
        labels.push(Label::primary((), loc.range()).with_message(complaint.kind.to_string()));
      }
      if let (Some(loc), Some(message)) = (complaint.note, complaint.kind.note_message()) {
        labels.push(Label::secondary((), loc.range()).with_message(message));
      }

      let diagnostic = diagnostic
        .with_message(complaint.kind.to_string())
        .with_labels(labels);

      term::emit(writer, &config, &files, &diagnostic).unwrap();
    }
  }
}
