//! Hash-indexed symbol and semantic-type stores, and the mutators the
//! grammar parser drives while reading declarations.

use itertools::Itertools;

use crate::diagnostics::{Diagnostics, ErrorKind, FatalError, FatalErrorKind, Severity};
use crate::intern::{Interner, Tag};
use crate::location::Location;
use crate::semantic_type::{SemanticType, TypeId};
use crate::symbol::{
  Assoc, CodePropKind, CodeProps, Status, Symbol, SymbolClass, SymbolId,
  NUMBER_UNDEFINED, SYMBOL_NUMBER_MAXIMUM, USER_NUMBER_HAS_STRING_ALIAS,
  USER_NUMBER_UNDEFINED,
};
use crate::Map;

static CODE_PROPS_NONE: CodeProps = CodeProps::NONE;

enum PropsOwner {
  Symbol(SymbolId),
  Type(TypeId),
  None,
}

pub struct SymbolTable {
  interner: Interner,
  symbols: Vec<Symbol>,
  by_tag: Map<Tag, SymbolId>,
  types: Vec<SemanticType>,
  types_by_tag: Map<Tag, TypeId>,
  /// Materialized by the first sorted sweep, after which no more symbols
  /// may be created.
  symbols_sorted: Option<Vec<SymbolId>>,
  types_sorted: Option<Vec<TypeId>>,
  pub diagnostics: Diagnostics,
  pub(crate) nsyms: i32,
  pub(crate) ntokens: i32,
  pub(crate) nvars: i32,
  pub accept: SymbolId,
  pub errtoken: SymbolId,
  pub undeftoken: SymbolId,
  pub endtoken: Option<SymbolId>,
  pub start: Option<SymbolId>,
  pub start_location: Location,
  dummy_count: u32,
  pub(crate) packed: Vec<SymbolId>,
  pub(crate) token_translations: Vec<i32>,
  pub(crate) max_user_token_number: i32,
}

impl SymbolTable {
  pub fn new() -> Self {
    let mut table = SymbolTable {
      interner: Interner::new(),
      symbols: vec![],
      by_tag: Map::default(),
      types: vec![],
      types_by_tag: Map::default(),
      symbols_sorted: None,
      types_sorted: None,
      diagnostics: Diagnostics::new(),
      nsyms: 0,
      // Token number 0 is reserved for the end-of-input token.
      ntokens: 1,
      nvars: 0,
      accept: SymbolId(0),
      errtoken: SymbolId(0),
      undeftoken: SymbolId(0),
      endtoken: None,
      start: None,
      start_location: Location::default(),
      dummy_count: 0,
      packed: vec![],
      token_translations: vec![],
      max_user_token_number: 0,
    };

    let accept = table.insert_new_str("$accept", Location::default());
    table.symbols[accept.index()].class = SymbolClass::Nterm;
    table.symbols[accept.index()].number = table.nvars;
    table.nvars += 1;
    table.accept = accept;

    let errtoken = table.insert_new_str("error", Location::default());
    table.symbols[errtoken.index()].class = SymbolClass::Token;
    table.symbols[errtoken.index()].number = table.ntokens;
    table.ntokens += 1;
    table.errtoken = errtoken;

    // Represents all undefined literal tokens.
    let undeftoken = table.insert_new_str("$undefined", Location::default());
    table.symbols[undeftoken.index()].class = SymbolClass::Token;
    table.symbols[undeftoken.index()].number = table.ntokens;
    table.ntokens += 1;
    table.undeftoken = undeftoken;

    table
  }

  /// Find the symbol named `key`, creating it if it does not exist yet.
  pub fn get(&mut self, key: &str, loc: Location) -> Result<SymbolId, FatalError> {
    let tag = self.interner.intern(key);
    if let Some(&id) = self.by_tag.get(&tag) {
      return Ok(id);
    }
    if self.nsyms >= SYMBOL_NUMBER_MAXIMUM {
      return Err(FatalError {
        location: None,
        kind: FatalErrorKind::TooManySymbols {
          limit: SYMBOL_NUMBER_MAXIMUM,
        },
      });
    }
    Ok(self.insert_new(tag, loc))
  }

  /// Non-creating lookup.
  pub fn lookup(&self, key: &str) -> Option<SymbolId> {
    let tag = self.interner.lookup(key)?;
    self.by_tag.get(&tag).copied()
  }

  fn insert_new_str(&mut self, key: &str, loc: Location) -> SymbolId {
    let tag = self.interner.intern(key);
    self.insert_new(tag, loc)
  }

  fn insert_new(&mut self, tag: Tag, loc: Location) -> SymbolId {
    assert!(
      self.symbols_sorted.is_none(),
      "symbol created after the table was sorted"
    );

    // A tag that is not a literal string must not contain dashes in
    // POSIX Yacc.
    let name = self.interner.resolve(tag);
    if !name.starts_with('"') && !name.starts_with('\'') && name.contains('-') {
      let kind = ErrorKind::DashesInName {
        tag: name.to_owned(),
      };
      self.diagnostics.complain(Severity::Yacc, loc, kind);
    }

    let id = SymbolId(self.symbols.len() as u32);
    self.symbols.push(Symbol::new(tag, loc));
    self.by_tag.insert(tag, id);
    self.nsyms += 1;
    id
  }

  pub fn symbol(&self, id: SymbolId) -> &Symbol {
    &self.symbols[id.index()]
  }

  pub(crate) fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
    &mut self.symbols[id.index()]
  }

  pub fn name(&self, id: SymbolId) -> &str {
    self.interner.resolve(self.symbols[id.index()].tag)
  }

  pub fn resolve(&self, tag: Tag) -> &str {
    self.interner.resolve(tag)
  }

  pub fn intern(&mut self, key: &str) -> Tag {
    self.interner.intern(key)
  }

  pub fn nsyms(&self) -> usize {
    self.nsyms as usize
  }

  pub fn ntokens(&self) -> usize {
    self.ntokens as usize
  }

  pub fn nvars(&self) -> usize {
    self.nvars as usize
  }

  /// The packed symbol vector, valid after finalization.
  pub fn symbols(&self) -> &[SymbolId] {
    &self.packed
  }

  /// user token number -> internal number, valid after finalization.
  pub fn token_translations(&self) -> &[i32] {
    &self.token_translations
  }

  pub fn max_user_token_number(&self) -> i32 {
    self.max_user_token_number
  }

  /// Set the semantic type of `sym`. Does nothing when `type_name` is
  /// `None`.
  pub fn type_set(&mut self, sym: SymbolId, type_name: Option<Tag>, loc: Location) {
    let type_name = match type_name {
      Some(t) => t,
      None => return,
    };
    if self.symbols[sym.index()].type_name.is_some() {
      let first = self.symbols[sym.index()].type_location;
      self.redeclaration(sym, "%type", first, loc);
    }
    let s = &mut self.symbols[sym.index()];
    s.type_name = Some(type_name);
    s.type_location = loc;
  }

  /// Set the %destructor or %printer of `sym`.
  pub fn code_props_set(&mut self, sym: SymbolId, kind: CodePropKind, code: CodeProps) {
    if self.symbols[sym.index()].prop(kind).is_defined() {
      let first = self.symbols[sym.index()].prop(kind).location;
      self.redeclaration(sym, kind.as_str(), first, code.location);
    }
    self.symbols[sym.index()].props[kind.index()] = code;
  }

  /// The effective %destructor or %printer of `sym`: its own, then its
  /// semantic type's, then the `<*>` or `<>` default.
  pub fn code_props_get(&mut self, sym: SymbolId, kind: CodePropKind) -> &CodeProps {
    match self.code_props_owner(sym, kind) {
      PropsOwner::Symbol(s) => self.symbols[s.index()].prop(kind),
      PropsOwner::Type(t) => self.types[t.index()].prop(kind),
      PropsOwner::None => &CODE_PROPS_NONE,
    }
  }

  pub(crate) fn code_props_mark_used(&mut self, sym: SymbolId, kind: CodePropKind) {
    match self.code_props_owner(sym, kind) {
      PropsOwner::Symbol(s) => self.symbols[s.index()].props[kind.index()].is_used = true,
      PropsOwner::Type(t) => self.types[t.index()].props[kind.index()].is_used = true,
      PropsOwner::None => {}
    }
  }

  fn code_props_owner(&mut self, sym: SymbolId, kind: CodePropKind) -> PropsOwner {
    if self.symbols[sym.index()].prop(kind).is_defined() {
      return PropsOwner::Symbol(sym);
    }

    if let Some(type_name) = self.symbols[sym.index()].type_name {
      let ty = self.semantic_type_from_tag(type_name, None);
      if self.types[ty.index()].prop(kind).is_defined() {
        return PropsOwner::Type(ty);
      }
    }

    // Default code props apply only to user-defined symbols.
    if !self.name(sym).starts_with('$') && sym != self.errtoken {
      let key = if self.symbols[sym.index()].type_name.is_some() {
        "*"
      } else {
        ""
      };
      let ty = self.semantic_type_get(key, None);
      if self.types[ty.index()].prop(kind).is_defined() {
        return PropsOwner::Type(ty);
      }
    }

    PropsOwner::None
  }

  /// Set the precedence and associativity of `sym`. Does nothing when
  /// invoked with `Assoc::Undef`.
  pub fn precedence_set(&mut self, sym: SymbolId, prec: i32, assoc: Assoc, loc: Location) {
    if assoc == Assoc::Undef {
      return;
    }
    if self.symbols[sym.index()].prec != 0 {
      let first = self.symbols[sym.index()].prec_location;
      self.redeclaration(sym, assoc.decl_keyword(), first, loc);
    }
    {
      let s = &mut self.symbols[sym.index()];
      s.prec = prec;
      s.assoc = assoc;
      s.prec_location = loc;
    }
    // Only terminals have a precedence.
    self.class_set(sym, SymbolClass::Token, loc, false);
  }

  /// Set the class of `sym`, assigning its pre-pack number on the first
  /// transition into a class.
  pub fn class_set(&mut self, sym: SymbolId, class: SymbolClass, loc: Location, declaring: bool) {
    let mut warned = false;
    if self.symbols[sym.index()].class != SymbolClass::Unknown
      && self.symbols[sym.index()].class != class
    {
      let kind = ErrorKind::SymbolRedefined {
        tag: self.name(sym).to_owned(),
      };
      self.diagnostics.complain(Severity::Complaint, loc, kind);
      // Don't report both "redefined" and "redeclared".
      warned = true;
    }

    if class == SymbolClass::Nterm && self.symbols[sym.index()].class != SymbolClass::Nterm {
      self.symbols[sym.index()].number = self.nvars;
      self.nvars += 1;
    } else if class == SymbolClass::Token && self.symbols[sym.index()].number == NUMBER_UNDEFINED {
      self.symbols[sym.index()].number = self.ntokens;
      self.ntokens += 1;
    }
    self.symbols[sym.index()].class = class;

    if declaring {
      if self.symbols[sym.index()].status == Status::Declared && !warned {
        let kind = ErrorKind::SymbolRedeclared {
          tag: self.name(sym).to_owned(),
        };
        self.diagnostics.complain(Severity::Other, loc, kind);
      }
      self.symbols[sym.index()].status = Status::Declared;
    }
  }

  /// Mark `sym` as referenced by a rule.
  pub fn mark_needed(&mut self, sym: SymbolId) {
    if self.symbols[sym.index()].status == Status::Undeclared {
      self.symbols[sym.index()].status = Status::Needed;
    }
  }

  /// Set the user token number of `sym`, routing to its string alias when
  /// the numbering lives there.
  pub fn user_token_number_set(&mut self, sym: SymbolId, user_token_number: i32, loc: Location) {
    let target = if self.symbols[sym.index()].user_token_number == USER_NUMBER_HAS_STRING_ALIAS {
      self.symbols[sym.index()]
        .alias
        .expect("has-string-alias symbol without an alias")
    } else {
      sym
    };

    let current = self.symbols[target.index()].user_token_number;
    if current != USER_NUMBER_UNDEFINED && current != user_token_number {
      let kind = ErrorKind::UserTokenNumberRedefined {
        tag: self.name(sym).to_owned(),
      };
      self.diagnostics.complain(Severity::Complaint, loc, kind);
    }
    self.symbols[target.index()].user_token_number = user_token_number;

    // A user-defined end token is always mapped to 0, so it was already
    // counted in ntokens.
    if user_token_number == 0 {
      self.endtoken = Some(sym);
      if self.symbols[sym.index()].number != NUMBER_UNDEFINED {
        self.ntokens -= 1;
      }
      self.symbols[sym.index()].number = 0;
    }
  }

  /// Link the token `sym` with its literal-string form `str_sym`.
  pub fn make_alias(&mut self, sym: SymbolId, str_sym: SymbolId, loc: Location) {
    if self.symbols[str_sym.index()].alias.is_some() {
      let kind = ErrorKind::StringUsedTwice {
        tag: self.name(str_sym).to_owned(),
      };
      self.diagnostics.complain(Severity::Other, loc, kind);
    } else if self.symbols[sym.index()].alias.is_some() {
      let kind = ErrorKind::MultipleLiteralStrings {
        tag: self.name(sym).to_owned(),
      };
      self.diagnostics.complain(Severity::Other, loc, kind);
    } else {
      let user_token_number = self.symbols[sym.index()].user_token_number;
      let number = self.symbols[sym.index()].number;
      let type_name = self.symbols[sym.index()].type_name;
      {
        let s = &mut self.symbols[str_sym.index()];
        s.class = SymbolClass::Token;
        s.user_token_number = user_token_number;
        s.alias = Some(sym);
        s.number = number;
      }
      self.symbols[sym.index()].user_token_number = USER_NUMBER_HAS_STRING_ALIAS;
      self.symbols[sym.index()].alias = Some(str_sym);
      self.type_set(str_sym, type_name, loc);
    }
  }

  /// Declare the start symbol.
  pub fn start_set(&mut self, sym: SymbolId, loc: Location) {
    if self.start.is_some() {
      self
        .diagnostics
        .complain(Severity::Complaint, loc, ErrorKind::MultipleStartDeclarations);
    } else {
      self.start = Some(sym);
      self.start_location = loc;
    }
  }

  /// Generate a dummy nonterminal whose name cannot conflict with the
  /// user's names.
  pub fn dummy(&mut self, loc: Location) -> Result<SymbolId, FatalError> {
    self.dummy_count += 1;
    let name = format!("$@{}", self.dummy_count);
    let id = self.get(&name, loc)?;
    self.symbols[id.index()].class = SymbolClass::Nterm;
    self.symbols[id.index()].number = self.nvars;
    self.nvars += 1;
    Ok(id)
  }

  pub fn is_dummy(&self, sym: SymbolId) -> bool {
    let tag = self.name(sym);
    tag.starts_with('@') || tag.starts_with("$@")
  }

  /// The C-identifier form of `sym`, following the alias pair to its
  /// identifier side.
  pub fn id(&self, sym: SymbolId) -> Option<&str> {
    debug_assert!(
      self.symbols[sym.index()].user_token_number != USER_NUMBER_HAS_STRING_ALIAS
    );
    let sym = match self.symbols[sym.index()].alias {
      Some(alias) => alias,
      None => sym,
    };
    let tag = self.name(sym);
    if is_identifier(tag) {
      Some(tag)
    } else {
      None
    }
  }

  /// Debug dump of a symbol's tag, type, and code props.
  pub fn print_symbol(&self, sym: SymbolId, out: &mut impl std::fmt::Write) -> std::fmt::Result {
    let s = &self.symbols[sym.index()];
    write!(out, "\"{}\"", self.resolve(s.tag))?;
    if let Some(type_name) = s.type_name {
      write!(out, " type_name {{ {} }}", self.resolve(type_name))?;
    }
    for kind in CodePropKind::ALL {
      if let Some(code) = &s.prop(kind).code {
        write!(out, " {} {{ {} }}", kind.as_str(), code)?;
      }
    }
    Ok(())
  }

  /// Find the semantic type named `key`, creating it if it does not exist
  /// yet.
  pub fn semantic_type_get(&mut self, key: &str, loc: Option<Location>) -> TypeId {
    let tag = self.interner.intern(key);
    self.semantic_type_from_tag(tag, loc)
  }

  pub(crate) fn semantic_type_from_tag(&mut self, tag: Tag, loc: Option<Location>) -> TypeId {
    if let Some(&id) = self.types_by_tag.get(&tag) {
      return id;
    }
    let id = TypeId(self.types.len() as u32);
    self
      .types
      .push(SemanticType::new(tag, loc.unwrap_or_default()));
    self.types_by_tag.insert(tag, id);
    id
  }

  pub fn semantic_type(&self, id: TypeId) -> &SemanticType {
    &self.types[id.index()]
  }

  pub(crate) fn semantic_type_mut(&mut self, id: TypeId) -> &mut SemanticType {
    &mut self.types[id.index()]
  }

  pub fn type_name_str(&self, id: TypeId) -> &str {
    self.interner.resolve(self.types[id.index()].tag)
  }

  /// Set the %destructor or %printer of a semantic type.
  pub fn semantic_type_code_props_set(&mut self, ty: TypeId, kind: CodePropKind, code: CodeProps) {
    if self.types[ty.index()].prop(kind).is_defined() {
      let first = self.types[ty.index()].prop(kind).location;
      let error = ErrorKind::TypeRedeclaration {
        what: kind.as_str(),
        tag: self.type_name_str(ty).to_owned(),
      };
      self
        .diagnostics
        .complain_with_note(Severity::Complaint, code.location, error, first);
    }
    self.types[ty.index()].props[kind.index()] = code;
  }

  fn redeclaration(&mut self, sym: SymbolId, what: &'static str, first: Location, second: Location) {
    let kind = ErrorKind::Redeclaration {
      what,
      tag: self.name(sym).to_owned(),
    };
    self
      .diagnostics
      .complain_with_note(Severity::Complaint, second, kind, first);
  }

  /// Symbols in tag order. The first call freezes the store.
  pub(crate) fn sorted_symbols(&mut self) -> Vec<SymbolId> {
    if let Some(sorted) = &self.symbols_sorted {
      return sorted.clone();
    }
    let sorted: Vec<SymbolId> = (0..self.symbols.len() as u32)
      .map(SymbolId)
      .sorted_by(|&a, &b| self.name(a).cmp(self.name(b)))
      .collect();
    self.symbols_sorted = Some(sorted.clone());
    sorted
  }

  /// Semantic types in tag order.
  pub(crate) fn sorted_types(&mut self) -> Vec<TypeId> {
    if let Some(sorted) = &self.types_sorted {
      return sorted.clone();
    }
    let sorted: Vec<TypeId> = (0..self.types.len() as u32)
      .map(TypeId)
      .sorted_by(|&a, &b| self.type_name_str(a).cmp(self.type_name_str(b)))
      .collect();
    self.types_sorted = Some(sorted.clone());
    sorted
  }
}

impl Default for SymbolTable {
  fn default() -> Self {
    SymbolTable::new()
  }
}

fn is_identifier(s: &str) -> bool {
  let mut chars = s.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
    _ => return false,
  }
  chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn loc(n: usize) -> Location {
    Location::new(n, n + 1)
  }

  #[test]
  fn get_is_idempotent() {
    let mut table = SymbolTable::new();
    let a = table.get("expr", loc(1)).unwrap();
    let b = table.get("expr", loc(9)).unwrap();
    assert_eq!(a, b);
    // The location of the first mention wins.
    assert_eq!(table.symbol(a).location, loc(1));
  }

  #[test]
  fn distinguished_symbols() {
    let table = SymbolTable::new();
    assert_eq!(table.name(table.accept), "$accept");
    assert_eq!(table.name(table.errtoken), "error");
    assert_eq!(table.name(table.undeftoken), "$undefined");
    assert_eq!(table.symbol(table.accept).class, SymbolClass::Nterm);
    assert_eq!(table.symbol(table.errtoken).number, 1);
    assert_eq!(table.symbol(table.undeftoken).number, 2);
  }

  #[test]
  fn dashes_warn_for_unquoted_names_only() {
    let mut table = SymbolTable::new();
    table.get("param-list", loc(1)).unwrap();
    table.get("\"a-b\"", loc(2)).unwrap();
    let warnings: Vec<_> = table.diagnostics.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, Severity::Yacc);
    assert_eq!(
      warnings[0].kind,
      ErrorKind::DashesInName {
        tag: "param-list".to_owned()
      }
    );
  }

  #[test]
  fn type_redeclaration_cites_both_locations() {
    let mut table = SymbolTable::new();
    let s = table.get("expr", loc(1)).unwrap();
    let int = table.intern("INT");
    let str_ = table.intern("STR");
    table.type_set(s, Some(int), loc(10));
    table.type_set(s, Some(str_), loc(20));

    let complaints: Vec<_> = table.diagnostics.complaints().collect();
    assert_eq!(complaints.len(), 1);
    assert_eq!(complaints[0].location, Some(loc(20)));
    assert_eq!(complaints[0].note, Some(loc(10)));
    assert_eq!(
      complaints[0].kind,
      ErrorKind::Redeclaration {
        what: "%type",
        tag: "expr".to_owned()
      }
    );
    // The later declaration still wins.
    assert_eq!(table.symbol(s).type_name, Some(str_));
  }

  #[test]
  fn class_redefinition_complains() {
    let mut table = SymbolTable::new();
    let s = table.get("thing", loc(1)).unwrap();
    table.class_set(s, SymbolClass::Token, loc(1), true);
    table.class_set(s, SymbolClass::Nterm, loc(2), true);
    let complaints: Vec<_> = table.diagnostics.complaints().collect();
    assert_eq!(complaints.len(), 1);
    assert_eq!(
      complaints[0].kind,
      ErrorKind::SymbolRedefined {
        tag: "thing".to_owned()
      }
    );
  }

  #[test]
  fn redeclaring_same_class_warns() {
    let mut table = SymbolTable::new();
    let s = table.get("NUM", loc(1)).unwrap();
    table.class_set(s, SymbolClass::Token, loc(1), true);
    table.class_set(s, SymbolClass::Token, loc(2), true);
    let warnings: Vec<_> = table.diagnostics.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(
      warnings[0].kind,
      ErrorKind::SymbolRedeclared {
        tag: "NUM".to_owned()
      }
    );
  }

  #[test]
  fn precedence_set_forces_token_class() {
    let mut table = SymbolTable::new();
    let s = table.get("PLUS", loc(1)).unwrap();
    table.precedence_set(s, 3, Assoc::Left, loc(1));
    assert_eq!(table.symbol(s).class, SymbolClass::Token);
    assert_eq!(table.symbol(s).prec, 3);
    assert_eq!(table.symbol(s).assoc, Assoc::Left);

    table.precedence_set(s, 4, Assoc::Right, loc(2));
    let complaints: Vec<_> = table.diagnostics.complaints().collect();
    assert_eq!(complaints.len(), 1);
    assert_eq!(
      complaints[0].kind,
      ErrorKind::Redeclaration {
        what: "%right",
        tag: "PLUS".to_owned()
      }
    );
  }

  #[test]
  fn user_token_number_conflict_complains() {
    let mut table = SymbolTable::new();
    let s = table.get("NUM", loc(1)).unwrap();
    table.class_set(s, SymbolClass::Token, loc(1), true);
    table.user_token_number_set(s, 300, loc(1));
    table.user_token_number_set(s, 300, loc(2));
    assert_eq!(table.diagnostics.error_count(), 0);
    table.user_token_number_set(s, 301, loc(3));
    assert_eq!(table.diagnostics.error_count(), 1);
    assert_eq!(table.symbol(s).user_token_number, 301);
  }

  #[test]
  fn user_end_token_takes_number_zero() {
    let mut table = SymbolTable::new();
    let s = table.get("END", loc(1)).unwrap();
    table.class_set(s, SymbolClass::Token, loc(1), true);
    let ntokens = table.ntokens;
    table.user_token_number_set(s, 0, loc(1));
    assert_eq!(table.endtoken, Some(s));
    assert_eq!(table.symbol(s).number, 0);
    assert_eq!(table.ntokens, ntokens - 1);
  }

  #[test]
  fn alias_links_are_symmetric() {
    let mut table = SymbolTable::new();
    let sym = table.get("IF", loc(1)).unwrap();
    let str_sym = table.get("\"if\"", loc(2)).unwrap();
    table.class_set(sym, SymbolClass::Token, loc(1), true);
    table.user_token_number_set(sym, 300, loc(1));
    table.make_alias(sym, str_sym, loc(3));

    assert_eq!(table.symbol(sym).alias, Some(str_sym));
    assert_eq!(table.symbol(str_sym).alias, Some(sym));
    assert_eq!(table.symbol(str_sym).user_token_number, 300);
    assert_eq!(
      table.symbol(sym).user_token_number,
      USER_NUMBER_HAS_STRING_ALIAS
    );
    assert_eq!(table.symbol(str_sym).number, table.symbol(sym).number);
  }

  #[test]
  fn repeated_alias_warns_and_keeps_first() {
    let mut table = SymbolTable::new();
    let sym = table.get("IF", loc(1)).unwrap();
    let other = table.get("ELSE", loc(2)).unwrap();
    let str_sym = table.get("\"if\"", loc(3)).unwrap();
    table.class_set(sym, SymbolClass::Token, loc(1), true);
    table.class_set(other, SymbolClass::Token, loc(2), true);
    table.make_alias(sym, str_sym, loc(4));
    table.make_alias(other, str_sym, loc(5));

    let warnings: Vec<_> = table.diagnostics.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(
      warnings[0].kind,
      ErrorKind::StringUsedTwice {
        tag: "\"if\"".to_owned()
      }
    );
    assert_eq!(table.symbol(str_sym).alias, Some(sym));
    assert_eq!(table.symbol(other).alias, None);
  }

  #[test]
  fn user_token_number_routes_to_string_alias() {
    let mut table = SymbolTable::new();
    let sym = table.get("IF", loc(1)).unwrap();
    let str_sym = table.get("\"if\"", loc(2)).unwrap();
    table.class_set(sym, SymbolClass::Token, loc(1), true);
    table.make_alias(sym, str_sym, loc(3));
    table.user_token_number_set(sym, 300, loc(4));
    assert_eq!(table.symbol(str_sym).user_token_number, 300);
    assert_eq!(
      table.symbol(sym).user_token_number,
      USER_NUMBER_HAS_STRING_ALIAS
    );
  }

  #[test]
  fn code_props_resolution_order() {
    let mut table = SymbolTable::new();
    let with_own = table.get("a", loc(1)).unwrap();
    let with_type = table.get("b", loc(2)).unwrap();
    let with_tagged_default = table.get("c", loc(3)).unwrap();
    let with_untagged_default = table.get("d", loc(4)).unwrap();

    let val = table.intern("val");
    table.type_set(with_type, Some(val), loc(2));
    table.type_set(with_tagged_default, Some(val), loc(3));

    table.code_props_set(
      with_own,
      CodePropKind::Destructor,
      CodeProps::user("free_own($$)", loc(1)),
    );
    let val_ty = table.semantic_type_get("val", Some(loc(2)));
    table.semantic_type_code_props_set(
      val_ty,
      CodePropKind::Printer,
      CodeProps::user("print_val($$)", loc(2)),
    );
    let star = table.semantic_type_get("*", None);
    table.semantic_type_code_props_set(
      star,
      CodePropKind::Destructor,
      CodeProps::user("free_any($$)", loc(5)),
    );
    let empty = table.semantic_type_get("", None);
    table.semantic_type_code_props_set(
      empty,
      CodePropKind::Destructor,
      CodeProps::user("free_untyped($$)", loc(6)),
    );

    let own = table.code_props_get(with_own, CodePropKind::Destructor).clone();
    assert_eq!(own.code.as_deref(), Some("free_own($$)"));

    let typed = table.code_props_get(with_type, CodePropKind::Printer).clone();
    assert_eq!(typed.code.as_deref(), Some("print_val($$)"));

    // No per-type destructor, so <*> applies.
    let tagged = table
      .code_props_get(with_tagged_default, CodePropKind::Destructor)
      .clone();
    assert_eq!(tagged.code.as_deref(), Some("free_any($$)"));

    let untagged = table
      .code_props_get(with_untagged_default, CodePropKind::Destructor)
      .clone();
    assert_eq!(untagged.code.as_deref(), Some("free_untyped($$)"));

    // Generated symbols and the error token never get defaults.
    let errtoken = table.errtoken;
    let none = table.code_props_get(errtoken, CodePropKind::Destructor).clone();
    assert!(!none.is_defined());
    let accept = table.accept;
    let none = table.code_props_get(accept, CodePropKind::Destructor).clone();
    assert!(!none.is_defined());
  }

  #[test]
  #[should_panic(expected = "symbol created after the table was sorted")]
  fn no_insertion_after_freeze() {
    let mut table = SymbolTable::new();
    table.get("A", loc(1)).unwrap();
    table.sorted_symbols();
    let _ = table.get("B", loc(2));
  }

  #[test]
  fn sorted_view_is_tag_ordered_and_stable() {
    let mut table = SymbolTable::new();
    table.get("zeta", loc(1)).unwrap();
    table.get("alpha", loc(2)).unwrap();
    let sorted = table.sorted_symbols();
    let names: Vec<_> = sorted.iter().map(|&s| table.name(s)).collect();
    let mut expected = names.clone();
    expected.sort();
    assert_eq!(names, expected);
    assert_eq!(table.sorted_symbols(), sorted);
  }

  #[test]
  fn dummy_symbols_are_recognizable() {
    let mut table = SymbolTable::new();
    let d1 = table.dummy(loc(1)).unwrap();
    let d2 = table.dummy(loc(2)).unwrap();
    assert_ne!(d1, d2);
    assert_eq!(table.name(d1), "$@1");
    assert!(table.is_dummy(d1));
    assert_eq!(table.symbol(d2).class, SymbolClass::Nterm);

    let user = table.get("expr", loc(3)).unwrap();
    assert!(!table.is_dummy(user));
  }

  #[test]
  fn identifier_form_follows_alias() {
    let mut table = SymbolTable::new();
    let sym = table.get("IF", loc(1)).unwrap();
    let str_sym = table.get("\"if\"", loc(2)).unwrap();
    table.class_set(sym, SymbolClass::Token, loc(1), true);
    table.make_alias(sym, str_sym, loc(3));
    assert_eq!(table.id(str_sym), Some("IF"));

    let bare = table.get("NUM", loc(4)).unwrap();
    assert_eq!(table.id(bare), Some("NUM"));
    let quoted = table.get("\"+\"", loc(5)).unwrap();
    assert_eq!(table.id(quoted), None);
  }

  #[test]
  fn print_symbol_lists_props() {
    let mut table = SymbolTable::new();
    let s = table.get("expr", loc(1)).unwrap();
    let val = table.intern("val");
    table.type_set(s, Some(val), loc(1));
    table.code_props_set(
      s,
      CodePropKind::Destructor,
      CodeProps::user("free($$)", loc(2)),
    );
    let mut out = String::new();
    table.print_symbol(s, &mut out).unwrap();
    assert_eq!(out, "\"expr\" type_name { val } %destructor { free($$) }");
  }
}
