//! The post-parse pipeline: check declarations, reconcile alias pairs,
//! pack symbols into their dense numbering, and build the token
//! translation table.

use crate::diagnostics::{ErrorKind, FatalError, FatalErrorKind, Severity};
use crate::location::Location;
use crate::semantic_type::TypeId;
use crate::symbol::{
  CodePropKind, PropKind, Status, SymbolClass, SymbolId, NUMBER_UNDEFINED,
  USER_NUMBER_HAS_STRING_ALIAS, USER_NUMBER_UNDEFINED,
};
use crate::table::SymbolTable;

impl SymbolTable {
  /// Run the whole pipeline. Non-fatal complaints accumulate in the
  /// diagnostics sink; fatal conditions abort with an error.
  pub fn finalize(&mut self) -> Result<(), FatalError> {
    self.ensure_endtoken()?;
    self.check_defined();
    self.check_alias_consistency();
    self.pack();
    self.token_translations_init();
    self.check_start_symbol()
  }

  /// If the user did not define an end token, do it now.
  fn ensure_endtoken(&mut self) -> Result<(), FatalError> {
    if self.endtoken.is_none() {
      let end = self.get("$end", Location::default())?;
      let s = self.symbol_mut(end);
      s.class = SymbolClass::Token;
      s.number = 0;
      // Value specified by POSIX.
      s.user_token_number = 0;
      self.endtoken = Some(end);
    }
    Ok(())
  }

  /// Report undefined symbols and consider them nonterminals; then check
  /// semantic-type declarations.
  fn check_defined(&mut self) {
    for sym in self.sorted_symbols() {
      self.symbol_check_defined(sym);
    }
    for ty in self.sorted_types() {
      self.semantic_type_check_defined(ty);
    }
  }

  fn symbol_check_defined(&mut self, sym: SymbolId) {
    if self.symbol(sym).class == SymbolClass::Unknown {
      debug_assert!(self.symbol(sym).status != Status::Declared);
      let severity = if self.symbol(sym).status == Status::Needed {
        Severity::Complaint
      } else {
        Severity::Other
      };
      let kind = ErrorKind::UndefinedSymbol {
        tag: self.name(sym).to_owned(),
      };
      let loc = self.symbol(sym).location;
      self.diagnostics.complain(severity, loc, kind);

      self.symbol_mut(sym).class = SymbolClass::Nterm;
      let nvars = self.nvars;
      self.symbol_mut(sym).number = nvars;
      self.nvars += 1;
    }

    for kind in CodePropKind::ALL {
      self.code_props_mark_used(sym, kind);
    }

    // Record that the symbol's semantic type is in use.
    if let Some(type_name) = self.symbol(sym).type_name {
      let ty = self.semantic_type_from_tag(type_name, None);
      self.semantic_type_mut(ty).status = Status::Declared;
    }
  }

  fn semantic_type_check_defined(&mut self, ty: TypeId) {
    let tag = self.type_name_str(ty).to_owned();
    // <*> and <> do not have to be declared.
    let reserved = tag.is_empty() || tag == "*";

    if self.semantic_type(ty).status == Status::Declared || reserved {
      for kind in CodePropKind::ALL {
        let prop = self.semantic_type(ty).prop(kind);
        if prop.kind != PropKind::None && !prop.is_used {
          let loc = self.semantic_type(ty).location;
          let error = ErrorKind::UselessCodeProps {
            what: kind.as_str(),
            tag: tag.clone(),
          };
          self.diagnostics.complain(Severity::Other, loc, error);
        }
      }
    } else {
      let loc = self.semantic_type(ty).location;
      let error = ErrorKind::TypeUnassociated { tag };
      self.diagnostics.complain(Severity::Other, loc, error);
    }
  }

  /// Make both records of each alias pair agree on type, code props, and
  /// precedence.
  fn check_alias_consistency(&mut self) {
    for sym in self.sorted_symbols() {
      self.symbol_check_alias_consistency(sym);
    }
  }

  fn symbol_check_alias_consistency(&mut self, sym: SymbolId) {
    // Check only the identifier side of the pair.
    let str_sym = match self.symbol(sym).alias {
      Some(s) if self.symbol(sym).user_token_number == USER_NUMBER_HAS_STRING_ALIAS => s,
      _ => return,
    };

    // Copy each attribute set on exactly one side to the other.
    let sym_type = self.symbol(sym).type_name;
    let str_type = self.symbol(str_sym).type_name;
    if str_type.is_some() && sym_type.is_none() {
      let loc = self.symbol(str_sym).type_location;
      self.type_set(sym, str_type, loc);
    } else if sym_type.is_some() && str_type.is_none() {
      let loc = self.symbol(sym).type_location;
      self.type_set(str_sym, sym_type, loc);
    }

    for kind in CodePropKind::ALL {
      let sym_has = self.symbol(sym).prop(kind).is_defined();
      let str_has = self.symbol(str_sym).prop(kind).is_defined();
      if str_has && !sym_has {
        let props = self.symbol(str_sym).prop(kind).clone();
        self.code_props_set(sym, kind, props);
      } else if sym_has && !str_has {
        let props = self.symbol(sym).prop(kind).clone();
        self.code_props_set(str_sym, kind, props);
      }
    }

    let sym_prec = self.symbol(sym).prec;
    let str_prec = self.symbol(str_sym).prec;
    if str_prec != 0 && sym_prec == 0 {
      let (prec, assoc, loc) = {
        let s = self.symbol(str_sym);
        (s.prec, s.assoc, s.prec_location)
      };
      self.precedence_set(sym, prec, assoc, loc);
    } else if sym_prec != 0 && str_prec == 0 {
      let (prec, assoc, loc) = {
        let s = self.symbol(sym);
        (s.prec, s.assoc, s.prec_location)
      };
      self.precedence_set(str_sym, prec, assoc, loc);
    }
  }

  /// Place every symbol at its final number. Nonterminals shift past the
  /// tokens; the identifier side of an alias pair is represented by its
  /// string partner, and the slots this leaves empty are compacted away.
  fn pack(&mut self) {
    let ntokens0 = self.ntokens;
    let nslots = (self.nsyms).max(ntokens0 + self.nvars) as usize;
    let mut slots: Vec<Option<SymbolId>> = vec![None; nslots];

    for sym in self.sorted_symbols() {
      let number = self.symbol(sym).number;
      assert!(number != NUMBER_UNDEFINED);
      if self.symbol(sym).class == SymbolClass::Nterm {
        let shifted = number + ntokens0;
        self.symbol_mut(sym).number = shifted;
        slots[shifted as usize] = Some(sym);
      } else if self.symbol(sym).user_token_number == USER_NUMBER_HAS_STRING_ALIAS {
        continue;
      } else {
        slots[number as usize] = Some(sym);
      }
    }

    // A slot left empty in the token range means a token number was
    // vacated by aliasing; the tokens behind it shift down.
    self.packed = Vec::with_capacity(slots.len());
    for (readi, slot) in slots.into_iter().enumerate() {
      match slot {
        None => {
          if (readi as i32) < ntokens0 {
            self.ntokens -= 1;
          }
        }
        Some(sym) => {
          let writei = self.packed.len() as i32;
          self.packed.push(sym);
          self.symbol_mut(sym).number = writei;
          if let Some(alias) = self.symbol(sym).alias {
            self.symbol_mut(alias).number = writei;
          }
        }
      }
    }
    self.nsyms = self.packed.len() as i32;
  }

  /// Fill `token_translations`, checking that no two tokens share a user
  /// number.
  fn token_translations_init(&mut self) {
    let mut num_256_available = true;
    let mut max = 0;

    // Find the highest user token number, and whether 256, the POSIX
    // preferred number for the error token, is taken.
    for i in 0..self.ntokens as usize {
      let sym = self.packed[i];
      let utn = self.symbol(sym).user_token_number;
      if utn != USER_NUMBER_UNDEFINED {
        if utn > max {
          max = utn;
        }
        if utn == 256 {
          num_256_available = false;
        }
      }
    }

    if num_256_available
      && self.symbol(self.errtoken).user_token_number == USER_NUMBER_UNDEFINED
    {
      let errtoken = self.errtoken;
      self.symbol_mut(errtoken).user_token_number = 256;
    }

    if max < 256 {
      max = 256;
    }

    // Set the missing user numbers.
    for i in 0..self.ntokens as usize {
      let sym = self.packed[i];
      if self.symbol(sym).user_token_number == USER_NUMBER_UNDEFINED {
        max += 1;
        self.symbol_mut(sym).user_token_number = max;
      }
      let utn = self.symbol(sym).user_token_number;
      if utn > max {
        max = utn;
      }
    }

    self.max_user_token_number = max;
    let undef_number = self.symbol(self.undeftoken).number;
    self.token_translations = vec![undef_number; (max + 1) as usize];

    for sym in self.sorted_symbols() {
      self.symbol_translation(sym);
    }
  }

  fn symbol_translation(&mut self, sym: SymbolId) {
    if self.symbol(sym).class == SymbolClass::Token
      && self.symbol(sym).user_token_number != USER_NUMBER_HAS_STRING_ALIAS
    {
      let utn = self.symbol(sym).user_token_number as usize;
      let undef_number = self.symbol(self.undeftoken).number;
      if self.token_translations[utn] != undef_number {
        let first = self.packed[self.token_translations[utn] as usize];
        self.user_token_number_redeclaration(utn as i32, first, sym);
      }
      self.token_translations[utn] = self.symbol(sym).number;
    }
  }

  fn user_token_number_redeclaration(&mut self, number: i32, first: SymbolId, second: SymbolId) {
    // User token numbers are checked in tag order, not in source order;
    // report the earlier declaration first.
    let (first, second) = if self.symbol(first).location > self.symbol(second).location {
      (second, first)
    } else {
      (first, second)
    };
    let kind = ErrorKind::UserTokenNumberRedeclaration {
      number,
      tag: self.name(second).to_owned(),
      prev_tag: self.name(first).to_owned(),
    };
    let second_loc = self.symbol(second).location;
    let first_loc = self.symbol(first).location;
    self
      .diagnostics
      .complain_with_note(Severity::Complaint, second_loc, kind, first_loc);
  }

  fn check_start_symbol(&mut self) -> Result<(), FatalError> {
    let start = match self.start {
      Some(s) => s,
      None => return Ok(()),
    };
    match self.symbol(start).class {
      SymbolClass::Unknown => Err(FatalError {
        location: Some(self.start_location),
        kind: FatalErrorKind::StartSymbolUndefined {
          tag: self.name(start).to_owned(),
        },
      }),
      SymbolClass::Token => Err(FatalError {
        location: Some(self.start_location),
        kind: FatalErrorKind::StartSymbolIsToken {
          tag: self.name(start).to_owned(),
        },
      }),
      SymbolClass::Nterm => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::location::Location;
  use crate::symbol::SymbolClass;
  use crate::table::SymbolTable;
  use pretty_assertions::assert_eq;

  fn loc(n: usize) -> Location {
    Location::new(n, n + 1)
  }

  #[test]
  fn end_token_defaults_to_number_zero() {
    let mut table = SymbolTable::new();
    table.finalize().unwrap();
    let end = table.endtoken.unwrap();
    assert_eq!(table.name(end), "$end");
    assert_eq!(table.symbol(end).number, 0);
    assert_eq!(table.symbol(end).user_token_number, 0);
    assert_eq!(table.symbols()[0], end);
  }

  #[test]
  fn undefined_needed_symbol_is_an_error() {
    let mut table = SymbolTable::new();
    let used = table.get("used", loc(1)).unwrap();
    table.mark_needed(used);
    table.finalize().unwrap();

    let complaints: Vec<_> = table.diagnostics.complaints().collect();
    assert_eq!(complaints.len(), 1);
    assert_eq!(
      complaints[0].kind,
      ErrorKind::UndefinedSymbol {
        tag: "used".to_owned()
      }
    );
    assert_eq!(table.symbol(used).class, SymbolClass::Nterm);
  }

  #[test]
  fn undefined_mentioned_symbol_is_a_warning() {
    let mut table = SymbolTable::new();
    let mentioned = table.get("mentioned", loc(1)).unwrap();
    table.finalize().unwrap();

    assert_eq!(table.diagnostics.error_count(), 0);
    let warnings: Vec<_> = table.diagnostics.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, Severity::Other);
    assert_eq!(table.symbol(mentioned).class, SymbolClass::Nterm);
  }

  #[test]
  fn start_symbol_must_not_be_a_token() {
    let mut table = SymbolTable::new();
    let tok = table.get("NUM", loc(1)).unwrap();
    table.class_set(tok, SymbolClass::Token, loc(1), true);
    table.start_set(tok, loc(2));
    let err = table.finalize().unwrap_err();
    assert_eq!(
      err.kind,
      FatalErrorKind::StartSymbolIsToken {
        tag: "NUM".to_owned()
      }
    );
  }

  #[test]
  fn unused_declared_type_warns() {
    let mut table = SymbolTable::new();
    let ty = table.semantic_type_get("val", Some(loc(1)));
    table.semantic_type_code_props_set(
      ty,
      crate::symbol::CodePropKind::Destructor,
      crate::symbol::CodeProps::user("free($$)", loc(1)),
    );
    table.finalize().unwrap();

    let warnings: Vec<_> = table.diagnostics.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(
      warnings[0].kind,
      ErrorKind::TypeUnassociated {
        tag: "val".to_owned()
      }
    );
  }

  #[test]
  fn associated_type_is_clean() {
    let mut table = SymbolTable::new();
    let expr = table.get("expr", loc(1)).unwrap();
    table.class_set(expr, SymbolClass::Nterm, loc(1), true);
    let val = table.intern("val");
    table.type_set(expr, Some(val), loc(1));
    let ty = table.semantic_type_get("val", Some(loc(2)));
    table.semantic_type_code_props_set(
      ty,
      crate::symbol::CodePropKind::Printer,
      crate::symbol::CodeProps::user("print($$)", loc(2)),
    );
    table.finalize().unwrap();

    // The printer lookup for expr resolved to <val> and marked it used.
    assert_eq!(table.diagnostics.len(), 0);
  }

  #[test]
  fn unreachable_default_destructor_warns() {
    let mut table = SymbolTable::new();
    let star = table.semantic_type_get("*", Some(loc(1)));
    table.semantic_type_code_props_set(
      star,
      crate::symbol::CodePropKind::Destructor,
      crate::symbol::CodeProps::user("free($$)", loc(1)),
    );
    table.finalize().unwrap();

    // Only generated symbols exist, and defaults never apply to them.
    let warnings: Vec<_> = table.diagnostics.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(
      warnings[0].kind,
      ErrorKind::UselessCodeProps {
        what: "%destructor",
        tag: "*".to_owned()
      }
    );
  }
}
