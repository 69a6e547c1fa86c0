//! Symbol table bookkeeping for a parser generator: tag interning, symbol
//! and semantic-type stores, declaration checking, and the finalization
//! pipeline that packs symbols into their dense internal numbering.

pub mod diagnostics;
pub mod intern;
pub mod location;
pub mod semantic_type;
pub mod symbol;

mod finalize;
mod table;

pub use diagnostics::{
  Complaint, Diagnostics, ErrorKind, FatalError, FatalErrorKind, Severity,
};
pub use intern::{Interner, Tag};
pub use location::Location;
pub use semantic_type::{SemanticType, TypeId};
pub use symbol::{
  Assoc, CodePropKind, CodeProps, PropKind, Status, Symbol, SymbolClass,
  SymbolId, NUMBER_UNDEFINED, SYMBOL_NUMBER_MAXIMUM,
  USER_NUMBER_HAS_STRING_ALIAS, USER_NUMBER_UNDEFINED,
};
pub use table::SymbolTable;

#[cfg(not(debug_assertions))]
pub type Map<K, V> = std::collections::HashMap<K, V, fnv::FnvBuildHasher>;

#[cfg(debug_assertions)]
pub type Map<K, V> = indexmap::IndexMap<K, V>;

#[cfg(not(debug_assertions))]
pub type Set<K> = std::collections::HashSet<K, fnv::FnvBuildHasher>;

#[cfg(debug_assertions)]
pub type Set<K> = indexmap::IndexSet<K>;
