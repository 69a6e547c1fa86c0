//! Semantic `<type>` records carrying destructor and printer code.

use crate::intern::Tag;
use crate::location::Location;
use crate::symbol::{CodePropKind, CodeProps, Status};

/// Stable index into the semantic-type store.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticType {
  pub tag: Tag,
  pub location: Location,
  pub status: Status,
  pub props: [CodeProps; 2],
}

impl SemanticType {
  pub(crate) fn new(tag: Tag, location: Location) -> Self {
    SemanticType {
      tag,
      location,
      status: Status::Undeclared,
      props: [CodeProps::NONE, CodeProps::NONE],
    }
  }

  pub fn prop(&self, kind: CodePropKind) -> &CodeProps {
    &self.props[kind.index()]
  }
}
