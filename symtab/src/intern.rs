//! Tag interning. Tag equality is handle equality.

use indexmap::IndexSet;

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct Tag(u32);

impl Tag {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

#[derive(Debug, Default)]
pub struct Interner {
  set: IndexSet<String>,
}

impl Interner {
  pub fn new() -> Self {
    Interner {
      set: IndexSet::new(),
    }
  }

  pub fn intern(&mut self, s: &str) -> Tag {
    if let Some(tag) = self.lookup(s) {
      return tag;
    }
    Tag(self.set.insert_full(s.to_owned()).0 as u32)
  }

  pub fn lookup(&self, s: &str) -> Option<Tag> {
    self.set.get_full(s).map(|(i, _)| Tag(i as u32))
  }

  pub fn resolve(&self, tag: Tag) -> &str {
    self
      .set
      .get_index(tag.index())
      .expect("tag was not produced by this interner")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn handle_equality() {
    let mut interner = Interner::new();
    let a = interner.intern("expr");
    let b = interner.intern("expr");
    let c = interner.intern("term");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(interner.resolve(a), "expr");
    assert_eq!(interner.resolve(c), "term");
  }
}
