//! DOT rendering of the relation graph and of its transitive reduction.

use std::io::{self, Write};

use symtab::SymbolTable;

use crate::PrecGraph;

impl PrecGraph {
  /// Write the relation graph, grouping equivalent nodes first. Edges are
  /// colored by the degrees of their endpoints.
  pub fn write_relation_graph(
    &mut self,
    table: &SymbolTable,
    out: &mut impl Write,
  ) -> io::Result<()> {
    self.group_relations();

    writeln!(out, "digraph rel{{")?;
    writeln!(out, "compound=true; nodesep=\"0.3 equally\";ranksep=\"3 equally\";")?;
    writeln!(out, "subgraph cluster_legend {{ ")?;
    writeln!(out, "label=legend")?;
    writeln!(out, "\"outdegree=1\" -> \"indegree<>1\" [color=blue];")?;
    writeln!(out, "\"outdegree=1\" -> \"indegree=1\" [color=red];")?;
    writeln!(out, "\"outdegree<>1\" -> \"indegree=1\" [color=green];")?;
    writeln!(out, "}}")?;

    let mut declared = vec![false; self.nodes.len()];
    // Walk ids downwards so that groups are declared before their
    // members.
    for id in (1..self.nodes.len()).rev() {
      if self.nodes[id].succ.is_empty() && self.nodes[id].pred.is_empty() {
        continue;
      }
      self.declare_node(table, out, id, &mut declared)?;
      for i in 0..self.nodes[id].succ.len() {
        let target = self.nodes[id].succ[i];
        self.declare_node(table, out, target, &mut declared)?;
        self.write_edge(out, id, target, true)?;
      }
    }
    write!(out, "}}")
  }

  /// Write the transitive reduction of the current graph, edges in black.
  pub fn write_transitive_reduction(
    &self,
    table: &SymbolTable,
    out: &mut impl Write,
  ) -> io::Result<()> {
    let reduced = self.transitive_reduction();

    writeln!(out, "digraph rel{{")?;
    writeln!(out, "compound=true; nodesep=\"0.3 equally\";ranksep=\"3 equally\";")?;

    let mut declared = vec![false; self.nodes.len()];
    for i in 0..self.nodes.len() {
      for j in 0..self.nodes.len() {
        if !reduced[(i, j)] {
          continue;
        }
        self.declare_node(table, out, i, &mut declared)?;
        self.declare_node(table, out, j, &mut declared)?;
        self.write_edge(out, i, j, false)?;
      }
    }
    write!(out, "}}")
  }

  fn declare_node(
    &self,
    table: &SymbolTable,
    out: &mut impl Write,
    id: usize,
    declared: &mut [bool],
  ) -> io::Result<()> {
    if declared[id] {
      return Ok(());
    }
    declared[id] = true;
    if self.is_group(id) {
      writeln!(out, "subgraph cluster_{} {{", id)?;
      for i in 0..self.nodes[id].members.len() {
        let member = self.nodes[id].members[i];
        self.declare_node(table, out, member, declared)?;
      }
      writeln!(out, "}}")
    } else {
      writeln!(out, "{} [label=\"{}\"]", id, table.name(table.symbols()[id]))
    }
  }

  /// The first actual symbol of a node, descending into groups, so that
  /// the edge has a valid endpoint in the dot file.
  fn first_symbol(&self, mut id: usize) -> usize {
    while self.is_group(id) {
      id = self.nodes[id].members[0];
    }
    id
  }

  fn write_edge(
    &self,
    out: &mut impl Write,
    tail: usize,
    head: usize,
    colored: bool,
  ) -> io::Result<()> {
    let mut color = "black";
    if colored {
      let tail_single = self.outdegree(tail) == 1;
      let head_single = self.indegree(head) == 1;
      if tail_single && head_single {
        color = "red";
      } else if tail_single {
        color = "blue";
      } else if head_single {
        color = "green";
      }
    }

    write!(out, "{} -> {} [", self.first_symbol(tail), self.first_symbol(head))?;
    if self.is_group(head) {
      if self.is_group(tail) {
        write!(out, "lhead=cluster_{}, ltail=cluster_{}, ", head, tail)?;
      } else {
        write!(out, "lhead=cluster_{}, ", head)?;
      }
    } else if self.is_group(tail) {
      write!(out, "ltail=cluster_{}, ", tail)?;
    }
    writeln!(out, "color={}];", color)
  }
}
