//! Transitive closure and reduction of the relation graph.

use bit_matrix::BitMatrix;

use crate::PrecGraph;

impl PrecGraph {
  /// The graph as an adjacency matrix over all nodes, groups included.
  pub(crate) fn to_matrix(&self) -> BitMatrix {
    let n = self.nodes.len();
    let mut g = BitMatrix::new(n, n);
    for (i, node) in self.nodes.iter().enumerate() {
      for &j in &node.succ {
        g.set(i, j, true);
      }
    }
    g
  }

  /// Drop every edge whose endpoints stay connected through an
  /// intermediate node.
  pub(crate) fn transitive_reduction(&self) -> BitMatrix {
    let n = self.nodes.len();
    let mut closure = self.to_matrix();
    closure.transitive_closure();

    let mut reachable_through = BitMatrix::new(n, n);
    for i in 0..n {
      for j in 0..n {
        if !closure[(i, j)] {
          continue;
        }
        for k in 0..n {
          if closure[(j, k)] {
            reachable_through.set(i, k, true);
          }
        }
      }
    }

    let mut reduced = BitMatrix::new(n, n);
    for i in 0..n {
      for j in 0..n {
        reduced.set(i, j, closure[(i, j)] && !reachable_through[(i, j)]);
      }
    }
    reduced
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn closure_of(edges: &[(usize, usize)], n: usize) -> BitMatrix {
    let mut m = BitMatrix::new(n, n);
    for &(i, j) in edges {
      m.set(i, j, true);
    }
    m.transitive_closure();
    m
  }

  fn edges_of(m: &BitMatrix, n: usize) -> Vec<(usize, usize)> {
    let mut edges = vec![];
    for i in 0..n {
      for j in 0..n {
        if m[(i, j)] {
          edges.push((i, j));
        }
      }
    }
    edges
  }

  #[test]
  fn shortcut_edges_are_dropped() {
    let mut graph = PrecGraph::new(6);
    graph.register_precedence(3, 4);
    graph.register_precedence(4, 5);
    graph.register_precedence(3, 5);

    let reduced = graph.transitive_reduction();
    assert_eq!(edges_of(&reduced, 6), vec![(3, 4), (4, 5)]);
  }

  #[test]
  fn reduction_preserves_the_closure_and_is_minimal() {
    let mut graph = PrecGraph::new(7);
    let input = [(1, 2), (2, 3), (1, 3), (3, 4), (1, 4), (2, 4), (5, 6)];
    for (i, j) in input {
      graph.register_precedence(i, j);
    }

    let n = graph.node_count();
    let reduced_edges = edges_of(&graph.transitive_reduction(), n);

    // Same reachability as the input.
    let original = edges_of(&closure_of(&input, n), n);
    let reduced_closure = edges_of(&closure_of(&reduced_edges, n), n);
    assert_eq!(reduced_closure, original);

    // Removing any edge loses reachability.
    for skip in 0..reduced_edges.len() {
      let subset: Vec<(usize, usize)> = reduced_edges
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != skip)
        .map(|(_, &e)| e)
        .collect();
      assert_ne!(edges_of(&closure_of(&subset, n), n), original);
    }
  }
}
