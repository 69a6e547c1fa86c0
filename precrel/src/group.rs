//! Grouping of nodes with identical predecessor and successor sets into
//! synthetic group nodes.

use crate::{insert_sorted, Node, PrecGraph};

const VISITED_FATHER: u8 = 1;
const VISITED_SON: u8 = 2;

impl PrecGraph {
  /// Collapse every non-trivial equivalence class of nodes that share
  /// their successor and predecessor lists into a single group node.
  pub fn group_relations(&mut self) {
    let mut mark = vec![0u8; self.nodes.len()];
    let root = self.virtual_root();
    self.depth_grouping(root, &mut mark);
  }

  /// Node 0 doubles as a virtual root with an edge to every node that has
  /// successors but no predecessors, or whose only predecessor is the
  /// root itself.
  fn virtual_root(&mut self) -> usize {
    self.nodes[0].succ.clear();
    for i in 1..self.nodes.len() {
      let rootless = self.nodes[i].pred.is_empty() || self.nodes[i].pred[0] == 0;
      if rootless && !self.nodes[i].succ.is_empty() {
        self.nodes[0].succ.push(i);
        if self.nodes[i].pred.first() != Some(&0) {
          self.nodes[i].pred.insert(0, 0);
        }
      }
    }
    0
  }

  fn depth_grouping(&mut self, node: usize, mark: &mut Vec<u8>) {
    if mark[node] & VISITED_FATHER != 0 {
      return;
    }
    mark[node] |= VISITED_FATHER;

    let mut i = 0;
    while i < self.nodes[node].succ.len() {
      let son = self.nodes[node].succ[i];
      if mark[son] & VISITED_SON != 0 {
        i += 1;
        continue;
      }
      mark[son] |= VISITED_SON;

      // The equivalence class of `son` among the remaining successors.
      let brothers: Vec<usize> = self.nodes[node].succ[i + 1..]
        .iter()
        .copied()
        .filter(|&b| {
          mark[b] & VISITED_SON == 0
            && self.nodes[b].succ == self.nodes[son].succ
            && self.nodes[b].pred == self.nodes[son].pred
        })
        .collect();

      if !brothers.is_empty() {
        let group = self.create_group(son, &brothers, mark);
        self.replace_links(group);
        // The successor list changed; re-examine this slot.
        continue;
      }
      i += 1;
    }

    let succ = self.nodes[node].succ.clone();
    for son in succ {
      self.depth_grouping(son, mark);
    }
  }

  /// A new group node inheriting copies of `son`'s edge lists.
  fn create_group(&mut self, son: usize, brothers: &[usize], mark: &mut Vec<u8>) -> usize {
    let id = self.nodes.len();
    let mut members = vec![son];
    members.extend_from_slice(brothers);
    self.nodes.push(Node {
      succ: self.nodes[son].succ.clone(),
      pred: self.nodes[son].pred.clone(),
      members,
    });
    mark.push(0);
    id
  }

  /// External neighbors point at the group instead of its members, and
  /// the members lose the edges the group now represents.
  fn replace_links(&mut self, group: usize) {
    let preds = self.nodes[group].pred.clone();
    let succs = self.nodes[group].succ.clone();
    let members = self.nodes[group].members.clone();

    for p in preds.iter().copied() {
      remove_ids(&mut self.nodes[p].succ, &members);
      insert_sorted(&mut self.nodes[p].succ, group);
    }
    for s in succs.iter().copied() {
      remove_ids(&mut self.nodes[s].pred, &members);
      insert_sorted(&mut self.nodes[s].pred, group);
    }
    for m in members.iter().copied() {
      remove_ids(&mut self.nodes[m].succ, &succs);
      remove_ids(&mut self.nodes[m].pred, &preds);
    }
  }
}

fn remove_ids(list: &mut Vec<usize>, ids: &[usize]) {
  list.retain(|x| !ids.contains(x));
}
