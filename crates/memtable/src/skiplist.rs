//! Probabilistic skip list used as the memtable's ordered map.
//!
//! Nodes live in an arena (`Vec<Node>`) and reference each other by index,
//! which keeps the pointer graph (doubly linked levels plus up/down tower
//! links) in safe Rust and makes teardown a single `Vec` drop. Every level is
//! bracketed by a negative-infinity head sentinel and a positive-infinity
//! tail sentinel; base-level keys are strictly ascending and every node above
//! the base mirrors a node one level below.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Upper bound on tower height.
pub const MAX_LEVEL: usize = 16;

/// Per-level promotion probability.
pub const PROMOTION_P: f64 = 0.5;

type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    NegInf,
    Normal,
    PosInf,
}

struct Node {
    kind: NodeKind,
    key: Vec<u8>,
    /// Only meaningful on the base level; tower copies keep it empty.
    value: Vec<u8>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    up: Option<NodeId>,
    down: Option<NodeId>,
}

impl Node {
    fn sentinel(kind: NodeKind) -> Self {
        Node {
            kind,
            key: Vec::new(),
            value: Vec::new(),
            prev: None,
            next: None,
            up: None,
            down: None,
        }
    }
}

/// Ordered map from byte-string keys to byte-string values.
///
/// Supports upsert, point lookup, in-order iteration, and a tracked byte-size
/// estimate. Not internally synchronized — the owner provides locking.
pub struct SkipList {
    arena: Vec<Node>,
    /// Top-left sentinel.
    head: NodeId,
    /// Top-right sentinel.
    tail: NodeId,
    /// Number of levels above the base.
    levels: usize,
    entries: usize,
    size_bytes: usize,
    rng: StdRng,
}

impl SkipList {
    pub fn new() -> Self {
        let mut arena = Vec::new();
        arena.push(Node::sentinel(NodeKind::NegInf));
        arena.push(Node::sentinel(NodeKind::PosInf));
        arena[0].next = Some(1);
        arena[1].prev = Some(0);
        SkipList {
            arena,
            head: 0,
            tail: 1,
            levels: 0,
            entries: 0,
            size_bytes: 0,
            rng: StdRng::from_os_rng(),
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.arena.push(node);
        self.arena.len() - 1
    }

    /// Descends from the top-left sentinel to the base level, returning the
    /// greatest base node with key <= `key` (a sentinel if no such node).
    fn search(&self, key: &[u8]) -> NodeId {
        let mut cur = self.head;
        loop {
            while let Some(next) = self.arena[cur].next {
                let n = &self.arena[next];
                if n.kind == NodeKind::Normal && n.key.as_slice() <= key {
                    cur = next;
                } else {
                    break;
                }
            }
            match self.arena[cur].down {
                Some(down) => cur = down,
                None => break,
            }
        }
        cur
    }

    /// Point lookup. Returns the stored value (tombstones included — the
    /// caller applies the deletion convention).
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let node = &self.arena[self.search(key)];
        if node.kind == NodeKind::Normal && node.key == key {
            Some(&node.value)
        } else {
            None
        }
    }

    /// Inserts or overwrites `key`. A fresh key accrues `key.len() +
    /// value.len()` to the size estimate; overwriting an existing key does
    /// not re-accrue.
    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) {
        let found = self.search(&key);
        if self.arena[found].kind == NodeKind::Normal && self.arena[found].key == key {
            self.arena[found].value = value;
            return;
        }

        self.size_bytes += key.len() + value.len();
        self.entries += 1;

        let mut below = self.link_after(
            found,
            Node {
                kind: NodeKind::Normal,
                key: key.clone(),
                value,
                prev: None,
                next: None,
                up: None,
                down: None,
            },
        );

        // Build the tower: one coin flip per level, capped at MAX_LEVEL.
        let mut cur = found;
        let mut level = 0;
        while level < MAX_LEVEL && self.rng.random_bool(PROMOTION_P) {
            if level >= self.levels {
                self.grow();
            }
            // Walk left until a node with an up link, then climb. The left
            // sentinel always has one once the level above exists.
            loop {
                if let Some(up) = self.arena[cur].up {
                    cur = up;
                    break;
                }
                match self.arena[cur].prev {
                    Some(prev) => cur = prev,
                    None => return,
                }
            }
            let tower = self.link_after(
                cur,
                Node {
                    kind: NodeKind::Normal,
                    key: key.clone(),
                    value: Vec::new(),
                    prev: None,
                    next: None,
                    up: None,
                    down: Some(below),
                },
            );
            self.arena[below].up = Some(tower);
            below = tower;
            level += 1;
        }
    }

    /// Splices `node` into the list immediately after `after`.
    fn link_after(&mut self, after: NodeId, mut node: Node) -> NodeId {
        let next = self.arena[after].next;
        node.prev = Some(after);
        node.next = next;
        let id = self.alloc(node);
        if let Some(next) = next {
            self.arena[next].prev = Some(id);
        }
        self.arena[after].next = Some(id);
        id
    }

    /// Adds a fresh top level: a new sentinel pair linked above the old one.
    fn grow(&mut self) {
        self.levels += 1;
        let new_head = self.alloc(Node {
            down: Some(self.head),
            ..Node::sentinel(NodeKind::NegInf)
        });
        let new_tail = self.alloc(Node {
            down: Some(self.tail),
            ..Node::sentinel(NodeKind::PosInf)
        });
        self.arena[new_head].next = Some(new_tail);
        self.arena[new_tail].prev = Some(new_head);
        self.arena[self.head].up = Some(new_head);
        self.arena[self.tail].up = Some(new_tail);
        self.head = new_head;
        self.tail = new_tail;
    }

    /// Tracked byte-size estimate: the sum of `key.len() + value.len()` over
    /// first inserts. Never decremented.
    pub fn approx_size(&self) -> usize {
        self.size_bytes
    }

    /// Number of distinct keys (tombstones included).
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// In-order iteration over `(key, value)` on the base level.
    pub fn iter(&self) -> Iter<'_> {
        let mut cur = self.head;
        while let Some(down) = self.arena[cur].down {
            cur = down;
        }
        Iter {
            list: self,
            cur: self.arena[cur].next,
        }
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward iterator over the base level in ascending key order.
pub struct Iter<'a> {
    list: &'a SkipList,
    cur: Option<NodeId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cur?;
        let list = self.list;
        let node = &list.arena[id];
        if node.kind != NodeKind::Normal {
            self.cur = None;
            return None;
        }
        self.cur = node.next;
        Some((node.key.as_slice(), node.value.as_slice()))
    }
}
