use std::fmt::{self, Debug, Formatter, Write};
use std::ops::{Index, IndexMut};

use ecow::EcoString;

use super::{Attr, Attrs, Glue, Node, Penalty};

/// A reference to a node in a [`NodeList`].
///
/// References are only meaningful together with the list that produced
/// them; using one with a different list is a programming error.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct NodeRef(u32);

impl NodeRef {
    fn idx(self) -> usize {
        self.0 as usize
    }
}

impl Debug for NodeRef {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Slot {
    node: Node,
    serial: u64,
    prev: Option<NodeRef>,
    next: Option<NodeRef>,
    attrs: Option<Box<Attrs>>,
}

/// An arena that owns typesetting nodes and links them into chains.
///
/// A chain is identified by its head reference; the empty chain is the
/// absence of one. Linking operations rewire neighbors in place and never
/// copy nodes. Unlinked nodes stay allocated until the list is dropped,
/// which bounds the lifetime of everything a paragraph produced.
///
/// Each node receives a serial that increases monotonically within its
/// list. Serials appear only in debug output; ordering and identity are
/// carried by the references themselves.
#[derive(Default)]
pub struct NodeList {
    slots: Vec<Slot>,
    serial: u64,
}

impl NodeList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new, unlinked node.
    pub fn add(&mut self, node: Node) -> NodeRef {
        let r = NodeRef(u32::try_from(self.slots.len()).expect("node list too large"));
        self.serial += 1;
        self.slots.push(Slot {
            node,
            serial: self.serial,
            prev: None,
            next: None,
            attrs: None,
        });
        r
    }

    /// The serial of a node, for diagnostics.
    pub fn serial(&self, node: NodeRef) -> u64 {
        self.slots[node.idx()].serial
    }

    /// The predecessor of a node in its chain.
    pub fn prev(&self, node: NodeRef) -> Option<NodeRef> {
        self.slots[node.idx()].prev
    }

    /// The successor of a node in its chain.
    pub fn next(&self, node: NodeRef) -> Option<NodeRef> {
        self.slots[node.idx()].next
    }

    /// An attribute of a node.
    pub fn attr(&self, node: NodeRef, key: &str) -> Option<&Attr> {
        self.slots[node.idx()].attrs.as_ref()?.get(key)
    }

    /// The full attribute map of a node, if it has one.
    pub fn attrs(&self, node: NodeRef) -> Option<&Attrs> {
        self.slots[node.idx()].attrs.as_deref()
    }

    /// Attach an attribute to a node.
    pub fn set_attr(&mut self, node: NodeRef, key: impl Into<EcoString>, value: Attr) {
        self.slots[node.idx()]
            .attrs
            .get_or_insert_with(Default::default)
            .insert(key.into(), value);
    }

    /// Insert `node` after `cursor`, returning the new head.
    ///
    /// With no cursor, `node` becomes the new head. O(1).
    pub fn insert_after(
        &mut self,
        head: Option<NodeRef>,
        cursor: Option<NodeRef>,
        node: NodeRef,
    ) -> NodeRef {
        debug_assert!(self.is_unlinked(node), "node is already linked");
        match cursor {
            None => self.make_head(head, node),
            Some(cursor) => {
                debug_assert!(head.is_some(), "cursor without a chain");
                let after = self.next(cursor);
                self.slots[cursor.idx()].next = Some(node);
                self.slots[node.idx()].prev = Some(cursor);
                self.slots[node.idx()].next = after;
                if let Some(after) = after {
                    self.slots[after.idx()].prev = Some(node);
                }
                head.unwrap_or(node)
            }
        }
    }

    /// Insert `node` before `cursor`, returning the new head.
    ///
    /// With no cursor, `node` becomes the new head. O(1).
    pub fn insert_before(
        &mut self,
        head: Option<NodeRef>,
        cursor: Option<NodeRef>,
        node: NodeRef,
    ) -> NodeRef {
        debug_assert!(self.is_unlinked(node), "node is already linked");
        match cursor {
            None => self.make_head(head, node),
            Some(cursor) => {
                let before = self.prev(cursor);
                self.slots[cursor.idx()].prev = Some(node);
                self.slots[node.idx()].next = Some(cursor);
                self.slots[node.idx()].prev = before;
                match before {
                    Some(before) => {
                        self.slots[before.idx()].next = Some(node);
                        head.unwrap_or(node)
                    }
                    None => node,
                }
            }
        }
    }

    fn make_head(&mut self, head: Option<NodeRef>, node: NodeRef) -> NodeRef {
        self.slots[node.idx()].next = head;
        if let Some(head) = head {
            self.slots[head.idx()].prev = Some(node);
        }
        node
    }

    fn is_unlinked(&self, node: NodeRef) -> bool {
        let slot = &self.slots[node.idx()];
        slot.prev.is_none() && slot.next.is_none()
    }

    /// Remove `node` from the chain starting at `head`, returning the new
    /// head (`None` if the chain became empty). The node stays allocated
    /// and can be relinked. O(1).
    pub fn unlink(&mut self, head: NodeRef, node: NodeRef) -> Option<NodeRef> {
        debug_assert!(
            self.iter(Some(head)).any(|r| r == node),
            "node is not part of this chain"
        );
        let prev = self.prev(node);
        let next = self.next(node);
        if let Some(prev) = prev {
            self.slots[prev.idx()].next = next;
        }
        if let Some(next) = next {
            self.slots[next.idx()].prev = prev;
        }
        self.slots[node.idx()].prev = None;
        self.slots[node.idx()].next = None;
        if node == head { next } else { Some(head) }
    }

    /// Sever a chain after `node`, returning the head of the detached
    /// remainder. O(1).
    pub fn split_after(&mut self, node: NodeRef) -> Option<NodeRef> {
        let rest = self.next(node)?;
        self.slots[node.idx()].next = None;
        self.slots[rest.idx()].prev = None;
        Some(rest)
    }

    /// The last node of a chain. O(n).
    pub fn tail(&self, head: Option<NodeRef>) -> Option<NodeRef> {
        let mut cur = head?;
        while let Some(next) = self.next(cur) {
            cur = next;
        }
        Some(cur)
    }

    /// Deep-copy a chain: every node is duplicated with a fresh serial and
    /// the same field values, recursing into disc pre-chains and the child
    /// chains of packed boxes. O(n).
    pub fn copy_list(&mut self, head: Option<NodeRef>) -> Option<NodeRef> {
        let mut copied = Chain::new();
        let mut cur = head;
        while let Some(r) = cur {
            cur = self.next(r);
            let mut node = self[r].clone();
            match &mut node {
                Node::Disc(disc) => disc.pre = self.copy_list(disc.pre),
                Node::HList(hbox) => hbox.head = self.copy_list(hbox.head),
                Node::VList(vbox) => vbox.head = self.copy_list(vbox.head),
                _ => {}
            }
            let attrs = self.slots[r.idx()].attrs.clone();
            let copy = self.add(node);
            self.slots[copy.idx()].attrs = attrs;
            copied.push_ref(self, copy);
        }
        copied.head()
    }

    /// Iterate over the nodes of a chain, front to back.
    pub fn iter(&self, head: Option<NodeRef>) -> Nodes<'_> {
        Nodes { list: self, cur: head }
    }

    /// Append the canonical paragraph terminator: an unbreakable penalty, a
    /// glue that can stretch without limit, and a forced break. This
    /// guarantees that the last line of a paragraph is never
    /// over-constrained.
    pub fn append_paragraph_end(&mut self, head: Option<NodeRef>) -> NodeRef {
        let mut chain = Chain::resume(self, head);
        chain.push(self, Node::Penalty(Penalty::prohibit()));
        chain.push(self, Node::Glue(Glue::fil()));
        chain.push(self, Node::Penalty(Penalty::force()));
        chain.head().expect("chain is nonempty")
    }

    /// A compact one-line rendering of a chain for diagnostics.
    pub fn debug_chain(&self, head: Option<NodeRef>) -> impl Debug + '_ {
        let list = self;
        let head_copy = head;
        galley_utils::debug(move |f| {
            let mut first = true;
            for r in list.iter(head_copy) {
                if !first {
                    f.write_char(' ')?;
                }
                first = false;
                let serial = list.serial(r);
                match &list[r] {
                    Node::Glyph(g) => {
                        write!(f, "[glyph#{serial} {:?} {:?}]", g.codepoint, g.width)?
                    }
                    Node::Glue(g) => write!(
                        f,
                        "[glue#{serial} {:?} plus {:?} minus {:?}]",
                        g.width, g.stretch, g.shrink
                    )?,
                    Node::Penalty(p) => write!(f, "[penalty#{serial} {}]", p.penalty)?,
                    Node::Disc(_) => write!(f, "[disc#{serial}]")?,
                    Node::Kern(k) => write!(f, "[kern#{serial} {:?}]", k.amount)?,
                    Node::Rule(r) => write!(f, "[rule#{serial} {:?}]", r.width)?,
                    Node::Image(i) => write!(f, "[image#{serial} {:?}]", i.width)?,
                    Node::Lang(l) => write!(f, "[lang#{serial} {}]", l.lang)?,
                    Node::StartStop(s) => {
                        write!(f, "[{}#{serial}]", if s.start { "start" } else { "stop" })?
                    }
                    Node::HList(b) => write!(f, "[hlist#{serial} {:?}]", b.width)?,
                    Node::VList(b) => write!(f, "[vlist#{serial} {:?}]", b.height)?,
                }
            }
            Ok(())
        })
    }
}

impl Index<NodeRef> for NodeList {
    type Output = Node;

    fn index(&self, r: NodeRef) -> &Node {
        &self.slots[r.idx()].node
    }
}

impl IndexMut<NodeRef> for NodeList {
    fn index_mut(&mut self, r: NodeRef) -> &mut Node {
        &mut self.slots[r.idx()].node
    }
}

/// An iterator over the nodes of a chain.
pub struct Nodes<'a> {
    list: &'a NodeList,
    cur: Option<NodeRef>,
}

impl Iterator for Nodes<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        let r = self.cur?;
        self.cur = self.list.next(r);
        Some(r)
    }
}

/// Incrementally builds a chain, keeping both ends at hand so appends stay
/// O(1).
#[derive(Default, Copy, Clone)]
pub struct Chain {
    head: Option<NodeRef>,
    tail: Option<NodeRef>,
}

impl Chain {
    /// Start an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue an existing chain, locating its tail. O(n) once.
    pub fn resume(list: &NodeList, head: Option<NodeRef>) -> Self {
        Self { head, tail: list.tail(head) }
    }

    /// Allocate `node` in `list` and append it.
    pub fn push(&mut self, list: &mut NodeList, node: Node) -> NodeRef {
        let r = list.add(node);
        self.push_ref(list, r);
        r
    }

    /// Append an existing, unlinked node.
    pub fn push_ref(&mut self, list: &mut NodeList, node: NodeRef) {
        self.head = Some(list.insert_after(self.head, self.tail, node));
        self.tail = Some(node);
    }

    /// Append a whole standalone chain.
    pub fn splice(&mut self, list: &mut NodeList, head: Option<NodeRef>) {
        let Some(first) = head else { return };
        debug_assert!(list.prev(first).is_none(), "spliced chain must be standalone");
        match self.tail {
            Some(tail) => {
                list.slots[tail.idx()].next = Some(first);
                list.slots[first.idx()].prev = Some(tail);
            }
            None => self.head = Some(first),
        }
        self.tail = list.tail(Some(first));
    }

    /// The head of the chain built so far.
    pub fn head(self) -> Option<NodeRef> {
        self.head
    }

    /// The tail of the chain built so far.
    pub fn tail(self) -> Option<NodeRef> {
        self.tail
    }
}
