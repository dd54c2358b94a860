//! Generic pre/post visitor walk over the AST, with mutation primitives
//! safe to call while the enclosing container is still being iterated.
//!
//! A visitor is an open map from node-type tag (plus the wildcard `"*"`)
//! to callback pairs; Rust has no reflective "map over tag name" the way
//! the spec abstractly describes one, so [`Visitor`] is a
//! `HashMap<&'static str, Vec<NodeCallbacks>>` built through a small
//! fluent API (`Visitor::new().on(...)`), with multiple registrations
//! for the same tag accumulating (this is how the optimizer runs the
//! *union* of several transforms' visitors in one pass).
//!
//! Unlike a garbage-collected host, there is no way to hand a callback
//! both a live `&mut` reference to the node it can mutate and a `&`
//! reference to an ancestor at the same time without violating Rust's
//! aliasing rules — a callback holding both could use the parent
//! reference to reach back into the very subtree it's mutating. So
//! `Path` exposes the current node, its slot `key`/`index`, and the
//! mutation primitives, but not a live `parent`/`ast` reference; a
//! visitor that needs ancestor context tracks it itself across its
//! `enter`/`exit` pair (both are `FnMut`, so they can close over shared
//! state such as a depth counter or an explicit stack).

use std::collections::HashMap;

use super::errors::{OnigError, OnigResult};
use super::nodes::Node;

/// Which slot a [`Path`] currently points into.
enum Slot<'a> {
    /// An element of an array container (`elements`, `alternatives`) at
    /// `index`.
    Array { items: &'a mut Vec<Node>, index: usize },
    /// A single `Box<Node>` link (`pattern`, `flags`, `element`, `min`,
    /// `max`).
    Single { slot: &'a mut Node, key: &'static str },
}

/// The callback argument. Exposes the current node and the mutation
/// primitives from spec.md §4.4.
pub struct Path<'a> {
    slot: Slot<'a>,
    skip: bool,
    removed: bool,
    /// Extra amount added to the array loop's normal `+1` advance; only
    /// meaningful for `Slot::Array`.
    shift: i64,
}

impl<'a> Path<'a> {
    fn node_ref(&self) -> &Node {
        match &self.slot {
            Slot::Array { items, index } => &items[*index],
            Slot::Single { slot, .. } => slot,
        }
    }

    fn node_mut_ref(&mut self) -> &mut Node {
        match &mut self.slot {
            Slot::Array { items, index } => &mut items[*index],
            Slot::Single { slot, .. } => slot,
        }
    }

    pub fn node(&self) -> &Node {
        self.node_ref()
    }

    pub fn node_mut(&mut self) -> &mut Node {
        self.node_mut_ref()
    }

    /// Slot name for a single-child link (`"pattern"`, `"element"`, ...),
    /// or the array field name (`"elements"`, `"alternatives"`) for an
    /// array container.
    pub fn key(&self) -> &'static str {
        match &self.slot {
            Slot::Array { .. } => "elements",
            Slot::Single { key, .. } => key,
        }
    }

    /// Index within the enclosing array container, if any.
    pub fn index(&self) -> Option<usize> {
        match &self.slot {
            Slot::Array { index, .. } => Some(*index),
            Slot::Single { .. } => None,
        }
    }

    /// Swap the current node. Children of `new_node` are walked only if
    /// `traverse` is true.
    pub fn replace_with(&mut self, new_node: Node, traverse: bool) {
        *self.node_mut_ref() = new_node;
        self.skip = !traverse;
    }

    /// Replace the current node with an array slice. Only valid inside
    /// an array container. When `traverse` is true, each inserted node
    /// is walked by the active visitor (full enter/exit dispatch) before
    /// the loop continues past them; when false, the loop skips past
    /// them entirely, visiting each following sibling exactly once.
    pub fn replace_with_multiple(&mut self, nodes: Vec<Node>, traverse: bool) -> OnigResult<()> {
        match &mut self.slot {
            Slot::Array { items, index } => {
                let k = nodes.len();
                items.splice(*index..*index + 1, nodes);
                self.shift = if traverse { -1 } else { k as i64 - 1 };
                self.skip = true;
                self.removed = true; // the original node no longer exists
                Ok(())
            }
            Slot::Single { .. } => Err(OnigError::invariant(
                "replaceWithMultiple is only valid inside an array container",
            )),
        }
    }

    /// Remove the current node from its container. Implicitly `skip`s.
    pub fn remove(&mut self) -> OnigResult<()> {
        match &mut self.slot {
            Slot::Array { items, index } => {
                items.remove(*index);
                self.removed = true;
                self.skip = true;
                self.shift = -1;
                Ok(())
            }
            Slot::Single { .. } => Err(OnigError::invariant(
                "remove is only valid inside an array container",
            )),
        }
    }

    /// Splice out every sibling before the current node.
    pub fn remove_all_prev_siblings(&mut self) -> OnigResult<()> {
        match &mut self.slot {
            Slot::Array { items, index } => {
                items.drain(0..*index);
                self.shift = -(*index as i64);
                *index = 0;
                Ok(())
            }
            Slot::Single { .. } => Err(OnigError::invariant(
                "removeAllPrevSiblings is only valid inside an array container",
            )),
        }
    }

    /// Splice out every sibling after the current node.
    pub fn remove_all_next_siblings(&mut self) -> OnigResult<()> {
        match &mut self.slot {
            Slot::Array { items, index } => {
                items.truncate(*index + 1);
                Ok(())
            }
            Slot::Single { .. } => Err(OnigError::invariant(
                "removeAllNextSiblings is only valid inside an array container",
            )),
        }
    }

    /// Do not descend into this node's children.
    pub fn skip(&mut self) {
        self.skip = true;
    }
}

type Callback = Box<dyn FnMut(&mut Path) -> OnigResult<()>>;

/// One transform's `{enter, exit}` pair for a single tag.
#[derive(Default)]
pub struct NodeCallbacks {
    enter: Option<Callback>,
    exit: Option<Callback>,
}

/// A mapping from node-type tag (plus the wildcard `"*"`) to the
/// callback pairs registered against it. Built fluently; registrations
/// for the same tag accumulate rather than overwrite, so several
/// transforms can be merged into one visitor for a single pass.
#[derive(Default)]
pub struct Visitor {
    callbacks: HashMap<&'static str, Vec<NodeCallbacks>>,
}

impl Visitor {
    pub fn new() -> Self {
        Visitor::default()
    }

    /// Register an `enter`-only callback for `tag` (`"*"` for wildcard).
    pub fn on(
        mut self,
        tag: &'static str,
        enter: impl FnMut(&mut Path) -> OnigResult<()> + 'static,
    ) -> Self {
        self.callbacks.entry(tag).or_default().push(NodeCallbacks {
            enter: Some(Box::new(enter)),
            exit: None,
        });
        self
    }

    /// Register an `{enter, exit}` pair for `tag`.
    pub fn on_with_exit(
        mut self,
        tag: &'static str,
        enter: impl FnMut(&mut Path) -> OnigResult<()> + 'static,
        exit: impl FnMut(&mut Path) -> OnigResult<()> + 'static,
    ) -> Self {
        self.callbacks.entry(tag).or_default().push(NodeCallbacks {
            enter: Some(Box::new(enter)),
            exit: Some(Box::new(exit)),
        });
        self
    }

    /// Register a wildcard (`"*"`) `enter`-only callback.
    pub fn on_any(self, enter: impl FnMut(&mut Path) -> OnigResult<()> + 'static) -> Self {
        self.on("*", enter)
    }

    /// Fold `other`'s registrations into `self`, tag by tag, preserving
    /// each side's relative order.
    pub fn merge(mut self, other: Visitor) -> Self {
        for (tag, mut cbs) in other.callbacks {
            self.callbacks.entry(tag).or_default().append(&mut cbs);
        }
        self
    }

    fn run_enter(&mut self, tag: &str, path: &mut Path) -> OnigResult<()> {
        if let Some(list) = self.callbacks.get_mut("*") {
            for cb in list.iter_mut() {
                if let Some(enter) = &mut cb.enter {
                    enter(path)?;
                }
                if path.removed {
                    return Ok(());
                }
            }
        }
        if let Some(list) = self.callbacks.get_mut(tag) {
            for cb in list.iter_mut() {
                if let Some(enter) = &mut cb.enter {
                    enter(path)?;
                }
                if path.removed {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    fn run_exit(&mut self, tag: &str, path: &mut Path) -> OnigResult<()> {
        if let Some(list) = self.callbacks.get_mut(tag) {
            for cb in list.iter_mut() {
                if let Some(exit) = &mut cb.exit {
                    exit(path)?;
                }
            }
        }
        if let Some(list) = self.callbacks.get_mut("*") {
            for cb in list.iter_mut() {
                if let Some(exit) = &mut cb.exit {
                    exit(path)?;
                }
            }
        }
        Ok(())
    }
}

/// Walk `root` with `visitor`, applying mutations in place.
pub fn traverse(root: &mut Node, visitor: &mut Visitor) -> OnigResult<()> {
    // The root itself has no container slot; dispatch its own
    // enter/children/exit directly, then walk its children.
    let tag = root.type_name();
    let mut path = Path {
        slot: Slot::Single { slot: root, key: "root" },
        skip: false,
        removed: false,
        shift: 0,
    };
    visitor.run_enter(tag, &mut path)?;
    if !path.removed && !path.skip {
        traverse_children(path.node_mut(), visitor)?;
    }
    if !path.removed {
        visitor.run_exit(tag, &mut path)?;
    }
    Ok(())
}

fn visit_slot(mut path: Path, visitor: &mut Visitor) -> OnigResult<(bool, i64)> {
    let tag = path.node_ref().type_name();
    visitor.run_enter(tag, &mut path)?;
    if !path.removed && !path.skip {
        traverse_children(path.node_mut(), visitor)?;
    }
    if !path.removed {
        visitor.run_exit(tag, &mut path)?;
    }
    Ok((path.removed, path.shift))
}

fn visit_array(items: &mut Vec<Node>, visitor: &mut Visitor) -> OnigResult<()> {
    let mut i: i64 = 0;
    while (i as usize) < items.len() {
        let idx = i as usize;
        let path = Path {
            slot: Slot::Array { items, index: idx },
            skip: false,
            removed: false,
            shift: 0,
        };
        let (_removed, shift) = visit_slot(path, visitor)?;
        i += 1 + shift;
        if i < 0 {
            i = 0;
        }
    }
    Ok(())
}

fn visit_single(slot: &mut Node, key: &'static str, visitor: &mut Visitor) -> OnigResult<()> {
    let path = Path {
        slot: Slot::Single { slot, key },
        skip: false,
        removed: false,
        shift: 0,
    };
    visit_slot(path, visitor).map(|_| ())
}

/// Dispatches to each node type's fixed child-order (spec.md §4.4).
fn traverse_children(node: &mut Node, visitor: &mut Visitor) -> OnigResult<()> {
    match node {
        Node::Regex(r) => {
            visit_single(&mut r.pattern, "pattern", visitor)?;
            visit_single(&mut r.flags, "flags", visitor)?;
        }
        Node::Pattern(p) => visit_array(&mut p.alternatives, visitor)?,
        Node::Alternative(a) => visit_array(&mut a.elements, visitor)?,
        Node::CharacterClass(c) => visit_array(&mut c.elements, visitor)?,
        Node::Group(g) => visit_array(&mut g.alternatives, visitor)?,
        Node::CapturingGroup(g) => visit_array(&mut g.alternatives, visitor)?,
        Node::AbsentFunction(a) => visit_array(&mut a.alternatives, visitor)?,
        Node::LookaroundAssertion(l) => visit_array(&mut l.alternatives, visitor)?,
        Node::CharacterClassRange(r) => {
            visit_single(&mut r.min, "min", visitor)?;
            visit_single(&mut r.max, "max", visitor)?;
        }
        Node::Quantifier(q) => visit_single(&mut q.element, "element", visitor)?,
        // Terminal: Assertion, Backreference, Character, CharacterSet,
        // Directive, Flags, Subroutine.
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::nodes::*;

    fn chars(s: &str) -> Node {
        create_alternative(
            s.bytes()
                .map(|b| create_character(b as u32, Default::default()).unwrap())
                .collect(),
        )
    }

    #[test]
    fn enter_counts_every_node_once() {
        let mut ast = create_pattern(vec![chars("ab"), chars("c")]);
        let count = std::cell::Cell::new(0);
        let mut visitor = Visitor::new().on_any(|_path| {
            count.set(count.get() + 1);
            Ok(())
        });
        traverse(&mut ast, &mut visitor).unwrap();
        // Pattern + 2 Alternatives + 3 Characters = 6
        assert_eq!(count.get(), 6);
    }

    #[test]
    fn replace_with_swaps_node_without_descending_by_default() {
        let mut ast = chars("a");
        let mut visitor = Visitor::new().on("Character", |path| {
            path.replace_with(create_character('b' as u32, Default::default()).unwrap(), false);
            Ok(())
        });
        traverse(&mut ast, &mut visitor).unwrap();
        if let Node::Alternative(a) = &ast {
            if let Node::Character(c) = &a.elements[0] {
                assert_eq!(c.value, 'b' as u32);
                return;
            }
        }
        panic!("unexpected shape");
    }

    #[test]
    fn remove_settles_cursor_on_former_next_sibling() {
        let mut ast = chars("abc");
        let visited = std::cell::RefCell::new(Vec::new());
        let mut visitor = Visitor::new().on("Character", |path| {
            if let Node::Character(c) = path.node() {
                visited.borrow_mut().push(c.value);
                if c.value == 'b' as u32 {
                    path.remove()?;
                }
            }
            Ok(())
        });
        traverse(&mut ast, &mut visitor).unwrap();
        assert_eq!(visited.into_inner(), vec!['a' as u32, 'b' as u32, 'c' as u32]);
        if let Node::Alternative(a) = &ast {
            assert_eq!(a.elements.len(), 2);
        }
    }

    #[test]
    fn remove_all_prev_siblings_still_visits_every_later_sibling() {
        let mut ast = chars("abcde");
        let visited = std::cell::RefCell::new(Vec::new());
        let mut visitor = Visitor::new().on("Character", |path| {
            if let Node::Character(c) = path.node() {
                visited.borrow_mut().push(c.value);
                if c.value == 'd' as u32 {
                    path.remove_all_prev_siblings()?;
                }
            }
            Ok(())
        });
        traverse(&mut ast, &mut visitor).unwrap();
        assert_eq!(
            visited.into_inner(),
            vec!['a' as u32, 'b' as u32, 'c' as u32, 'd' as u32, 'e' as u32]
        );
        if let Node::Alternative(a) = &ast {
            assert_eq!(a.elements.len(), 2);
        }
    }

    #[test]
    fn replace_with_multiple_no_traverse_visits_each_sibling_once() {
        let mut ast = create_pattern(vec![create_alternative(vec![
            create_character('a' as u32, Default::default()).unwrap(),
            create_character('b' as u32, Default::default()).unwrap(),
        ])]);
        let visited = std::cell::RefCell::new(Vec::new());
        let mut visitor = Visitor::new().on("Character", |path| {
            if let Node::Character(c) = path.node() {
                visited.borrow_mut().push(c.value);
                if c.value == 'a' as u32 {
                    let replacement = vec![
                        create_character('x' as u32, Default::default()).unwrap(),
                        create_character('y' as u32, Default::default()).unwrap(),
                    ];
                    path.replace_with_multiple(replacement, false)?;
                }
            }
            Ok(())
        });
        traverse(&mut ast, &mut visitor).unwrap();
        // 'x' and 'y' are not re-visited (traverse=false); 'b' is visited once.
        assert_eq!(visited.into_inner(), vec!['a' as u32, 'b' as u32]);
        if let Node::Pattern(p) = &ast {
            if let Node::Alternative(a) = &p.alternatives[0] {
                assert_eq!(a.elements.len(), 3);
            }
        }
    }

    #[test]
    fn replace_with_multiple_traverse_visits_inserted_nodes() {
        let mut ast = create_pattern(vec![create_alternative(vec![create_character(
            'a' as u32,
            Default::default(),
        )
        .unwrap()])]);
        let visited = std::cell::RefCell::new(Vec::new());
        let mut visitor = Visitor::new().on("Character", |path| {
            if let Node::Character(c) = path.node() {
                let v = c.value;
                visited.borrow_mut().push(v);
                if v == 'a' as u32 {
                    let replacement = vec![
                        create_character('x' as u32, Default::default()).unwrap(),
                        create_character('y' as u32, Default::default()).unwrap(),
                    ];
                    path.replace_with_multiple(replacement, true)?;
                }
            }
            Ok(())
        });
        traverse(&mut ast, &mut visitor).unwrap();
        assert_eq!(visited.into_inner(), vec!['a' as u32, 'x' as u32, 'y' as u32]);
    }

    #[test]
    fn skip_prevents_descent_into_children() {
        let mut ast = create_pattern(vec![chars("a")]);
        let mut saw_character = false;
        {
            let saw_character_cell = std::cell::Cell::new(false);
            let mut visitor = Visitor::new()
                .on("Alternative", |path: &mut Path| {
                    path.skip();
                    Ok(())
                })
                .on("Character", |_path| {
                    saw_character_cell.set(true);
                    Ok(())
                });
            traverse(&mut ast, &mut visitor).unwrap();
            saw_character = saw_character_cell.get();
        }
        assert!(!saw_character);
    }
}
