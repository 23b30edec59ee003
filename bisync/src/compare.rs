//! Execution ordering of decisions.
//!
//! The engine emits decisions in walk order; an executor free to
//! reorder can sort with [`execution_order`] instead. The contract: a
//! directory comes before its content when it must exist first
//! (creations, replacements), and after it when the content must be
//! drained first (deletions).

use std::cmp::Ordering;

use crate::decision::{Decision, DecisionFlag};

/// Total order over decisions compatible with sequential execution.
pub fn execution_order(a: &Decision, b: &Decision) -> Ordering {
    if a.path == b.path {
        return Ordering::Equal;
    }

    let a_ancestor = a.path.is_prefix_of(&b.path);
    let b_ancestor = b.path.is_prefix_of(&a.path);
    if !a_ancestor && !b_ancestor {
        return a.path.cmp(&b.path);
    }

    let ancestor = if a_ancestor { a } else { b };
    let parent_after = matches!(
        ancestor.flag,
        DecisionFlag::DeleteLocal
            | DecisionFlag::DeleteRemote
            | DecisionFlag::DeleteLocalAndCreateDirLocal
    );

    match (a_ancestor, parent_after) {
        // a is the ancestor: descendants first iff the ancestor deletes.
        (true, true) => Ordering::Greater,
        (true, false) => Ordering::Less,
        // b is the ancestor.
        (false, true) => Ordering::Less,
        (false, false) => Ordering::Greater,
    }
}
