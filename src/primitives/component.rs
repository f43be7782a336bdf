//! Component - A plain owner node.
//!
//! The smallest unit bindings attach to. It has no behavior of its own:
//! it gives its children a parent context and its bindings an owner whose
//! release tears them down.
//!
//! # Example
//!
//! ```ignore
//! let cleanup = component(ComponentProps {
//!     children: Some(Box::new(move || {
//!         use_event("save", Handler::new(|doc: &Doc| persist(doc)), None);
//!     })),
//!     ..Default::default()
//! });
//!
//! cleanup(); // unsubscribes "save"
//! ```

use super::types::{Cleanup, ComponentProps};
use crate::engine::{allocate_child_index, pop_parent_context, push_parent_context, release_index};

/// Mount an owner node under the current parent context.
///
/// Returns a cleanup that releases the node and, recursively, every node and
/// binding created under it.
pub fn component(props: ComponentProps) -> Cleanup {
    // 1. ALLOCATE INDEX (parent comes from the context stack)
    let index = allocate_child_index(props.id.as_deref());

    // 2. RENDER CHILDREN
    if let Some(children) = props.children {
        push_parent_context(index);
        children();
        pop_parent_context();
    }

    // 3. RETURN CLEANUP
    Box::new(move || release_index(index))
}
