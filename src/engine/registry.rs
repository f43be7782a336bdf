//! Component Registry - Index allocation and component lifetimes.
//!
//! Manages the lifecycle of component indices:
//! - ID ↔ Index bidirectional mapping
//! - Free index pool for O(1) reuse
//! - Parent links, so teardown is recursive and ambient lookups can walk up
//! - Parent context stack for nested component creation
//! - Destroy callbacks, which is where bindings hang their unsubscribe
//!
//! The allocated set is a plain ordered set rather than a reactive one:
//! nothing subscribes to allocation changes, and ascending iteration keeps
//! release order and `get_allocated_indices` deterministic.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Map component ID to array index.
    static ID_TO_INDEX: RefCell<HashMap<String, usize>> = RefCell::new(HashMap::new());

    /// Map array index to component ID.
    static INDEX_TO_ID: RefCell<HashMap<usize, String>> = RefCell::new(HashMap::new());

    /// Set of currently allocated indices.
    static ALLOCATED_INDICES: RefCell<BTreeSet<usize>> = RefCell::new(BTreeSet::new());

    /// Parent of each allocated index (roots have no entry).
    static PARENTS: RefCell<HashMap<usize, usize>> = RefCell::new(HashMap::new());

    /// Pool of freed indices for reuse.
    static FREE_INDICES: RefCell<Vec<usize>> = RefCell::new(Vec::new());

    /// Next index to allocate if pool is empty.
    static NEXT_INDEX: RefCell<usize> = const { RefCell::new(0) };

    /// Counter for generating unique IDs.
    static ID_COUNTER: RefCell<usize> = const { RefCell::new(0) };

    /// Stack of parent indices for nested component creation.
    static PARENT_STACK: RefCell<Vec<usize>> = RefCell::new(Vec::new());

    /// Destroy callbacks registered per index, tagged with their handle.
    static DESTROY_CALLBACKS: RefCell<HashMap<usize, Vec<(usize, Box<dyn FnOnce()>)>>> = RefCell::new(HashMap::new());

    /// Next destroy callback handle. Never reset, so a stale handle cannot
    /// cancel a callback registered after a reset.
    static NEXT_DESTROY_ID: RefCell<usize> = const { RefCell::new(0) };
}

// =============================================================================
// Parent Context Stack
// =============================================================================

/// Get current parent index (None if at root).
pub fn get_current_parent_index() -> Option<usize> {
    PARENT_STACK.with(|stack| {
        let stack = stack.borrow();
        stack.last().copied()
    })
}

/// Push a parent index onto the stack.
pub fn push_parent_context(index: usize) {
    PARENT_STACK.with(|stack| {
        stack.borrow_mut().push(index);
    })
}

/// Pop a parent index from the stack.
pub fn pop_parent_context() {
    PARENT_STACK.with(|stack| {
        stack.borrow_mut().pop();
    })
}

// =============================================================================
// Parent Links
// =============================================================================

/// Record the parent of a component.
pub fn set_parent_index(index: usize, parent: Option<usize>) {
    PARENTS.with(|parents| {
        let mut parents = parents.borrow_mut();
        match parent {
            Some(parent) => parents.insert(index, parent),
            None => parents.remove(&index),
        };
    })
}

/// Parent of a component, None for roots.
pub fn get_parent_index(index: usize) -> Option<usize> {
    PARENTS.with(|parents| parents.borrow().get(&index).copied())
}

/// Ancestors of `index`, nearest first, starting with `index` itself.
pub fn ancestors(index: usize) -> Vec<usize> {
    let mut chain = vec![index];
    let mut current = index;
    while let Some(parent) = get_parent_index(current) {
        // Guard against a corrupted link pointing back down the chain
        if chain.contains(&parent) {
            break;
        }
        chain.push(parent);
        current = parent;
    }
    chain
}

// =============================================================================
// Index Allocation
// =============================================================================

/// Allocate an index for a new component.
///
/// # Arguments
/// * `id` - Optional component ID. If not provided, one is generated.
///
/// # Returns
/// The allocated index.
pub fn allocate_index(id: Option<&str>) -> usize {
    // Generate ID if not provided
    let component_id = match id {
        Some(id) => id.to_string(),
        None => ID_COUNTER.with(|counter| {
            let mut counter = counter.borrow_mut();
            let id = format!("c{}", *counter);
            *counter += 1;
            id
        }),
    };

    // Check if already allocated
    let existing = ID_TO_INDEX.with(|map| map.borrow().get(&component_id).copied());
    if let Some(index) = existing {
        return index;
    }

    // Reuse free index or allocate new
    let index = FREE_INDICES.with(|free| {
        let mut free = free.borrow_mut();
        if let Some(index) = free.pop() {
            index
        } else {
            NEXT_INDEX.with(|next| {
                let mut next = next.borrow_mut();
                let index = *next;
                *next += 1;
                index
            })
        }
    });

    // Register mappings
    ID_TO_INDEX.with(|map| {
        map.borrow_mut().insert(component_id.clone(), index);
    });
    INDEX_TO_ID.with(|map| {
        map.borrow_mut().insert(index, component_id);
    });
    ALLOCATED_INDICES.with(|set| {
        set.borrow_mut().insert(index);
    });

    index
}

/// Allocate an index as a child of the current parent context.
pub fn allocate_child_index(id: Option<&str>) -> usize {
    let index = allocate_index(id);
    if let Some(parent) = get_current_parent_index() {
        if parent != index {
            set_parent_index(index, Some(parent));
        }
    }
    index
}

/// Release an index back to the pool.
///
/// Also recursively releases all children, deepest first, so a child's
/// destroy callbacks always run before its parent's.
pub fn release_index(index: usize) {
    let id = INDEX_TO_ID.with(|map| map.borrow().get(&index).cloned());
    let Some(id) = id else { return };

    // FIRST: Find and release all children (recursive!)
    // Collected up front to avoid modifying while iterating
    let children: Vec<usize> = PARENTS.with(|parents| {
        parents
            .borrow()
            .iter()
            .filter(|&(_, parent)| *parent == index)
            .map(|(child, _)| *child)
            .collect::<BTreeSet<usize>>()
            .into_iter()
            .rev()
            .collect()
    });

    for child_index in children {
        release_index(child_index);
    }

    // Run destroy callbacks before the index can be reused
    run_destroy_callbacks(index);

    // Clean up mappings
    ID_TO_INDEX.with(|map| {
        map.borrow_mut().remove(&id);
    });
    INDEX_TO_ID.with(|map| {
        map.borrow_mut().remove(&index);
    });
    ALLOCATED_INDICES.with(|set| {
        set.borrow_mut().remove(&index);
    });
    PARENTS.with(|parents| {
        parents.borrow_mut().remove(&index);
    });

    // Return to pool for reuse
    FREE_INDICES.with(|free| {
        free.borrow_mut().push(index);
    });

    // When all components are destroyed, start numbering from zero again
    let is_empty = ALLOCATED_INDICES.with(|set| set.borrow().is_empty());
    if is_empty {
        FREE_INDICES.with(|free| {
            free.borrow_mut().clear();
        });
        NEXT_INDEX.with(|next| {
            *next.borrow_mut() = 0;
        });
    }
}

// =============================================================================
// Destroy Callbacks
// =============================================================================

/// Register a callback to run when the component at `index` is destroyed.
///
/// Returns a handle for [`cancel_destroy`].
pub fn on_destroy(index: usize, callback: impl FnOnce() + 'static) -> usize {
    let id = NEXT_DESTROY_ID.with(|next| {
        let mut next = next.borrow_mut();
        let id = *next;
        *next += 1;
        id
    });
    DESTROY_CALLBACKS.with(|callbacks| {
        callbacks
            .borrow_mut()
            .entry(index)
            .or_default()
            .push((id, Box::new(callback)));
    });
    id
}

/// Drop a destroy callback without running it.
///
/// Returns false when it already ran or was cancelled.
pub fn cancel_destroy(index: usize, id: usize) -> bool {
    DESTROY_CALLBACKS.with(|callbacks| {
        let mut callbacks = callbacks.borrow_mut();
        let Some(list) = callbacks.get_mut(&index) else {
            return false;
        };
        let before = list.len();
        list.retain(|(callback_id, _)| *callback_id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            callbacks.remove(&index);
        }
        removed
    })
}

/// Number of pending destroy callbacks for an index (for testing).
pub fn destroy_callback_count(index: usize) -> usize {
    DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow().get(&index).map_or(0, Vec::len))
}

/// Run and clear destroy callbacks for an index, in registration order.
fn run_destroy_callbacks(index: usize) {
    // Taken out first: a callback may register or release other components
    let callbacks = DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().remove(&index));
    if let Some(callbacks) = callbacks {
        for (_, callback) in callbacks {
            callback();
        }
    }
}

// =============================================================================
// Lookups
// =============================================================================

/// Get index for a component ID.
pub fn get_index(id: &str) -> Option<usize> {
    ID_TO_INDEX.with(|map| map.borrow().get(id).copied())
}

/// Get ID for an index.
pub fn get_id(index: usize) -> Option<String> {
    INDEX_TO_ID.with(|map| map.borrow().get(&index).cloned())
}

/// Get all currently allocated indices, ascending.
pub fn get_allocated_indices() -> Vec<usize> {
    ALLOCATED_INDICES.with(|set| set.borrow().iter().copied().collect())
}

/// Check if an index is currently allocated.
pub fn is_allocated(index: usize) -> bool {
    ALLOCATED_INDICES.with(|set| set.borrow().contains(&index))
}

/// Get the count of currently allocated components.
pub fn get_allocated_count() -> usize {
    ALLOCATED_INDICES.with(|set| set.borrow().len())
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset all registry state (for testing).
pub fn reset_registry() {
    ID_TO_INDEX.with(|map| map.borrow_mut().clear());
    INDEX_TO_ID.with(|map| map.borrow_mut().clear());
    ALLOCATED_INDICES.with(|set| set.borrow_mut().clear());
    PARENTS.with(|parents| parents.borrow_mut().clear());
    FREE_INDICES.with(|free| free.borrow_mut().clear());
    NEXT_INDEX.with(|next| *next.borrow_mut() = 0);
    ID_COUNTER.with(|counter| *counter.borrow_mut() = 0);
    PARENT_STACK.with(|stack| stack.borrow_mut().clear());
    DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().clear());
}
