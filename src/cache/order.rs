//! Recency ordering for the LRU cache
//!
//! Keys are kept in a doubly-linked list threaded through a slab of slots.
//! Links are `u32` slot indices, and the index holds a generation-checked
//! [`NodeHandle`] for O(1) relocation and removal. A handle whose slot has been
//! freed or reused no longer resolves.

use std::collections::TryReserveError;

/// Invalid node index marker
const INVALID_NODE: u32 = u32::MAX;

/// Handle to a node in an [`OrderList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeHandle {
    index: u32,
    generation: u32,
}

/// A key linked into the recency list
#[derive(Debug)]
struct OrderNode {
    key: String,
    /// Neighbour towards the head (more recently used)
    prev: u32,
    /// Neighbour towards the tail (less recently used)
    next: u32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<OrderNode>,
    /// Next vacant slot when this one is on the free list
    next_free: u32,
}

/// Doubly-linked recency list, most recently used at the head
#[derive(Debug)]
pub(crate) struct OrderList {
    slots: Vec<Slot>,
    head: u32,
    tail: u32,
    free_head: u32,
    len: usize,
}

impl Default for OrderList {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderList {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: INVALID_NODE,
            tail: INVALID_NODE,
            free_head: INVALID_NODE,
            len: 0,
        }
    }

    /// Number of linked nodes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list holds no nodes
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots allocated, live or free
    #[cfg(test)]
    pub fn slot_capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Reserve slot storage so that `total` nodes fit without reallocating
    pub fn try_reserve_total(&mut self, total: usize) -> Result<(), TryReserveError> {
        let additional = total.saturating_sub(self.slots.len());
        self.slots.try_reserve(additional)
    }

    /// Release unused slot storage beyond `total`
    ///
    /// Only trailing vacant slots can be dropped without invalidating handles,
    /// so this trims the tail of the slab and rebuilds the free list.
    pub fn shrink_to(&mut self, total: usize) {
        while self.slots.len() > total && self.slots.last().map_or(false, |s| s.node.is_none()) {
            self.slots.pop();
        }
        self.rebuild_free_list();
        self.slots.shrink_to(total);
    }

    fn rebuild_free_list(&mut self) {
        self.free_head = INVALID_NODE;
        for idx in (0..self.slots.len()).rev() {
            if self.slots[idx].node.is_none() {
                self.slots[idx].next_free = self.free_head;
                self.free_head = idx as u32;
            }
        }
    }

    /// Insert `key` at the head. Returns `None` if no slot can be allocated.
    pub fn push_front(&mut self, key: String) -> Option<NodeHandle> {
        let idx = self.allocate_slot()?;
        let old_head = self.head;

        let slot = &mut self.slots[idx as usize];
        slot.node = Some(OrderNode {
            key,
            prev: INVALID_NODE,
            next: old_head,
        });
        let handle = NodeHandle {
            index: idx,
            generation: slot.generation,
        };

        if old_head != INVALID_NODE {
            if let Some(node) = self.slots[old_head as usize].node.as_mut() {
                node.prev = idx;
            }
        } else {
            self.tail = idx;
        }
        self.head = idx;
        self.len += 1;
        Some(handle)
    }

    /// Relocate a node to the head. Returns `None` for a stale handle.
    pub fn move_to_front(&mut self, handle: NodeHandle) -> Option<()> {
        self.resolve(handle)?;
        if self.head == handle.index {
            return Some(());
        }
        self.unlink(handle.index);

        let old_head = self.head;
        if let Some(node) = self.slots[handle.index as usize].node.as_mut() {
            node.prev = INVALID_NODE;
            node.next = old_head;
        }
        if old_head != INVALID_NODE {
            if let Some(node) = self.slots[old_head as usize].node.as_mut() {
                node.prev = handle.index;
            }
        } else {
            self.tail = handle.index;
        }
        self.head = handle.index;
        Some(())
    }

    /// Unlink and free a node, returning its key. Returns `None` for a stale handle.
    pub fn remove(&mut self, handle: NodeHandle) -> Option<String> {
        self.resolve(handle)?;
        self.unlink(handle.index);
        self.release_slot(handle.index)
    }

    /// Unlink and free the least recently used node
    pub fn pop_back(&mut self) -> Option<String> {
        if self.tail == INVALID_NODE {
            return None;
        }
        let idx = self.tail;
        self.unlink(idx);
        self.release_slot(idx)
    }

    /// Key of the least recently used node
    pub fn back(&self) -> Option<&str> {
        self.node(self.tail).map(|n| n.key.as_str())
    }

    /// Key of the most recently used node
    #[cfg(test)]
    pub fn front(&self) -> Option<&str> {
        self.node(self.head).map(|n| n.key.as_str())
    }

    /// Key stored behind `handle`, if it is still live
    pub fn key(&self, handle: NodeHandle) -> Option<&str> {
        self.resolve(handle).map(|n| n.key.as_str())
    }

    /// Keys from most to least recently used
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Drop every node. Outstanding handles become stale.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.head = INVALID_NODE;
        self.tail = INVALID_NODE;
        self.len = 0;
        self.rebuild_free_list();
    }

    /// Walk the list in both directions and check it against `len`
    pub fn validate_links(&self) -> Result<(), String> {
        let mut count = 0usize;
        let mut prev = INVALID_NODE;
        let mut cursor = self.head;
        while cursor != INVALID_NODE {
            let node = self
                .node(cursor)
                .ok_or_else(|| format!("link to vacant slot {}", cursor))?;
            if node.prev != prev {
                return Err(format!(
                    "slot {} has back link {} but follows {}",
                    cursor, node.prev, prev
                ));
            }
            count += 1;
            if count > self.len {
                return Err(format!("forward walk exceeds length {}", self.len));
            }
            prev = cursor;
            cursor = node.next;
        }
        if count != self.len {
            return Err(format!(
                "forward walk found {} nodes, length is {}",
                count, self.len
            ));
        }
        if prev != self.tail {
            return Err(format!(
                "walk ended at slot {} but tail is {}",
                prev, self.tail
            ));
        }
        Ok(())
    }

    fn resolve(&self, handle: NodeHandle) -> Option<&OrderNode> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node(&self, idx: u32) -> Option<&OrderNode> {
        if idx == INVALID_NODE {
            return None;
        }
        self.slots.get(idx as usize).and_then(|s| s.node.as_ref())
    }

    fn allocate_slot(&mut self) -> Option<u32> {
        if self.free_head != INVALID_NODE {
            let idx = self.free_head;
            self.free_head = self.slots[idx as usize].next_free;
            return Some(idx);
        }
        let idx = self.slots.len();
        if idx >= INVALID_NODE as usize {
            return None;
        }
        self.slots.try_reserve(1).ok()?;
        self.slots.push(Slot {
            generation: 0,
            node: None,
            next_free: INVALID_NODE,
        });
        Some(idx as u32)
    }

    fn release_slot(&mut self, idx: u32) -> Option<String> {
        let slot = &mut self.slots[idx as usize];
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        slot.next_free = self.free_head;
        self.free_head = idx;
        self.len -= 1;
        Some(node.key)
    }

    /// Detach a live node from its neighbours without freeing it
    fn unlink(&mut self, idx: u32) {
        let (prev, next) = match self.slots[idx as usize].node.as_ref() {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        if prev != INVALID_NODE {
            if let Some(node) = self.slots[prev as usize].node.as_mut() {
                node.next = next;
            }
        } else {
            self.head = next;
        }

        if next != INVALID_NODE {
            if let Some(node) = self.slots[next as usize].node.as_mut() {
                node.prev = prev;
            }
        } else {
            self.tail = prev;
        }

        if let Some(node) = self.slots[idx as usize].node.as_mut() {
            node.prev = INVALID_NODE;
            node.next = INVALID_NODE;
        }
    }
}

/// Iterator over keys from most to least recently used
pub(crate) struct Iter<'a> {
    list: &'a OrderList,
    cursor: u32,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.node(self.cursor)?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some(node.key.as_str())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
