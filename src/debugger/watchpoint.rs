//! Fixed-capacity watchpoint pool.
//!
//! Slots live in one backing array and are threaded onto exactly one of two
//! singly linked index lists: the free list or the active list. New
//! watchpoints go to the head of the active list, so enumeration is most
//! recent first. A watchpoint's id is its slot index and is reused once the
//! slot is released.

use std::fmt;

use log::{debug, error, info};

use crate::debugger::expr::EvalContext;

/// Number of watchpoint slots
pub const NR_WATCHPOINTS: usize = 32;

/// An expression re-checked after every step
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Watchpoint {
    /// Slot number, unique among active watchpoints
    id: usize,
    /// Expression text as typed
    expression: String,
    /// Value seen at creation or at the last change
    old_value: u32,
}

impl Watchpoint {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn old_value(&self) -> u32 {
        self.old_value
    }
}

impl fmt::Display for Watchpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Watchpoint {}: {}", self.id, self.expression)
    }
}

/// A watchpoint whose value changed during `check_all`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchChange {
    pub id: usize,
    pub expression: String,
    pub old_value: u32,
    pub new_value: u32,
}

impl fmt::Display for WatchChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Watchpoint {}: {}\nOld value = {}\nNew value = {}",
            self.id, self.expression, self.old_value, self.new_value
        )
    }
}

#[derive(Debug)]
struct Slot {
    /// Next slot on whichever list this slot is on
    next: Option<usize>,
    /// Present exactly when the slot is on the active list
    watch: Option<Watchpoint>,
}

/// Watchpoint storage with free/active list partitioning
#[derive(Debug)]
pub struct WatchpointPool {
    slots: Vec<Slot>,
    /// Head of the free list
    free: Option<usize>,
    /// Head of the active list
    active: Option<usize>,
}

impl Default for WatchpointPool {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchpointPool {
    /// Create a pool with `NR_WATCHPOINTS` slots
    pub fn new() -> Self {
        Self::with_capacity(NR_WATCHPOINTS)
    }

    /// Create a pool with a fixed number of slots; it never grows
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|i| Slot {
                next: if i + 1 < capacity { Some(i + 1) } else { None },
                watch: None,
            })
            .collect();

        Self {
            slots,
            free: if capacity > 0 { Some(0) } else { None },
            active: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of active watchpoints
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_none()
    }

    pub fn is_full(&self) -> bool {
        self.free.is_none()
    }

    /// Take a free slot for `expression`, whose current value is `value`.
    ///
    /// # Panics
    ///
    /// The pool is sized at build time; running out of slots is a fatal
    /// error, not something callers are expected to recover from.
    pub fn allocate(&mut self, expression: impl Into<String>, value: u32) -> usize {
        let Some(index) = self.free else {
            error!("No free watchpoint ({} in use)", self.capacity());
            panic!("watchpoint pool exhausted: all {} slots are in use", self.capacity());
        };

        let slot = &mut self.slots[index];
        self.free = slot.next;
        slot.next = self.active;
        slot.watch = Some(Watchpoint {
            id: index,
            expression: expression.into(),
            old_value: value,
        });
        self.active = Some(index);

        debug!("Allocated watchpoint {}", index);
        index
    }

    /// Unlink an active watchpoint and return its slot to the free list.
    ///
    /// Returns `false`, changing nothing, if `id` is not active.
    pub fn release(&mut self, id: usize) -> bool {
        let mut prev: Option<usize> = None;
        let mut cursor = self.active;

        while let Some(index) = cursor {
            let next = self.slots[index].next;
            if index == id {
                match prev {
                    Some(p) => self.slots[p].next = next,
                    None => self.active = next,
                }
                let slot = &mut self.slots[index];
                slot.watch = None;
                slot.next = self.free;
                self.free = Some(index);

                debug!("Released watchpoint {}", id);
                return true;
            }
            prev = cursor;
            cursor = next;
        }

        debug!("Watchpoint {} is not active", id);
        false
    }

    /// Find an active watchpoint
    pub fn lookup(&self, id: usize) -> Option<&Watchpoint> {
        self.iter().find(|wp| wp.id == id)
    }

    /// Active watchpoints, most recently created first
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            pool: self,
            cursor: self.active,
        }
    }

    /// `(id, expression)` pairs in enumeration order
    pub fn entries(&self) -> Vec<(usize, &str)> {
        self.iter().map(|wp| (wp.id, wp.expression.as_str())).collect()
    }

    /// Re-evaluate every active watchpoint, recording new values.
    ///
    /// Returns the watchpoints that changed, in enumeration order.
    ///
    /// # Panics
    ///
    /// A watchpoint expression was valid when it was created; failing to
    /// evaluate it now is treated as a fatal error.
    pub fn check_all(&mut self, ctx: &EvalContext<'_>) -> Vec<WatchChange> {
        let mut changes = Vec::new();
        let mut cursor = self.active;

        while let Some(index) = cursor {
            let slot = &mut self.slots[index];
            cursor = slot.next;
            let Some(wp) = slot.watch.as_mut() else {
                panic!("active watchpoint slot {} holds no watchpoint", index);
            };

            let value = match ctx.evaluate(&wp.expression) {
                Ok(value) => value,
                Err(e) => {
                    error!("Watchpoint {} '{}' no longer evaluates: {}", wp.id, wp.expression, e);
                    panic!("invalid watchpoint expression '{}': {}", wp.expression, e);
                }
            };

            if value != wp.old_value {
                info!("Watchpoint {} changed: {} -> {}", wp.id, wp.old_value, value);
                changes.push(WatchChange {
                    id: wp.id,
                    expression: wp.expression.clone(),
                    old_value: wp.old_value,
                    new_value: value,
                });
                wp.old_value = value;
            }
        }

        changes
    }

    /// Slot indices on the free list, head first
    fn free_slots(&self) -> Vec<usize> {
        let mut indices = Vec::new();
        let mut cursor = self.free;
        while let Some(index) = cursor {
            indices.push(index);
            cursor = self.slots[index].next;
        }
        indices
    }

    /// True when every slot is on exactly one list and only active slots
    /// hold a watchpoint
    pub fn is_partitioned(&self) -> bool {
        let mut seen = vec![false; self.capacity()];
        let active: Vec<usize> = self.iter().map(Watchpoint::id).collect();
        let free = self.free_slots();

        for &index in active.iter().chain(free.iter()) {
            if index >= seen.len() || seen[index] {
                return false;
            }
            seen[index] = true;
        }

        seen.iter().all(|s| *s)
            && active.iter().all(|&i| self.slots[i].watch.is_some())
            && free.iter().all(|&i| self.slots[i].watch.is_none())
    }
}

/// Iterator over active watchpoints
pub struct Iter<'a> {
    pool: &'a WatchpointPool,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Watchpoint;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let slot = &self.pool.slots[index];
        self.cursor = slot.next;
        slot.watch.as_ref()
    }
}
