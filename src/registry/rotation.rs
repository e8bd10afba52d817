//! Round-robin rotation over a host's upstreams.
//!
//! A fixed ring of slots stored as a `Vec` plus a cursor index. Slots are
//! only ever appended; disabling an upstream flips its flag but keeps the slot.

use crate::registry::upstream::Upstream;

/// Ring of upstream slots with a persistent cursor.
#[derive(Debug, Default)]
pub struct Rotation {
    slots: Vec<Upstream>,
    /// Index of the last-returned (or initial) slot.
    cursor: usize,
}

impl Rotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a healthy upstream. The cursor does not move.
    pub fn push(&mut self, address: impl Into<String>) {
        self.slots.push(Upstream::new(address));
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Advance from the cursor to the first healthy slot and leave the cursor there.
    ///
    /// The scan visits every slot once, ending with the cursor slot itself.
    /// Returns `None` if no slot is healthy.
    pub fn advance(&mut self) -> Option<&Upstream> {
        let len = self.slots.len();
        for step in 1..=len {
            let index = (self.cursor + step) % len;
            if self.slots[index].is_healthy() {
                self.cursor = index;
                return Some(&self.slots[index]);
            }
        }
        None
    }

    pub fn find(&self, address: &str) -> Option<&Upstream> {
        self.slots.iter().find(|u| u.address == address)
    }

    /// Every slot registered under `address`; an address may be added more than once.
    pub fn matching_mut<'a>(
        &'a mut self,
        address: &'a str,
    ) -> impl Iterator<Item = &'a mut Upstream> + 'a {
        self.slots.iter_mut().filter(move |u| u.address == address)
    }

    /// Upstreams in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Upstream> {
        self.slots.iter()
    }
}
