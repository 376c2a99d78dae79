use std::collections::TryReserveError;
use std::num::NonZeroUsize;

/// A fixed-capacity FIFO window over the most recent values.
///
/// Pushing into a full window evicts and returns the oldest value, so the
/// length never exceeds the capacity and stays at capacity once reached.
/// Eviction moves the head index instead of shifting the stored values.
#[derive(Debug, Clone)]
pub struct Window<T> {
    /// Backing storage, allocated once with exactly `capacity` slots.
    slots: Box<[T]>,
    /// Slot holding the oldest value.
    head: usize,
    /// Number of values currently held.
    len: usize,
}

impl<T: Default + Copy> Window<T> {
    /// Creates an empty window holding at most `capacity` values.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self::from_slots(vec![T::default(); capacity.get()])
    }

    /// Creates an empty window, reporting allocation failure instead of aborting.
    pub fn try_new(capacity: NonZeroUsize) -> Result<Self, TryReserveError> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity.get())?;
        slots.resize(capacity.get(), T::default());
        Ok(Self::from_slots(slots))
    }

    fn from_slots(slots: Vec<T>) -> Self {
        Self {
            slots: slots.into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// Maximum number of values the window holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of values currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no value has been pushed since creation or the last clear.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` once the window holds `capacity` values.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Appends `value` as the newest element.
    ///
    /// Returns the evicted oldest value when the window was already full.
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.is_full() {
            let evicted = core::mem::replace(&mut self.slots[self.head], value);
            self.head = self.wrap(self.head + 1);
            Some(evicted)
        } else {
            let tail = self.wrap(self.head + self.len);
            self.slots[tail] = value;
            self.len += 1;
            None
        }
    }

    /// Newest value in the window.
    pub fn back(&self) -> Option<T> {
        (!self.is_empty()).then(|| self.slots[self.wrap(self.head + self.len - 1)])
    }

    /// Empties the window without releasing its storage.
    pub fn clear(&mut self) {
        self.slots.fill(T::default());
        self.head = 0;
        self.len = 0;
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (tail, wrapped) = if self.head + self.len <= self.capacity() {
            (&self.slots[self.head..self.head + self.len], &self.slots[..0])
        } else {
            let split = self.head + self.len - self.capacity();
            (&self.slots[self.head..], &self.slots[..split])
        };
        tail.iter().chain(wrapped.iter())
    }

    #[inline]
    fn wrap(&self, index: usize) -> usize {
        if index >= self.capacity() {
            index - self.capacity()
        } else {
            index
        }
    }
}
