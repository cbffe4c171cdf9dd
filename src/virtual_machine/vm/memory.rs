use crate::virtual_machine::errors::Fault;
use crate::virtual_machine::operand::Address;
use std::collections::BTreeMap;

/// Sparse named memory.
///
/// A cell is allocated exactly when its address is present in the map.
/// Freed and never-stored addresses are indistinguishable. Iteration is
/// ordered by address name, which keeps state dumps stable.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Memory {
    cells: BTreeMap<Address, i64>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value at `address`.
    ///
    /// Returns [`Fault::UnallocatedMemory`] if `address` is not allocated.
    pub fn load(&self, address: &Address) -> Result<i64, Fault> {
        self.cells
            .get(address)
            .copied()
            .ok_or_else(|| Fault::UnallocatedMemory {
                address: address.clone(),
            })
    }

    /// Allocates `address` or overwrites its value.
    ///
    /// Returns the previous value, if any.
    pub(super) fn store(&mut self, address: &Address, value: i64) -> Option<i64> {
        match self.cells.get_mut(address) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.cells.insert(address.clone(), value);
                None
            }
        }
    }

    /// Deallocates `address`, returning the value it held.
    ///
    /// Returns [`Fault::UnallocatedMemory`] if `address` is not allocated.
    pub(super) fn free(&mut self, address: &Address) -> Result<i64, Fault> {
        self.cells
            .remove(address)
            .ok_or_else(|| Fault::UnallocatedMemory {
                address: address.clone(),
            })
    }

    pub fn is_allocated(&self, address: &Address) -> bool {
        self.cells.contains_key(address)
    }

    /// Number of allocated cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Allocated cells in address-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, i64)> {
        self.cells.iter().map(|(a, v)| (a, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(name: &str) -> Address {
        Address::new(name).unwrap()
    }

    #[test]
    fn load_unallocated() {
        let mem = Memory::new();
        assert_eq!(
            mem.load(&addr("a")),
            Err(Fault::UnallocatedMemory { address: addr("a") })
        );
        assert!(!mem.is_allocated(&addr("a")));
    }

    #[test]
    fn store_allocates_then_overwrites() {
        let mut mem = Memory::new();
        assert_eq!(mem.store(&addr("a"), 1), None);
        assert_eq!(mem.store(&addr("a"), 2), Some(1));
        assert_eq!(mem.load(&addr("a")), Ok(2));
        assert_eq!(mem.len(), 1);
    }

    #[test]
    fn free_deallocates() {
        let mut mem = Memory::new();
        mem.store(&addr("a"), 5);
        assert_eq!(mem.free(&addr("a")), Ok(5));
        assert!(mem.is_empty());
        assert!(mem.load(&addr("a")).is_err());
        assert_eq!(
            mem.free(&addr("a")),
            Err(Fault::UnallocatedMemory { address: addr("a") })
        );
    }

    #[test]
    fn iter_is_name_ordered() {
        let mut mem = Memory::new();
        mem.store(&addr("b"), 2);
        mem.store(&addr("a"), 1);
        mem.store(&addr("c"), 3);
        let names: Vec<_> = mem.iter().map(|(a, v)| (a.name().to_string(), v)).collect();
        assert_eq!(
            names,
            vec![("a".into(), 1), ("b".into(), 2), ("c".into(), 3)]
        );
    }
}
