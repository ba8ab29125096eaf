use crate::error::{DskError, Result};
use crate::sector::{SectorView, SectorViewMut};

/// The FDI holds exactly 128 pointers in its one sector.
pub const FDI_ENTRIES: usize = 128;

/// File Descriptor Index: sector 1, an array of 128 big-endian FDR
/// sector numbers. Zero marks a free slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptorIndex {
    entries: [u16; FDI_ENTRIES],
}

impl FileDescriptorIndex {
    pub fn new() -> Self {
        FileDescriptorIndex {
            entries: [0; FDI_ENTRIES],
        }
    }

    pub fn decode(sector: &SectorView) -> Result<Self> {
        let mut entries = [0u16; FDI_ENTRIES];
        for (slot, entry) in entries.iter_mut().enumerate() {
            *entry = sector.be16(slot * 2)?;
        }
        Ok(FileDescriptorIndex { entries })
    }

    pub fn encode(&self, sector: &mut SectorViewMut) -> Result<()> {
        for (slot, entry) in self.entries.iter().enumerate() {
            sector.put_be16(slot * 2, *entry)?;
        }
        Ok(())
    }

    pub fn get(&self, slot: usize) -> Result<u16> {
        self.entries
            .get(slot)
            .copied()
            .ok_or_else(|| DskError::OutOfBounds(format!("FDI slot {} outside 0..128", slot)))
    }

    pub fn set(&mut self, slot: usize, fdr_sector: u16) -> Result<()> {
        if slot >= FDI_ENTRIES {
            return Err(DskError::OutOfBounds(format!(
                "FDI slot {} outside 0..128",
                slot
            )));
        }
        self.entries[slot] = fdr_sector;
        Ok(())
    }

    /// First slot holding zero.
    pub fn free_slot(&self) -> Option<usize> {
        self.entries.iter().position(|entry| *entry == 0)
    }

    /// Slot currently pointing at the given FDR sector.
    pub fn slot_of(&self, fdr_sector: u16) -> Option<usize> {
        if fdr_sector == 0 {
            return None;
        }
        self.entries.iter().position(|entry| *entry == fdr_sector)
    }

    pub fn iter_live(&self) -> impl Iterator<Item = (usize, u16)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| **entry != 0)
            .map(|(slot, entry)| (slot, *entry))
    }

    pub fn entries(&self) -> &[u16; FDI_ENTRIES] {
        &self.entries
    }
}

impl Default for FileDescriptorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SECTOR_SIZE;

    #[test]
    fn test_roundtrip() {
        let mut index = FileDescriptorIndex::new();
        index.set(0, 2).unwrap();
        index.set(1, 33).unwrap();
        index.set(127, 17).unwrap();

        let mut buf = vec![0u8; SECTOR_SIZE];
        let mut view = SectorViewMut::new(&mut buf, 0).unwrap();
        index.encode(&mut view).unwrap();

        // Entries are big-endian pairs.
        assert_eq!(buf[0], 0x00);
        assert_eq!(buf[1], 0x02);
        assert_eq!(buf[254], 0x00);
        assert_eq!(buf[255], 17);

        let view = SectorView::new(&buf, 0).unwrap();
        assert_eq!(FileDescriptorIndex::decode(&view).unwrap(), index);
    }

    #[test]
    fn test_slot_bounds() {
        let mut index = FileDescriptorIndex::new();
        assert!(index.get(127).is_ok());
        assert!(index.get(128).is_err());
        assert!(index.set(128, 2).is_err());
    }

    #[test]
    fn test_free_slot_and_lookup() {
        let mut index = FileDescriptorIndex::new();
        assert_eq!(index.free_slot(), Some(0));
        index.set(0, 2).unwrap();
        index.set(1, 3).unwrap();
        assert_eq!(index.free_slot(), Some(2));
        assert_eq!(index.slot_of(3), Some(1));
        assert_eq!(index.slot_of(9), None);
        assert_eq!(index.slot_of(0), None);
        assert_eq!(index.iter_live().count(), 2);
    }
}
