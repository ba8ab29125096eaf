use crate::error::{DskError, Result};
use crate::format::{DiskFormat, MAX_BITMAP_SECTORS};

/// Serialized size of the allocation bitmap inside the VIB.
pub const BITMAP_BYTES: usize = 200;

/// Per-sector allocation state of a volume.
///
/// One bit per sector, LSB-first: bit `i % 8` of byte `i / 8` covers
/// sector `i`. The bitmap always serializes to exactly 200 bytes; bits
/// for sector numbers at or beyond `total_sectors` form a blocked region
/// that is permanently 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationBitmap {
    total_sectors: u16,
    used: Vec<bool>,
}

impl AllocationBitmap {
    pub fn new(total_sectors: u16) -> Result<Self> {
        if total_sectors == 0 || total_sectors > MAX_BITMAP_SECTORS {
            return Err(DskError::InvalidArgument(format!(
                "bitmap must cover 1..={} sectors, got {}",
                MAX_BITMAP_SECTORS, total_sectors
            )));
        }
        Ok(AllocationBitmap {
            total_sectors,
            used: vec![false; total_sectors as usize],
        })
    }

    pub fn total_sectors(&self) -> u16 {
        self.total_sectors
    }

    /// Sectors in the blocked region report as used.
    pub fn is_used(&self, sector: u16) -> bool {
        match self.used.get(sector as usize) {
            Some(bit) => *bit,
            None => true,
        }
    }

    pub fn set(&mut self, sector: u16, used: bool) -> Result<()> {
        if sector >= self.total_sectors {
            return Err(DskError::OutOfBounds(format!(
                "sector {} outside 0..{}",
                sector, self.total_sectors
            )));
        }
        self.used[sector as usize] = used;
        Ok(())
    }

    pub fn allocate(&mut self, sector: u16) -> Result<()> {
        self.set(sector, true)
    }

    pub fn free(&mut self, sector: u16) -> Result<()> {
        self.set(sector, false)
    }

    /// Mark the lowest-numbered free sector used and return it.
    pub fn allocate_first_free(&mut self) -> Option<u16> {
        let sector = self.used.iter().position(|used| !used)?;
        self.used[sector] = true;
        Some(sector as u16)
    }

    /// Clear every sector of the given cluster.
    pub fn free_cluster(&mut self, format: &DiskFormat, cluster: u16) -> Result<()> {
        for sector in format.cluster_sectors(cluster)? {
            self.free(sector)?;
        }
        Ok(())
    }

    pub fn used_count(&self) -> usize {
        self.used.iter().filter(|used| **used).count()
    }

    pub fn free_count(&self) -> usize {
        self.total_sectors as usize - self.used_count()
    }

    /// Serialize to the fixed 200-byte on-disk form.
    pub fn to_bytes(&self) -> [u8; BITMAP_BYTES] {
        // Start fully blocked, then clear the bits of free sectors; this
        // leaves the tail past total_sectors at 1 without a second pass.
        let mut out = [0xFFu8; BITMAP_BYTES];
        for sector in 0..self.total_sectors {
            if !self.used[sector as usize] {
                out[(sector / 8) as usize] &= !(1 << (sector % 8));
            }
        }
        out
    }

    /// Rebuild the bitmap from its serialized form. Only bits below
    /// `total_sectors` are read; the blocked tail is implicit.
    pub fn from_bytes(bytes: &[u8], total_sectors: u16) -> Result<Self> {
        if total_sectors == 0 || total_sectors > MAX_BITMAP_SECTORS {
            return Err(DskError::InvalidArgument(format!(
                "bitmap must cover 1..={} sectors, got {}",
                MAX_BITMAP_SECTORS, total_sectors
            )));
        }
        let needed = (total_sectors as usize + 7) / 8;
        if bytes.len() < needed {
            return Err(DskError::InvalidArgument(format!(
                "{} bitmap bytes cannot cover {} sectors",
                bytes.len(),
                total_sectors
            )));
        }
        let used = (0..total_sectors)
            .map(|sector| bytes[(sector / 8) as usize] & (1 << (sector % 8)) != 0)
            .collect();
        Ok(AllocationBitmap {
            total_sectors,
            used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Density;

    #[test]
    fn test_new_rejects_bad_totals() {
        assert!(AllocationBitmap::new(0).is_err());
        assert!(AllocationBitmap::new(1601).is_err());
        assert!(AllocationBitmap::new(1600).is_ok());
    }

    #[test]
    fn test_set_allocate_free() {
        let mut bitmap = AllocationBitmap::new(360).unwrap();
        assert!(!bitmap.is_used(5));
        bitmap.allocate(5).unwrap();
        assert!(bitmap.is_used(5));
        bitmap.free(5).unwrap();
        assert!(!bitmap.is_used(5));
        assert!(bitmap.set(360, true).is_err());
    }

    #[test]
    fn test_blocked_region_reads_used() {
        let bitmap = AllocationBitmap::new(360).unwrap();
        assert!(bitmap.is_used(360));
        assert!(bitmap.is_used(1599));
        assert!(bitmap.is_used(u16::MAX));
    }

    #[test]
    fn test_allocate_first_free_scans_in_order() {
        let mut bitmap = AllocationBitmap::new(10).unwrap();
        bitmap.allocate(0).unwrap();
        bitmap.allocate(1).unwrap();
        bitmap.allocate(3).unwrap();
        assert_eq!(bitmap.allocate_first_free(), Some(2));
        assert_eq!(bitmap.allocate_first_free(), Some(4));
        for sector in 5..10 {
            bitmap.allocate(sector).unwrap();
        }
        assert_eq!(bitmap.allocate_first_free(), None);
    }

    #[test]
    fn test_serialized_tail_is_blocked() {
        let bitmap = AllocationBitmap::new(360).unwrap();
        let bytes = bitmap.to_bytes();
        // 360 sectors fill exactly 45 bytes; all free, so all zero.
        assert!(bytes[..45].iter().all(|b| *b == 0));
        assert!(bytes[45..].iter().all(|b| *b == 0xFF));
    }

    #[test]
    fn test_serialized_partial_byte() {
        let mut bitmap = AllocationBitmap::new(10).unwrap();
        bitmap.allocate(0).unwrap();
        bitmap.allocate(9).unwrap();
        let bytes = bitmap.to_bytes();
        assert_eq!(bytes[0], 0x01);
        // Bit 1 covers sector 9 (used), bits 2..7 are the blocked tail.
        assert_eq!(bytes[1], 0xFE);
        assert!(bytes[2..].iter().all(|b| *b == 0xFF));
    }

    #[test]
    fn test_roundtrip() {
        let mut bitmap = AllocationBitmap::new(720).unwrap();
        for sector in [0u16, 1, 2, 33, 100, 719] {
            bitmap.allocate(sector).unwrap();
        }
        let decoded = AllocationBitmap::from_bytes(&bitmap.to_bytes(), 720).unwrap();
        assert_eq!(decoded, bitmap);
    }

    #[test]
    fn test_from_bytes_rejects_short_input() {
        assert!(AllocationBitmap::from_bytes(&[0u8; 44], 360).is_err());
        assert!(AllocationBitmap::from_bytes(&[0u8; 45], 360).is_ok());
    }

    #[test]
    fn test_free_cluster_clears_all_sectors() {
        let format = DiskFormat::new(2880, 18, 80, 2, Density::DD, 2, 32, 34, 4).unwrap();
        let mut bitmap = AllocationBitmap::new(1600).unwrap();
        for sector in 34..42 {
            bitmap.allocate(sector).unwrap();
        }
        bitmap.free_cluster(&format, 0).unwrap();
        for sector in 34..38 {
            assert!(!bitmap.is_used(sector));
        }
        for sector in 38..42 {
            assert!(bitmap.is_used(sector));
        }
    }
}
