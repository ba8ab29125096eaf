use crate::bitmap::AllocationBitmap;
use crate::error::{DskError, Result};
use crate::format::DiskFormat;
use crate::record::FileDescriptorIndex;

/// Cluster-granular allocation over a volume's bitmap.
///
/// All three operations are strict first-fit in ascending order; no
/// other placement policy exists.
pub struct ClusterAllocator<'a> {
    format: &'a DiskFormat,
    bitmap: &'a mut AllocationBitmap,
}

impl<'a> ClusterAllocator<'a> {
    pub fn new(format: &'a DiskFormat, bitmap: &'a mut AllocationBitmap) -> Self {
        ClusterAllocator { format, bitmap }
    }

    /// Reserve `count` clusters. A cluster qualifies only when every one
    /// of its sectors is free. Returns the indices in scan order; the
    /// bitmap is untouched unless the full request can be met.
    pub fn allocate_clusters(&mut self, count: usize) -> Result<Vec<u16>> {
        let mut found = Vec::with_capacity(count);
        for cluster in 0..self.format.cluster_count() {
            if found.len() == count {
                break;
            }
            let mut sectors = self.format.cluster_sectors(cluster)?;
            if sectors.all(|sector| !self.bitmap.is_used(sector)) {
                found.push(cluster);
            }
        }
        if found.len() < count {
            return Err(DskError::OutOfSpace(format!(
                "{} free clusters needed, {} available",
                count,
                found.len()
            )));
        }
        for cluster in &found {
            for sector in self.format.cluster_sectors(*cluster)? {
                self.bitmap.allocate(sector)?;
            }
        }
        Ok(found)
    }

    /// Release every sector of each cluster. Idempotent.
    pub fn free_clusters(&mut self, clusters: &[u16]) -> Result<()> {
        for cluster in clusters {
            self.bitmap.free_cluster(self.format, *cluster)?;
        }
        Ok(())
    }

    /// Reserve the lowest FDR-zone sector that is free in the bitmap
    /// and not already claimed by an FDI entry.
    pub fn allocate_fdr_sector(&mut self, index: &FileDescriptorIndex) -> Result<u16> {
        let zone =
            self.format.first_fdr_sector..self.format.first_fdr_sector + self.format.fdr_sector_count;
        for sector in zone {
            if !self.bitmap.is_used(sector) && index.slot_of(sector).is_none() {
                self.bitmap.allocate(sector)?;
                return Ok(sector);
            }
        }
        Err(DskError::OutOfSpace(
            "every file descriptor sector is taken".to_string(),
        ))
    }
}
