use std::fmt;
use std::ops::Range;

use crate::error::{DskError, Result};

/// Every sector on a Level-3 volume is 256 bytes.
pub const SECTOR_SIZE: usize = 256;

/// The allocation bitmap embedded in the VIB spans at most 1600 sectors.
pub const MAX_BITMAP_SECTORS: u16 = 1600;

/// Freshly formatted data sectors are filled with this byte.
pub const ERASED_BYTE: u8 = 0xE5;

/// Recording density as stored in the VIB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Density {
    /// Unknown / unspecified
    XX,
    /// Single density (FM)
    SD,
    /// Double density (MFM)
    DD,
    /// High density
    HD,
    /// Ultra density
    UD,
}

impl Density {
    pub fn code(self) -> u8 {
        match self {
            Density::XX => 0,
            Density::SD => 1,
            Density::DD => 2,
            Density::HD => 3,
            Density::UD => 4,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Density::XX),
            1 => Ok(Density::SD),
            2 => Ok(Density::DD),
            3 => Ok(Density::HD),
            4 => Ok(Density::UD),
            _ => Err(DskError::Corrupt(format!("unknown density code {}", code))),
        }
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Density::XX => "XX",
            Density::SD => "SD",
            Density::DD => "DD",
            Density::HD => "HD",
            Density::UD => "UD",
        };
        write!(f, "{}", label)
    }
}

/// Geometry and logical layout of one volume.
///
/// The physical fields mirror what the VIB records; the logical fields
/// locate the system structures inside the flat sector space. The layout
/// is always VIB at sector 0 and FDI at sector 1, followed by the FDR
/// zone and then the cluster-organized data area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskFormat {
    pub total_sectors: u16,
    pub sectors_per_track: u8,
    pub tracks_per_side: u8,
    pub sides: u8,
    pub density: Density,
    pub vib_sector: u16,
    pub fdi_sector: u16,
    pub first_fdr_sector: u16,
    pub fdr_sector_count: u16,
    pub first_data_sector: u16,
    pub sectors_per_cluster: u16,
}

impl DiskFormat {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        total_sectors: u16,
        sectors_per_track: u8,
        tracks_per_side: u8,
        sides: u8,
        density: Density,
        first_fdr_sector: u16,
        fdr_sector_count: u16,
        first_data_sector: u16,
        sectors_per_cluster: u16,
    ) -> Result<Self> {
        if total_sectors == 0
            || sectors_per_track == 0
            || tracks_per_side == 0
            || sides == 0
            || fdr_sector_count == 0
            || sectors_per_cluster == 0
        {
            return Err(DskError::InvalidArgument(
                "disk format fields must all be positive".to_string(),
            ));
        }
        // Sector 0 is the VIB and sector 1 the FDI; the FDR zone and the
        // data area follow in order, inside the volume.
        if first_fdr_sector < 2 {
            return Err(DskError::InvalidArgument(format!(
                "FDR zone at sector {} would overlap the system sectors",
                first_fdr_sector
            )));
        }
        if first_data_sector < first_fdr_sector + fdr_sector_count {
            return Err(DskError::InvalidArgument(format!(
                "data area at sector {} overlaps the FDR zone ending at {}",
                first_data_sector,
                first_fdr_sector + fdr_sector_count
            )));
        }
        if first_data_sector > total_sectors {
            return Err(DskError::InvalidArgument(format!(
                "data area at sector {} lies beyond the volume of {} sectors",
                first_data_sector, total_sectors
            )));
        }
        Ok(DiskFormat {
            total_sectors,
            sectors_per_track,
            tracks_per_side,
            sides,
            density,
            vib_sector: 0,
            fdi_sector: 1,
            first_fdr_sector,
            fdr_sector_count,
            first_data_sector,
            sectors_per_cluster,
        })
    }

    /// Number of whole clusters in the data area.
    pub fn cluster_count(&self) -> u16 {
        self.total_sectors.saturating_sub(self.first_data_sector) / self.sectors_per_cluster
    }

    /// First sector of the given cluster.
    pub fn cluster_to_sector(&self, cluster: u16) -> Result<u16> {
        if cluster >= self.cluster_count() {
            return Err(DskError::OutOfBounds(format!(
                "cluster {} outside 0..{}",
                cluster,
                self.cluster_count()
            )));
        }
        Ok(self.first_data_sector + cluster * self.sectors_per_cluster)
    }

    /// All sectors of the given cluster.
    pub fn cluster_sectors(&self, cluster: u16) -> Result<Range<u16>> {
        let first = self.cluster_to_sector(cluster)?;
        Ok(first..first + self.sectors_per_cluster)
    }

    pub fn is_fdr_sector(&self, sector: u16) -> bool {
        sector >= self.first_fdr_sector && sector < self.first_fdr_sector + self.fdr_sector_count
    }

    pub fn is_data_sector(&self, sector: u16) -> bool {
        sector >= self.first_data_sector && sector < self.total_sectors
    }

    /// Bytes in one cluster.
    pub fn cluster_bytes(&self) -> usize {
        self.sectors_per_cluster as usize * SECTOR_SIZE
    }

    /// Size of the whole image buffer in bytes.
    pub fn size_bytes(&self) -> usize {
        self.total_sectors as usize * SECTOR_SIZE
    }

    /// Map a track/side/sector triple (sector 1-based, as on the medium)
    /// to a logical sector number.
    pub fn chs_to_lba(&self, track: u8, side: u8, sector: u8) -> u16 {
        ((track as u16) * (self.sides as u16) + (side as u16)) * (self.sectors_per_track as u16)
            + (sector as u16 - 1)
    }

    /// Inverse of `chs_to_lba`.
    pub fn lba_to_chs(&self, lba: u16) -> (u8, u8, u8) {
        let spt = self.sectors_per_track as u16;
        let track = lba / (self.sides as u16 * spt);
        let rest = lba % (self.sides as u16 * spt);
        let side = rest / spt;
        let sector = rest % spt + 1;
        (track as u8, side as u8, sector as u8)
    }
}
