use crate::bitmap::{AllocationBitmap, BITMAP_BYTES};
use crate::error::{DskError, Result};
use crate::format::Density;
use crate::record::NAME_LEN;
use crate::sector::{SectorView, SectorViewMut};

pub const VIB_SIGNATURE: &[u8; 3] = b"DSK";

const OFF_NAME: usize = 0x00;
const OFF_TOTAL_SECTORS: usize = 0x0A;
const OFF_SECTORS_PER_TRACK: usize = 0x0C;
const OFF_SIGNATURE: usize = 0x0D;
const OFF_RESERVED: usize = 0x10;
const OFF_TRACKS_PER_SIDE: usize = 0x11;
const OFF_SIDES: usize = 0x12;
const OFF_DENSITY: usize = 0x13;
const OFF_DIRECTORIES: usize = 0x14;
const OFF_BITMAP: usize = 0x38;

/// One of the three subdirectory slots in the VIB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectorySlot {
    pub name: [u8; NAME_LEN],
    pub fdi_pointer: u16,
}

impl DirectorySlot {
    pub fn empty() -> Self {
        DirectorySlot {
            name: [0x20; NAME_LEN],
            fdi_pointer: 0,
        }
    }
}

/// Decoded Volume Information Block, sector 0 of every volume.
///
/// The VIB embeds the allocation bitmap on disk but does not own one at
/// rest; the codec takes the image's bitmap on encode and produces a
/// fresh one on decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeInfo {
    pub volume_name: [u8; NAME_LEN],
    pub total_sectors: u16,
    pub sectors_per_track: u8,
    pub tracks_per_side: u8,
    pub sides: u8,
    pub density: Density,
    pub directories: [DirectorySlot; 3],
}

impl VolumeInfo {
    pub fn decode(sector: &SectorView) -> Result<(VolumeInfo, AllocationBitmap)> {
        if sector.slice(OFF_SIGNATURE, 3)? != VIB_SIGNATURE {
            return Err(DskError::Corrupt(
                "volume signature is not \"DSK\"".to_string(),
            ));
        }
        let total_sectors = sector.be16(OFF_TOTAL_SECTORS)?;
        if total_sectors == 0 {
            return Err(DskError::Corrupt("volume declares zero sectors".to_string()));
        }
        let bitmap_bytes = (total_sectors as usize + 7) / 8;
        if bitmap_bytes > BITMAP_BYTES {
            return Err(DskError::Corrupt(format!(
                "{} sectors need {} bitmap bytes, only {} exist",
                total_sectors, bitmap_bytes, BITMAP_BYTES
            )));
        }
        let density = Density::from_code(sector.at(OFF_DENSITY)?)?;

        let mut volume_name = [0u8; NAME_LEN];
        volume_name.copy_from_slice(sector.slice(OFF_NAME, NAME_LEN)?);

        let mut directories = [DirectorySlot::empty(); 3];
        for (i, slot) in directories.iter_mut().enumerate() {
            let base = OFF_DIRECTORIES + i * (NAME_LEN + 2);
            slot.name.copy_from_slice(sector.slice(base, NAME_LEN)?);
            slot.fdi_pointer = sector.be16(base + NAME_LEN)?;
        }

        let bitmap =
            AllocationBitmap::from_bytes(sector.slice(OFF_BITMAP, BITMAP_BYTES)?, total_sectors)?;

        Ok((
            VolumeInfo {
                volume_name,
                total_sectors,
                sectors_per_track: sector.at(OFF_SECTORS_PER_TRACK)?,
                tracks_per_side: sector.at(OFF_TRACKS_PER_SIDE)?,
                sides: sector.at(OFF_SIDES)?,
                density,
                directories,
            },
            bitmap,
        ))
    }

    pub fn encode(&self, bitmap: &AllocationBitmap, sector: &mut SectorViewMut) -> Result<()> {
        sector.write(OFF_NAME, &self.volume_name)?;
        sector.put_be16(OFF_TOTAL_SECTORS, self.total_sectors)?;
        sector.put(OFF_SECTORS_PER_TRACK, self.sectors_per_track)?;
        sector.write(OFF_SIGNATURE, VIB_SIGNATURE)?;
        sector.put(OFF_RESERVED, 0)?;
        sector.put(OFF_TRACKS_PER_SIDE, self.tracks_per_side)?;
        sector.put(OFF_SIDES, self.sides)?;
        sector.put(OFF_DENSITY, self.density.code())?;
        for (i, slot) in self.directories.iter().enumerate() {
            let base = OFF_DIRECTORIES + i * (NAME_LEN + 2);
            sector.write(base, &slot.name)?;
            sector.put_be16(base + NAME_LEN, slot.fdi_pointer)?;
        }
        // to_bytes already carries the blocked 0xFF tail past the last
        // real sector, so this fills 0x38..0x100 completely.
        sector.write(OFF_BITMAP, &bitmap.to_bytes())?;
        Ok(())
    }
}
