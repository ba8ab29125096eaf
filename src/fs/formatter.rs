use log::debug;

use crate::bitmap::AllocationBitmap;
use crate::error::{DskError, Result};
use crate::format::{DiskFormat, ERASED_BYTE};
use crate::fs::FilesystemImage;
use crate::record::{name_to_string, volume_label, DirectorySlot, FileDescriptorIndex, VolumeInfo};
use crate::sector::SectorViewMut;

pub const DEFAULT_VOLUME_NAME: &str = "NEWVOLUME";

/// Initialize a blank, valid, empty filesystem image.
///
/// The data area keeps the 0xE5 erased fill; the FDR zone is zeroed but
/// left unallocated, so only the VIB and FDI sectors start out used.
pub fn format_volume(format: DiskFormat, volume_name: Option<&str>) -> Result<FilesystemImage> {
    let label = match volume_name {
        Some(name) if name.trim().is_empty() => {
            return Err(DskError::InvalidArgument(
                "volume name must not be blank".to_string(),
            ))
        }
        Some(name) => volume_label(name),
        None => volume_label(DEFAULT_VOLUME_NAME),
    };

    let mut bitmap = AllocationBitmap::new(format.total_sectors)?;
    bitmap.allocate(format.vib_sector)?;
    bitmap.allocate(format.fdi_sector)?;

    let mut buffer = vec![ERASED_BYTE; format.size_bytes()];

    let volume = VolumeInfo {
        volume_name: label,
        total_sectors: format.total_sectors,
        sectors_per_track: format.sectors_per_track,
        tracks_per_side: format.tracks_per_side,
        sides: format.sides,
        density: format.density,
        directories: [DirectorySlot::empty(); 3],
    };
    {
        let mut view = SectorViewMut::new(&mut buffer, format.vib_sector as usize)?;
        volume.encode(&bitmap, &mut view)?;
    }

    let index = FileDescriptorIndex::new();
    {
        let mut view = SectorViewMut::new(&mut buffer, format.fdi_sector as usize)?;
        index.encode(&mut view)?;
    }

    for sector in format.first_fdr_sector..format.first_fdr_sector + format.fdr_sector_count {
        SectorViewMut::new(&mut buffer, sector as usize)?.fill(0);
    }

    debug!(
        "formatted \"{}\": {} sectors, {} {}",
        name_to_string(&label),
        format.total_sectors,
        format.density,
        if format.sides == 2 { "double-sided" } else { "single-sided" },
    );
    Ok(FilesystemImage::from_parts(
        format,
        buffer,
        bitmap,
        volume,
        index,
        Vec::new(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SECTOR_SIZE;
    use crate::presets::PresetCatalog;

    fn sssd() -> DiskFormat {
        PresetCatalog::standard().get("SSSD").unwrap().format()
    }

    #[test]
    fn test_empty_sssd_layout() {
        let image = format_volume(sssd(), None).unwrap();
        let buf = image.buffer();
        assert_eq!(buf.len(), 360 * SECTOR_SIZE);

        // VIB header fields
        assert_eq!(&buf[0x00..0x0A], b"NEWVOLUME ");
        assert_eq!(buf[0x0A], 0x01);
        assert_eq!(buf[0x0B], 0x68);
        assert_eq!(&buf[0x0D..0x10], b"DSK");
        assert_eq!(buf[0x11], 40);
        assert_eq!(buf[0x12], 1);
        assert_eq!(buf[0x13], 1);

        // Bitmap: sectors 0 and 1 used, tail past sector 359 blocked
        assert_eq!(buf[0x38], 0x03);
        assert!(buf[0x39..0x38 + 45].iter().all(|b| *b == 0));
        assert!(buf[0x38 + 45..0x38 + 200].iter().all(|b| *b == 0xFF));

        // FDI and FDR zone zeroed, data area erased
        assert!(buf[SECTOR_SIZE..2 * SECTOR_SIZE].iter().all(|b| *b == 0));
        assert!(buf[2 * SECTOR_SIZE..34 * SECTOR_SIZE].iter().all(|b| *b == 0));
        assert!(buf[34 * SECTOR_SIZE..].iter().all(|b| *b == 0xE5));
    }

    #[test]
    fn test_fdr_zone_left_unallocated() {
        let image = format_volume(sssd(), None).unwrap();
        assert_eq!(image.bitmap().used_count(), 2);
        assert!(image.bitmap().is_used(0));
        assert!(image.bitmap().is_used(1));
        assert!(!image.bitmap().is_used(2));
    }

    #[test]
    fn test_volume_name_override() {
        let image = format_volume(sssd(), Some(" games ")).unwrap();
        assert_eq!(&image.buffer()[0x00..0x0A], b"GAMES     ");
        assert!(format_volume(sssd(), Some("  ")).is_err());
    }

    #[test]
    fn test_oversized_format_is_rejected() {
        // 2880 sectors exceed what the 200-byte bitmap can track.
        let format = PresetCatalog::standard().get("DSDD 80").unwrap().format();
        assert!(matches!(
            format_volume(format, None),
            Err(DskError::InvalidArgument(_))
        ));
    }
}
