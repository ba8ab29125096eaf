use log::{debug, error};

use crate::error::{DskError, Result};
use crate::format::DiskFormat;
use crate::fs::FilesystemImage;
use crate::presets::PresetCatalog;
use crate::record::{is_blank_name, name_to_string, FileDescriptor, FileDescriptorIndex, VolumeInfo};
use crate::sector::SectorView;

/// Decode a filesystem from a raw image buffer.
///
/// The VIB only records physical geometry, so the logical layout is
/// recovered by matching the geometry against the stock presets; an
/// unknown geometry falls back to the standard layout with one sector
/// per cluster. Use [`read_image_with_format`] to skip the inference.
pub fn read_image(buffer: Vec<u8>) -> Result<FilesystemImage> {
    let (volume, bitmap) = decode_vib(&buffer)?;
    let format = match PresetCatalog::standard().match_geometry(
        volume.total_sectors,
        volume.sectors_per_track,
        volume.tracks_per_side,
        volume.sides,
    ) {
        Some(mut format) => {
            // The image's own density wins over the catalog's.
            format.density = volume.density;
            format
        }
        None => DiskFormat::new(
            volume.total_sectors,
            volume.sectors_per_track,
            volume.tracks_per_side,
            volume.sides,
            volume.density,
            2,
            32,
            34,
            1,
        )
        .map_err(|e| DskError::Corrupt(format!("volume geometry is unusable: {}", e)))?,
    };
    decode_filesystem(buffer, format, volume, bitmap)
}

/// Decode a filesystem whose logical layout the caller already knows.
pub fn read_image_with_format(buffer: Vec<u8>, format: DiskFormat) -> Result<FilesystemImage> {
    let (volume, bitmap) = decode_vib(&buffer)?;
    if volume.total_sectors != format.total_sectors {
        return Err(DskError::Corrupt(format!(
            "volume declares {} sectors but the format expects {}",
            volume.total_sectors, format.total_sectors
        )));
    }
    decode_filesystem(buffer, format, volume, bitmap)
}

fn decode_vib(buffer: &[u8]) -> Result<(VolumeInfo, crate::bitmap::AllocationBitmap)> {
    let view = SectorView::new(buffer, 0).map_err(|_| {
        DskError::Corrupt("buffer is too small to hold a volume information block".to_string())
    })?;
    VolumeInfo::decode(&view)
}

fn decode_filesystem(
    buffer: Vec<u8>,
    format: DiskFormat,
    volume: VolumeInfo,
    bitmap: crate::bitmap::AllocationBitmap,
) -> Result<FilesystemImage> {
    if buffer.len() < format.size_bytes() {
        error!(
            "image buffer holds {} bytes, volume needs {}",
            buffer.len(),
            format.size_bytes()
        );
        return Err(DskError::Corrupt(
            "buffer is shorter than the declared volume".to_string(),
        ));
    }

    let index = {
        let view = SectorView::new(&buffer, format.fdi_sector as usize)?;
        FileDescriptorIndex::decode(&view)?
    };

    let cluster_count = format.cluster_count();
    let mut files = Vec::new();
    for (slot, fdr_sector) in index.iter_live() {
        if !format.is_fdr_sector(fdr_sector) {
            error!(
                "FDI slot {} points at sector {} outside the FDR zone",
                slot, fdr_sector
            );
            return Err(DskError::Corrupt(format!(
                "FDI entry {} outside the descriptor zone",
                fdr_sector
            )));
        }
        let view = SectorView::new(&buffer, fdr_sector as usize)?;
        let fdr = FileDescriptor::decode(&view)?;
        if is_blank_name(&fdr.name) {
            return Err(DskError::Corrupt(format!(
                "live FDI entry at sector {} names no file",
                fdr_sector
            )));
        }
        if let Some(bad) = fdr.clusters.iter().find(|c| **c >= cluster_count) {
            return Err(DskError::Corrupt(format!(
                "\"{}\" references cluster {} outside 0..{}",
                fdr.name_str(),
                bad,
                cluster_count
            )));
        }
        files.push((fdr, fdr_sector));
    }

    debug!(
        "decoded \"{}\": {} sectors, {} files",
        name_to_string(&volume.volume_name),
        volume.total_sectors,
        files.len()
    );
    Ok(FilesystemImage::from_parts(
        format, buffer, bitmap, volume, index, files,
    ))
}
