// The filesystem layer: the in-memory image aggregate, the cluster
// allocator over its bitmap, the formatter, the file operations, and
// the whole-image reader/writer.

pub mod allocator;
pub mod files;
pub mod formatter;
pub mod reader;
pub mod writer;

pub use allocator::ClusterAllocator;
pub use files::{FilePayload, NewFile};
pub use formatter::format_volume;
pub use reader::{read_image, read_image_with_format};
pub use writer::write_image;

use crate::bitmap::AllocationBitmap;
use crate::error::{DskError, Result};
use crate::format::DiskFormat;
use crate::record::{names_match, normalize_name, volume_label, FileDescriptor, FileDescriptorIndex, VolumeInfo};
use crate::sector::{SectorView, SectorViewMut};

/// A complete decoded volume: the flat byte buffer plus the live
/// aggregate built over it.
///
/// The bitmap, VIB, FDI and descriptor list are one logical unit; the
/// file operations in [`files`] keep them mutually consistent and are
/// the only sanctioned way to mutate an image.
pub struct FilesystemImage {
    pub(crate) format: DiskFormat,
    pub(crate) buffer: Vec<u8>,
    pub(crate) bitmap: AllocationBitmap,
    pub(crate) volume: VolumeInfo,
    pub(crate) index: FileDescriptorIndex,
    pub(crate) files: Vec<(FileDescriptor, u16)>,
}

impl FilesystemImage {
    pub(crate) fn from_parts(
        format: DiskFormat,
        buffer: Vec<u8>,
        bitmap: AllocationBitmap,
        volume: VolumeInfo,
        index: FileDescriptorIndex,
        files: Vec<(FileDescriptor, u16)>,
    ) -> Self {
        FilesystemImage {
            format,
            buffer,
            bitmap,
            volume,
            index,
            files,
        }
    }

    pub fn format(&self) -> &DiskFormat {
        &self.format
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }

    pub fn bitmap(&self) -> &AllocationBitmap {
        &self.bitmap
    }

    pub fn volume(&self) -> &VolumeInfo {
        &self.volume
    }

    pub fn index(&self) -> &FileDescriptorIndex {
        &self.index
    }

    /// Live files in FDI insertion order, each with its FDR sector.
    pub fn files(&self) -> &[(FileDescriptor, u16)] {
        &self.files
    }

    /// Case-insensitive lookup against the trimmed stored names.
    pub fn find(&self, name: &str) -> Option<&FileDescriptor> {
        self.files
            .iter()
            .map(|(fdr, _)| fdr)
            .find(|fdr| names_match(&fdr.name, name))
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.files
            .iter()
            .position(|(fdr, _)| names_match(&fdr.name, name))
    }

    /// First free FDI slot, if any.
    pub fn free_fdi_slot(&self) -> Option<usize> {
        self.index.free_slot()
    }

    /// Register a descriptor in the in-memory list only; the caller is
    /// responsible for the on-disk side.
    pub fn add_file(&mut self, fdr: FileDescriptor, fdr_sector: u16) {
        self.files.push((fdr, fdr_sector));
    }

    /// Drop a descriptor from the in-memory list only.
    pub fn remove_file(&mut self, name: &str) -> Option<(FileDescriptor, u16)> {
        let position = self.position(name)?;
        Some(self.files.remove(position))
    }

    /// Rename in the in-memory list only.
    pub fn rename_file(&mut self, old: &str, new: &str) -> Result<()> {
        let position = self
            .position(old)
            .ok_or_else(|| DskError::NotFound(format!("no file named \"{}\"", old.trim())))?;
        self.files[position].0.name = normalize_name(new.trim());
        Ok(())
    }

    /// Resolve a name to its FDR sector by scanning the on-disk FDI and
    /// decoding each live descriptor. Returns 0 when nothing matches.
    pub fn sector_of(&self, name: &str) -> u16 {
        for (_, fdr_sector) in self.index.iter_live() {
            let decoded = SectorView::new(&self.buffer, fdr_sector as usize)
                .and_then(|view| FileDescriptor::decode(&view));
            if let Ok(fdr) = decoded {
                if names_match(&fdr.name, name) {
                    return fdr_sector;
                }
            }
        }
        0
    }

    pub fn sector_view(&self, sector: u16) -> Result<SectorView<'_>> {
        SectorView::new(&self.buffer, sector as usize)
    }

    pub fn sector_view_mut(&mut self, sector: u16) -> Result<SectorViewMut<'_>> {
        SectorViewMut::new(&mut self.buffer, sector as usize)
    }

    pub fn free_sector_count(&self) -> usize {
        self.bitmap.free_count()
    }

    /// Change the volume label and rewrite the VIB.
    pub fn set_volume_name(&mut self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(DskError::InvalidArgument(
                "volume name must not be blank".to_string(),
            ));
        }
        self.volume.volume_name = volume_label(name);
        self.flush_vib()
    }

    /// Re-encode the VIB (with the current bitmap) into its sector.
    pub(crate) fn flush_vib(&mut self) -> Result<()> {
        let mut view = SectorViewMut::new(&mut self.buffer, self.format.vib_sector as usize)?;
        self.volume.encode(&self.bitmap, &mut view)
    }

    /// Re-encode the FDI into its sector.
    pub(crate) fn flush_fdi(&mut self) -> Result<()> {
        let mut view = SectorViewMut::new(&mut self.buffer, self.format.fdi_sector as usize)?;
        self.index.encode(&mut view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Density;
    use crate::record::normalize_name;

    fn empty_image() -> FilesystemImage {
        let format = DiskFormat::new(360, 9, 40, 1, Density::SD, 2, 32, 34, 1).unwrap();
        format_volume(format, None).unwrap()
    }

    fn dummy_fdr(name: &str) -> FileDescriptor {
        FileDescriptor {
            name: normalize_name(name),
            extended_record_length: 0,
            status: Default::default(),
            records_per_sector: 0,
            total_sectors: 0,
            eof_offset: 0,
            record_length: 0,
            level3_records: 0,
            created: 0,
            updated: 0,
            clusters: vec![],
        }
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let mut image = empty_image();
        image.add_file(dummy_fdr("REPORT"), 2);
        assert!(image.find("report").is_some());
        assert!(image.find(" Report ").is_some());
        assert!(image.find("repor").is_none());
    }

    #[test]
    fn test_in_memory_list_mutation() {
        let mut image = empty_image();
        image.add_file(dummy_fdr("A"), 2);
        image.add_file(dummy_fdr("B"), 3);
        assert_eq!(image.files().len(), 2);

        image.rename_file("a", "C").unwrap();
        assert!(image.find("C").is_some());
        assert!(image.find("A").is_none());

        let removed = image.remove_file("b").unwrap();
        assert_eq!(removed.1, 3);
        assert_eq!(image.files().len(), 1);
        assert!(image.remove_file("b").is_none());
    }

    #[test]
    fn test_set_volume_name() {
        let mut image = empty_image();
        image.set_volume_name("archive").unwrap();
        assert_eq!(&image.volume().volume_name, b"ARCHIVE   ");
        // The VIB sector reflects the change immediately.
        assert_eq!(&image.buffer()[0x00..0x0A], b"ARCHIVE   ");
        assert!(image.set_volume_name("   ").is_err());
    }
}
