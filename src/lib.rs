/*
 * TI-99/4A Disk Image Library
 * ===========================
 *
 * In-memory manipulation of HFDC/Level-3 compatible floppy disk
 * images: the volume information block with its embedded allocation
 * bitmap, the file descriptor index, file descriptor records with
 * packed data chains, and the cluster-organized data area.
 *
 * Components:
 * ----------
 * - Disk formats and the stock preset catalog
 * - Sector views over the flat image buffer
 * - Allocation bitmap and cluster allocator
 * - VIB / FDI / FDR / data-chain codecs
 * - Formatter, file operations, image reader/writer
 */

pub mod bitmap;
pub mod error;
pub mod format;
pub mod fs;
pub mod io;
pub mod presets;
pub mod record;
pub mod sector;

// Re-export commonly used types
pub use bitmap::AllocationBitmap;
pub use error::{DskError, Result};
pub use format::{Density, DiskFormat, SECTOR_SIZE};
pub use fs::{
    format_volume, read_image, read_image_with_format, write_image, ClusterAllocator, FilePayload,
    FilesystemImage, NewFile,
};
pub use presets::{DiskFormatPreset, PresetCatalog};
pub use record::{
    FileDescriptor, FileDescriptorIndex, FileStatus, Timestamp, VolumeInfo,
};
pub use sector::{SectorView, SectorViewMut};
