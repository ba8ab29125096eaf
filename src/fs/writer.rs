use crate::error::Result;
use crate::fs::FilesystemImage;
use crate::sector::SectorViewMut;

/// Serialize a filesystem back to a flat image buffer.
///
/// The data area is already current in the backing buffer; the system
/// structures are re-encoded from the live aggregate so the result
/// reflects every in-memory mutation.
pub fn write_image(fs: &FilesystemImage) -> Result<Vec<u8>> {
    let mut buffer = fs.buffer().to_vec();
    {
        let mut view = SectorViewMut::new(&mut buffer, fs.format().vib_sector as usize)?;
        fs.volume().encode(fs.bitmap(), &mut view)?;
    }
    {
        let mut view = SectorViewMut::new(&mut buffer, fs.format().fdi_sector as usize)?;
        fs.index().encode(&mut view)?;
    }
    for (fdr, fdr_sector) in fs.files() {
        let mut view = SectorViewMut::new(&mut buffer, *fdr_sector as usize)?;
        fdr.encode(&mut view)?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::files::{create, NewFile};
    use crate::fs::{format_volume, read_image};
    use crate::presets::PresetCatalog;

    #[test]
    fn test_writer_reflects_live_state() {
        let format = PresetCatalog::standard().get("SSSD").unwrap().format();
        let mut fs = format_volume(format, None).unwrap();
        create(&mut fs, &NewFile::program("KEEP", vec![0x77; 300])).unwrap();

        let bytes = write_image(&fs).unwrap();
        assert_eq!(bytes.len(), fs.buffer().len());
        // The operations flush as they go, so serialization changes
        // nothing beyond what the buffer already holds.
        assert_eq!(bytes, fs.buffer());

        let reread = read_image(bytes).unwrap();
        assert_eq!(reread.files().len(), 1);
        assert_eq!(reread.bitmap(), fs.bitmap());
    }

    #[test]
    fn test_writer_encodes_in_memory_renames() {
        let format = PresetCatalog::standard().get("SSSD").unwrap().format();
        let mut fs = format_volume(format, None).unwrap();
        create(&mut fs, &NewFile::program("FIRST", vec![1; 10])).unwrap();

        // Mutate only the in-memory list, then serialize.
        fs.rename_file("FIRST", "SECOND").unwrap();
        let bytes = write_image(&fs).unwrap();
        let reread = read_image(bytes).unwrap();
        assert!(reread.find("SECOND").is_some());
        assert!(reread.find("FIRST").is_none());
    }
}
