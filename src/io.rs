use std::fs;
use std::io;
use std::path::Path;

/// Read a raw image file into memory.
pub fn load_image<P: AsRef<Path>>(path: P) -> io::Result<Vec<u8>> {
    fs::read(path)
}

/// Write an image buffer back to a file.
pub fn save_image<P: AsRef<Path>>(path: P, bytes: &[u8]) -> io::Result<()> {
    fs::write(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{format_volume, read_image, write_image};
    use crate::presets::PresetCatalog;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blank.dsk");

        let format = PresetCatalog::standard().get("SSSD").unwrap().format();
        let fs = format_volume(format, Some("ONFILE")).unwrap();
        let bytes = write_image(&fs).unwrap();

        save_image(&path, &bytes).unwrap();
        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded, bytes);

        let reread = read_image(loaded).unwrap();
        assert_eq!(&reread.volume().volume_name, b"ONFILE    ");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(load_image(dir.path().join("absent.dsk")).is_err());
    }
}
