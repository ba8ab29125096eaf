// On-disk record codecs: volume information block, file descriptor
// index, file descriptor records and their data chains, timestamps.

pub mod fdi;
pub mod fdr;
pub mod timestamp;
pub mod vib;

pub use fdi::{FileDescriptorIndex, FDI_ENTRIES};
pub use fdr::{FileDescriptor, FileStatus};
pub use timestamp::Timestamp;
pub use vib::{DirectorySlot, VolumeInfo};

/// Filenames and volume names are 10 bytes, ASCII, space-padded.
pub const NAME_LEN: usize = 10;

/// Normalize a filename to its stored form: upper-cased, characters
/// outside `[A-Z0-9._]` replaced by a space, padded or truncated to
/// exactly 10 bytes.
pub fn normalize_name(name: &str) -> [u8; NAME_LEN] {
    let mut out = [0x20u8; NAME_LEN];
    for (i, c) in name.chars().take(NAME_LEN).enumerate() {
        let c = c.to_ascii_uppercase();
        out[i] = match c {
            'A'..='Z' | '0'..='9' | '.' | '_' => c as u8,
            _ => 0x20,
        };
    }
    out
}

/// Normalize a volume label: trimmed, upper-cased, truncated to 10
/// bytes and space-padded. Unlike filenames no characters are replaced.
pub fn volume_label(name: &str) -> [u8; NAME_LEN] {
    let mut out = [0x20u8; NAME_LEN];
    for (i, c) in name.trim().chars().take(NAME_LEN).enumerate() {
        let c = c.to_ascii_uppercase();
        out[i] = if c.is_ascii() { c as u8 } else { 0x20 };
    }
    out
}

/// Stored name back to a trimmed string.
pub fn name_to_string(name: &[u8; NAME_LEN]) -> String {
    String::from_utf8_lossy(name).trim_end().to_string()
}

/// Case-insensitive comparison of a stored name against caller input.
pub fn names_match(stored: &[u8; NAME_LEN], name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && name_to_string(stored).eq_ignore_ascii_case(trimmed)
}

/// A blank name marks an empty FDR slot; it never identifies a file.
pub fn is_blank_name(stored: &[u8; NAME_LEN]) -> bool {
    stored.iter().all(|b| *b == 0x20 || *b == 0x00)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pads_and_uppercases() {
        assert_eq!(&normalize_name("hello"), b"HELLO     ");
        assert_eq!(&normalize_name("FILE.A_1"), b"FILE.A_1  ");
    }

    #[test]
    fn test_normalize_truncates() {
        assert_eq!(&normalize_name("ABCDEFGHIJKLM"), b"ABCDEFGHIJ");
    }

    #[test]
    fn test_normalize_replaces_foreign_chars() {
        assert_eq!(&normalize_name("a-b/c"), b"A B C     ");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for name in ["hello", "a-b/c", "ABCDEFGHIJKLM", "x", ""] {
            let once = normalize_name(name);
            let twice = normalize_name(std::str::from_utf8(&once).unwrap());
            assert_eq!(once, twice);
            assert_eq!(once.len(), NAME_LEN);
        }
    }

    #[test]
    fn test_names_match_is_case_insensitive() {
        let stored = normalize_name("HELLO");
        assert!(names_match(&stored, "hello"));
        assert!(names_match(&stored, " hello "));
        assert!(!names_match(&stored, "hell"));
        assert!(!names_match(&stored, ""));
    }

    #[test]
    fn test_volume_label_keeps_punctuation() {
        assert_eq!(&volume_label(" my-disk "), b"MY-DISK   ");
        assert_eq!(&volume_label("NEWVOLUME"), b"NEWVOLUME ");
    }

    #[test]
    fn test_blank_names() {
        assert!(is_blank_name(&[0x20; NAME_LEN]));
        assert!(is_blank_name(&[0x00; NAME_LEN]));
        assert!(!is_blank_name(&normalize_name("A")));
    }
}
