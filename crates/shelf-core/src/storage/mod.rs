//! Destination file lifecycle.
//!
//! Bytes are streamed into `<destination>.part`; on success the temp file is
//! synced and atomically renamed to the destination, on failure it is removed.

mod writer;

pub use writer::StorageWriter;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `book.pdf` → `book.pdf.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("book.pdf"));
        assert_eq!(p.to_string_lossy(), "book.pdf.part");
        let p2 = temp_path(Path::new("/tmp/library/novel.epub"));
        assert_eq!(p2.to_string_lossy(), "/tmp/library/novel.epub.part");
    }

    #[test]
    fn append_then_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("nested").join("book.pdf");

        let mut writer = StorageWriter::create(&final_path).unwrap();
        assert_eq!(writer.temp_path(), temp_path(&final_path).as_path());
        writer.append(b"%PDF-").unwrap();
        writer.append(b"1.7").unwrap();
        assert_eq!(writer.bytes_written(), 8);
        writer.finalize(&final_path).unwrap();

        assert!(!temp_path(&final_path).exists());
        assert_eq!(std::fs::read(&final_path).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn discard_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("book.pdf");
        let mut writer = StorageWriter::create(&final_path).unwrap();
        writer.append(b"partial").unwrap();
        assert!(temp_path(&final_path).exists());
        writer.discard();
        assert!(!temp_path(&final_path).exists());
        assert!(!final_path.exists());
    }

    #[test]
    fn failed_finalize_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("book.pdf");
        std::fs::create_dir(&final_path).unwrap();
        std::fs::write(final_path.join("keep.txt"), b"x").unwrap();

        let mut writer = StorageWriter::create(&final_path).unwrap();
        writer.append(b"%PDF-1.7").unwrap();
        assert!(writer.finalize(&final_path).is_err());
        assert!(!temp_path(&final_path).exists());
        assert!(final_path.join("keep.txt").exists());
    }

    #[test]
    fn create_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        assert!(StorageWriter::create(&blocker.join("book.pdf")).is_err());
    }
}
