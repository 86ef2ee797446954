//! Tar archive extraction
//!
//! Archive reading is provided by [tar](https://github.com/alexcrichton/tar-rs).
//! Only directories and regular files are materialized; links, devices and
//! other special entries are skipped.

use crate::format::append_extension;
use crate::{Error, FileFormat, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};

/// Appended to the source when it has no `.tar` extension to strip.
pub const FALLBACK_EXTENSION: &str = "d";

/// Summary of one extraction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Extraction {
    /// Directory the archive was extracted into.
    pub destination: PathBuf,
    pub directories: usize,
    pub files: usize,
    /// Entries of any other type, left out.
    pub skipped: usize,
}

/// Directory that [`extract`] fills for the archive at `source`.
pub fn destination(source: &Path) -> PathBuf {
    FileFormat::Tar
        .strip_extension(source)
        .unwrap_or_else(|| append_extension(source, FALLBACK_EXTENSION))
}

/// Extract the tar archive at `source` next to it.
///
/// Entries are written in archive order and each file is closed before the
/// next entry is read. On error, whatever was already written stays on disk.
pub fn extract<P: AsRef<Path>>(source: P) -> Result<Extraction> {
    extract_with(source.as_ref(), |_| ())
}

/// [`extract`], calling `after_entry` with each entry name once that entry
/// has been handled.
fn extract_with<F: FnMut(&Path)>(source: &Path, mut after_entry: F) -> Result<Extraction> {
    let reader = BufReader::new(File::open(source)?);
    let destination = destination(source);
    fs::create_dir_all(&destination)?;

    let mut extraction = Extraction {
        destination,
        directories: 0,
        files: 0,
        skipped: 0,
    };

    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries().map_err(archive_error)? {
        let mut entry = entry.map_err(archive_error)?;
        let entry_path = entry.path().map_err(archive_error)?.into_owned();
        let entry_type = entry.header().entry_type();

        if entry_type.is_dir() {
            let target = resolve_entry_path(&extraction.destination, &entry_path)?;
            fs::create_dir_all(&target)?;
            extraction.directories += 1;
        } else if entry_type.is_file() {
            let target = resolve_entry_path(&extraction.destination, &entry_path)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mode = entry.header().mode().map_err(archive_error)?;
            let mut file = create_file(&target, mode)?;
            io::copy(&mut entry, &mut file).map_err(Error::from_io)?;
            drop(file);
            extraction.files += 1;
        } else {
            log::debug!(
                "skipping {:?} entry {}",
                entry_type,
                entry_path.display()
            );
            extraction.skipped += 1;
        }
        after_entry(&entry_path);
    }

    log::debug!(
        "extracted {} directories and {} files into {}",
        extraction.directories,
        extraction.files,
        extraction.destination.display()
    );
    Ok(extraction)
}

#[cfg(unix)]
fn create_file(target: &Path, mode: u32) -> Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode & 0o7777)
        .open(target)?)
}

#[cfg(not(unix))]
fn create_file(target: &Path, _mode: u32) -> Result<File> {
    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(target)?)
}

/// Join an archive entry name onto `base`, refusing names that are absolute
/// or climb out of `base`.
fn resolve_entry_path(base: &Path, entry_path: &Path) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in entry_path.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => (),
            Component::ParentDir => {
                if !relative.pop() {
                    return Err(Error::UnsafeEntryPath(entry_path.to_path_buf()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::UnsafeEntryPath(entry_path.to_path_buf()));
            }
        }
    }
    Ok(base.join(relative))
}

fn archive_error(e: io::Error) -> Error {
    if e.get_ref().map_or(false, |inner| inner.is::<Error>()) {
        return Error::from_io(e);
    }
    let malformed = match e.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => true,
        // tar reports bad headers as `Other` with a message and no OS error code
        io::ErrorKind::Other => e.raw_os_error().is_none() && e.get_ref().is_some(),
        _ => false,
    };
    if malformed {
        Error::DecompressError(format!("invalid tar archive: {}", e))
    } else {
        Error::from_io(e)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tests::{tar_bytes, TarEntry};
    use temp_testdir::TempDir;

    #[test]
    fn test_destination() {
        assert_eq!(destination(Path::new("dir/a.tar")), PathBuf::from("dir/a"));
        assert_eq!(destination(Path::new("dir/a")), PathBuf::from("dir/a.d"));
    }

    #[test]
    fn test_resolve_entry_path() -> anyhow::Result<()> {
        let base = Path::new("out");
        assert_eq!(
            resolve_entry_path(base, Path::new("d/./f.txt"))?,
            PathBuf::from("out/d/f.txt")
        );
        assert_eq!(
            resolve_entry_path(base, Path::new("d/../f.txt"))?,
            PathBuf::from("out/f.txt")
        );
        assert!(matches!(
            resolve_entry_path(base, Path::new("../f.txt")),
            Err(Error::UnsafeEntryPath(_))
        ));
        assert!(matches!(
            resolve_entry_path(base, Path::new("/etc/passwd")),
            Err(Error::UnsafeEntryPath(_))
        ));
        Ok(())
    }

    #[test]
    fn test_extract() -> anyhow::Result<()> {
        let temp = TempDir::default();
        let source = temp.join("a.tar");
        fs::write(
            &source,
            tar_bytes(&[
                TarEntry::Dir("d/"),
                TarEntry::File("d/f.txt", b"hello", 0o644),
                TarEntry::Symlink("d/link", "f.txt"),
                TarEntry::File("top.txt", b"top", 0o600),
            ])?,
        )?;

        let extraction = extract(&source)?;
        assert_eq!(
            extraction,
            Extraction {
                destination: temp.join("a"),
                directories: 1,
                files: 2,
                skipped: 1,
            }
        );
        assert_eq!(fs::read(temp.join("a/d/f.txt"))?, b"hello");
        assert_eq!(fs::read(temp.join("a/top.txt"))?, b"top");
        assert!(!temp.join("a/d/link").exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(temp.join("a/top.txt"))?.permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
        Ok(())
    }

    #[test]
    fn test_extract_file_without_directory_entry() -> anyhow::Result<()> {
        let temp = TempDir::default();
        let source = temp.join("bundle");
        fs::write(
            &source,
            tar_bytes(&[TarEntry::File("nested/deeper/f.txt", b"deep", 0o644)])?,
        )?;

        let extraction = extract(&source)?;
        assert_eq!(extraction.destination, temp.join("bundle.d"));
        assert_eq!(fs::read(temp.join("bundle.d/nested/deeper/f.txt"))?, b"deep");
        Ok(())
    }

    #[test]
    fn test_extract_corrupted() -> anyhow::Result<()> {
        let temp = TempDir::default();
        let source = temp.join("broken.tar");
        let mut data = tar_bytes(&[TarEntry::File("f.txt", b"hello", 0o644)])?;
        // checksum field of the first header
        data[148] ^= 0x01;
        fs::write(&source, &data)?;

        let error = extract(&source).unwrap_err();
        assert!(error.is_decode_error(), "{:?}", error);
        assert!(!temp.join("broken/f.txt").exists());

        fs::write(&source, b"text that merely starts with te")?;
        let error = extract(&source).unwrap_err();
        assert!(error.is_decode_error(), "{:?}", error);
        Ok(())
    }

    #[test]
    fn test_archive_error_kinds() {
        let error = archive_error(io::Error::new(
            io::ErrorKind::Other,
            "archive header checksum mismatch",
        ));
        assert!(matches!(error, Error::DecompressError(_)), "{:?}", error);

        let error = archive_error(io::Error::new(io::ErrorKind::InvalidData, "bad size"));
        assert!(matches!(error, Error::DecompressError(_)), "{:?}", error);

        let error = archive_error(io::ErrorKind::Other.into());
        assert!(matches!(error, Error::IoError(_)), "{:?}", error);

        let error = archive_error(io::ErrorKind::PermissionDenied.into());
        match error {
            Error::IoError(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("unexpected error: {:?}", other),
        }

        let error = archive_error(Error::MoreDataRequired.into());
        assert!(matches!(error, Error::MoreDataRequired), "{:?}", error);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_extract_keeps_open_files_bounded() -> anyhow::Result<()> {
        fn open_descriptors() -> usize {
            fs::read_dir("/proc/self/fd")
                .expect("list open descriptors")
                .count()
        }

        const ENTRIES: usize = 2000;
        let temp = TempDir::default();
        let source = temp.join("many.tar");
        let names: Vec<String> = (0..ENTRIES).map(|i| format!("files/{:04}.txt", i)).collect();
        let entries: Vec<TarEntry> = names
            .iter()
            .map(|name| TarEntry::File(name.as_str(), b"x", 0o644))
            .collect();
        fs::write(&source, tar_bytes(&entries)?)?;

        let before = open_descriptors();
        let mut peak = before;
        let mut visited = 0;
        let extraction = extract_with(&source, |_| {
            peak = peak.max(open_descriptors());
            visited += 1;
        })?;

        assert_eq!(extraction.files, ENTRIES);
        assert_eq!(visited, ENTRIES);
        // other tests run concurrently and may hold a few descriptors
        assert!(peak < before + 64, "{} descriptors before, peak {}", before, peak);
        Ok(())
    }
}
