use std::{
    ffi::OsString,
    fmt,
    fs::File,
    io::{Read, Result},
    path::{Path, PathBuf},
};

/// Number of leading bytes compared against the magic signatures.
pub const SIGNATURE_LEN: usize = 2;

#[cfg(feature = "tar")]
const USTAR_OFFSET: usize = 257;
#[cfg(feature = "tar")]
const USTAR_MAGIC: &[u8] = b"ustar";

/// File Format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    #[cfg(feature = "flate2")]
    /// Gzip format
    ///
    /// Expected file extension is `.gz`
    Gzip,
    #[cfg(feature = "bzip2")]
    /// Bzip2 format
    ///
    /// Expected file extension is `.bz2`
    Bzip2,
    #[cfg(feature = "tar")]
    /// Tar archive
    ///
    /// Expected file extension is `.tar`
    Tar,
    /// Anything else. Nothing left to peel.
    Unknown,
}

impl FileFormat {
    pub fn extension(self) -> Option<&'static str> {
        match self {
            #[cfg(feature = "flate2")]
            Self::Gzip => Some("gz"),
            #[cfg(feature = "bzip2")]
            Self::Bzip2 => Some("bz2"),
            #[cfg(feature = "tar")]
            Self::Tar => Some("tar"),
            Self::Unknown => None,
        }
    }

    /// Suggest a format from the file extension only. `.tgz`, `.tbz` and
    /// `.tbz2` map to the compression wrapping the tar archive.
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension().and_then(|s| s.to_str());
        match ext {
            #[cfg(feature = "flate2")]
            Some("gz") | Some("tgz") => Some(Self::Gzip),
            #[cfg(feature = "bzip2")]
            Some("bz2") | Some("tbz") | Some("tbz2") => Some(Self::Bzip2),
            #[cfg(feature = "tar")]
            Some("tar") => Some(Self::Tar),
            _ => None,
        }
    }

    /// Remove the extension of `path` if it is one of this format's
    /// extensions. `.tgz`, `.tbz` and `.tbz2` become `.tar`.
    pub fn strip_extension<P: AsRef<Path>>(self, path: P) -> Option<PathBuf> {
        let path = path.as_ref();
        if Self::from_extension(path) != Some(self) {
            return None;
        }
        match path.extension().and_then(|s| s.to_str()) {
            Some("tgz") | Some("tbz") | Some("tbz2") => Some(path.with_extension("tar")),
            _ => Some(path.with_extension("")),
        }
    }

    /// Classify the first [`SIGNATURE_LEN`] bytes of `buf`.
    ///
    /// The tar signature is the two bytes `te`. Any file starting with those
    /// two bytes is reported as [`FileFormat::Tar`], whether or not it is an
    /// archive.
    pub fn from_buf(buf: &[u8]) -> Self {
        if buf.starts_with(&[0x1f, 0x8b]) {
            #[cfg(feature = "flate2")]
            return Self::Gzip;
        }
        if buf.starts_with(b"BZ") {
            #[cfg(feature = "bzip2")]
            return Self::Bzip2;
        }
        if buf.starts_with(b"te") {
            #[cfg(feature = "tar")]
            return Self::Tar;
        }
        Self::Unknown
    }

    /// Sniff the format of the file at `path`.
    ///
    /// Fails if the file cannot be opened or is shorter than
    /// [`SIGNATURE_LEN`] bytes. When the signature is unknown, the `ustar`
    /// magic of a tar header block is checked as well. The file is closed
    /// before this function returns.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path.as_ref())?;
        let mut signature = [0u8; SIGNATURE_LEN];
        file.read_exact(&mut signature)?;

        let format = Self::from_buf(&signature);
        if format != Self::Unknown {
            return Ok(format);
        }

        #[cfg(feature = "tar")]
        {
            let mut block = Vec::with_capacity(USTAR_OFFSET + USTAR_MAGIC.len());
            block.extend_from_slice(&signature);
            file.take((USTAR_OFFSET + USTAR_MAGIC.len() - SIGNATURE_LEN) as u64)
                .read_to_end(&mut block)?;
            if is_tar_header(&block) {
                return Ok(Self::Tar);
            }
        }

        Ok(Self::Unknown)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            #[cfg(feature = "flate2")]
            Self::Gzip => "gz",
            #[cfg(feature = "bzip2")]
            Self::Bzip2 => "bz2",
            #[cfg(feature = "tar")]
            Self::Tar => "tar",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// `path` with `.{ext}` appended to its last component.
pub(crate) fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

#[cfg(feature = "tar")]
fn is_tar_header(block: &[u8]) -> bool {
    block.len() >= USTAR_OFFSET + USTAR_MAGIC.len()
        && &block[USTAR_OFFSET..USTAR_OFFSET + USTAR_MAGIC.len()] == USTAR_MAGIC
}
