//! Single unwrap steps for compressed streams: one compressed file in, one
//! decompressed file out, next to it.
//!
//! The source is never modified or removed. The destination is created, or
//! truncated if it already exists, and is never the source itself.

use crate::format::append_extension;
use crate::FileFormat;
#[cfg(feature = "bzip2")]
use crate::bzip2::Bzip2Decompress;
#[cfg(feature = "flate2")]
use crate::gzip::{GzipDecompress, GzipHeader};
#[cfg(any(feature = "flate2", feature = "bzip2"))]
use crate::{io::ProcessorReader, Error, Result};
#[cfg(any(feature = "flate2", feature = "bzip2"))]
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
};
use std::path::{Path, PathBuf};

/// Appended when the source has no recognised extension to strip.
pub const FALLBACK_EXTENSION: &str = "out";

/// Path of the file produced by decompressing `source`.
///
/// `embedded_name` is the original file name stored in a gzip header. Only
/// its last component is used, placed in the directory of `source`. Without
/// it, the format's extension is stripped from `source`; failing that,
/// [`FALLBACK_EXTENSION`] is appended. A result equal to `source` also gets
/// [`FALLBACK_EXTENSION`] appended, so a step never overwrites its input.
pub fn destination(source: &Path, format: FileFormat, embedded_name: Option<&[u8]>) -> PathBuf {
    let candidate = match embedded_name.and_then(embedded_file_name) {
        Some(name) => source
            .parent()
            .map(|parent| parent.join(&name))
            .unwrap_or(name),
        None => format
            .strip_extension(source)
            .unwrap_or_else(|| append_extension(source, FALLBACK_EXTENSION)),
    };
    if candidate == source {
        append_extension(source, FALLBACK_EXTENSION)
    } else {
        candidate
    }
}

fn embedded_file_name(raw: &[u8]) -> Option<PathBuf> {
    let name = String::from_utf8_lossy(raw);
    Path::new(name.as_ref()).file_name().map(PathBuf::from)
}

/// Decompress the gzip file at `source` and return the path written.
#[cfg(feature = "flate2")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "flate2")))]
pub fn gunzip<P: AsRef<Path>>(source: P) -> Result<PathBuf> {
    let source = source.as_ref();
    let mut reader = BufReader::new(File::open(source)?);
    let header = GzipHeader::parse(&mut reader).map_err(|e| match e.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            Error::DecompressError(format!("invalid gzip header: {}", e))
        }
        _ => Error::IoError(e),
    })?;
    log::debug!(
        "gzip header of {}: name {:?}, mtime {}, os {:?}",
        source.display(),
        header.file_name().map(String::from_utf8_lossy),
        header.mtime,
        header.os
    );
    let destination = destination(source, FileFormat::Gzip, header.file_name());

    let written = copy_decoded(
        ProcessorReader::with_processor(GzipDecompress::after_header(header), reader),
        &destination,
    )?;
    log::debug!(
        "gunzip {} -> {} ({} bytes)",
        source.display(),
        destination.display(),
        written
    );
    Ok(destination)
}

/// Decompress the bzip2 file at `source` and return the path written.
#[cfg(feature = "bzip2")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "bzip2")))]
pub fn bunzip2<P: AsRef<Path>>(source: P) -> Result<PathBuf> {
    let source = source.as_ref();
    let reader = BufReader::new(File::open(source)?);
    let destination = destination(source, FileFormat::Bzip2, None);

    let written = copy_decoded(
        ProcessorReader::<Bzip2Decompress, _>::new(reader),
        &destination,
    )?;
    log::debug!(
        "bunzip2 {} -> {} ({} bytes)",
        source.display(),
        destination.display(),
        written
    );
    Ok(destination)
}

#[cfg(any(feature = "flate2", feature = "bzip2"))]
fn copy_decoded<R: Read>(mut decoded: R, destination: &Path) -> Result<u64> {
    let mut writer = BufWriter::new(File::create(destination)?);
    let written = io::copy(&mut decoded, &mut writer).map_err(Error::from_io)?;
    writer.flush()?;
    Ok(written)
}
