#![cfg_attr(doc_cfg, feature(doc_cfg))]

//! Detect a file's compression or archive format from its magic bytes and peel
//! nested layers off (for example `.tar.gz.bz2`) until a plain file or an
//! extracted directory tree remains.
//!
//! Supported file formats
//! ---------------------
//!
//! * [Gzip](https://www.ietf.org/rfc/rfc1952.txt)
//! * [BZip2](https://www.sourceware.org/bzip2/)
//! * [Tar](https://www.gnu.org/software/tar/manual/html_node/Standard.html) (extracted into a directory; always the last layer)
//!
//! ## Example
//! ```no_run
//! # fn main() -> peel::Result<()> {
//! let resolution = peel::resolve("release.tar.gz.bz2")?;
//! println!("Your file is in: {}", resolution.path().display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Step by step
//! ```no_run
//! use peel::{Config, Resolver, Step};
//!
//! # fn main() -> peel::Result<()> {
//! let resolver = Resolver::new(Config::default());
//! for step in resolver.steps("release.tar.gz.bz2") {
//!     match step? {
//!         Step::Decompressed { format, destination, .. } => {
//!             println!("{} -> {}", format, destination.display())
//!         }
//!         Step::Extracted { extraction, .. } => {
//!             println!("extracted to {}", extraction.destination.display())
//!         }
//!         Step::Finished { path } => println!("done: {}", path.display()),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod format;
mod resolve;

#[cfg(feature = "bzip2")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "bzip2")))]
pub mod bzip2;
pub mod decompress;
#[cfg(feature = "flate2")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "flate2")))]
pub mod gzip;
pub mod io;
#[cfg(feature = "tar")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "tar")))]
pub mod untar;


pub use config::{Config, DEFAULT_MAX_DEPTH};
pub use error::{Error, Result};
pub use format::FileFormat;
pub use resolve::{resolve, Resolution, Resolver, Step, Steps};
#[cfg(feature = "tar")]
pub use untar::Extraction;

/// Flush mode
///
/// This enum is used to control how data is flushed in the [`Processor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flush {
    /// More input may follow.
    None,
    /// No more input will be provided; the stream must end here.
    Finish,
}

/// Status of a [`Processor`] after one call to [`Processor::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    StreamEnd,
}

/// `Processor` is a trait for stream decoders.
///
/// A processor consumes a prefix of `input`, writes into a prefix of `output`
/// and reports how much it did through [`Processor::total_in`] and
/// [`Processor::total_out`]. Counters restart at zero after [`Processor::reset`].
pub trait Processor {
    fn process(&mut self, input: &[u8], output: &mut [u8], flush: Flush) -> Result<Status>;
    fn reset(&mut self);
    fn total_in(&self) -> u64;
    fn total_out(&self) -> u64;
}

pub(crate) trait ReadExt: std::io::Read {
    fn read_u8(&mut self) -> std::io::Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16_le(&mut self) -> std::io::Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32_le(&mut self) -> std::io::Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }
}

impl<R: std::io::Read + ?Sized> ReadExt for R {}
