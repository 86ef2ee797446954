//! Bzip2 format support

use crate::{Error, Flush, Processor, Result, Status};

/// `Bzip2DecompressReader` is a struct that allows decompression of data using the BZIP2 format.
///
/// See [`GzipDecompressReader`](crate::gzip::GzipDecompressReader) to learn how to use.
pub type Bzip2DecompressReader<R> = crate::io::ProcessorReader<Bzip2Decompress, R>;

/// Bzip2 decompression processor
pub struct Bzip2Decompress {
    inner: bzip2::Decompress,
}

impl Bzip2Decompress {
    pub fn new() -> Self {
        Self {
            inner: bzip2::Decompress::new(false),
        }
    }
}

impl Default for Bzip2Decompress {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for Bzip2Decompress {
    fn process(&mut self, input: &[u8], output: &mut [u8], flush: Flush) -> Result<Status> {
        if input.is_empty() && self.inner.total_in() == 0 {
            return Ok(Status::Ok);
        }
        let original_total_in = self.inner.total_in();
        let original_total_out = self.inner.total_out();
        let status = self
            .inner
            .decompress(input, output)
            .map_err(|e| Error::DecompressError(e.to_string()))?;
        let stalled = self.inner.total_in() == original_total_in
            && self.inner.total_out() == original_total_out;
        match status {
            bzip2::Status::StreamEnd => Ok(Status::StreamEnd),
            _ if stalled && flush == Flush::Finish => Err(Error::MoreDataRequired),
            _ => Ok(Status::Ok),
        }
    }

    fn reset(&mut self) {
        self.inner = bzip2::Decompress::new(false);
    }

    fn total_in(&self) -> u64 {
        self.inner.total_in()
    }

    fn total_out(&self) -> u64 {
        self.inner.total_out()
    }
}
