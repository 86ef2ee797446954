//! gzip format support
//!
//! Inflating is provided by [flate2](https://github.com/rust-lang/flate2-rs);
//! header and footer are parsed here so the original file name is available.
mod footer;
mod header;

pub use footer::*;
pub use header::*;

use crate::error::{Error, Result};
use crate::{Flush, Processor, Status};

/// `GzipDecompressReader` is a struct that allows decompression of data using the GZIP format.
///
/// ## Example
/// ```
/// # use std::io::prelude::*;
/// # use flate2::{write::GzEncoder, Compression};
/// use peel::gzip::GzipDecompressReader;
///
/// # fn main() -> anyhow::Result<()> {
/// # let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
/// # encoder.write_all(b"Hello, world")?;
/// # let compressed = encoder.finish()?;
/// let mut gzip_reader = GzipDecompressReader::new(&compressed[..]);
/// let mut buf = Vec::new();
/// gzip_reader.read_to_end(&mut buf)?;
/// assert_eq!(buf, b"Hello, world");
/// # Ok(())
/// # }
/// ```
pub type GzipDecompressReader<R> = crate::io::ProcessorReader<GzipDecompress, R>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GzipStatus {
    Header,
    Data,
    Footer,
    StreamEnd,
}

/// `GzipDecompress` is a struct that allows decompression of data using the GZIP format.
#[derive(Debug)]
pub struct GzipDecompress {
    processed_input: u64,
    header: Option<GzipHeader>,
    buffer: Vec<u8>,
    inner: flate2::Decompress,
    status: GzipStatus,
    crc: flate2::Crc,
}

impl Default for GzipDecompress {
    fn default() -> Self {
        Self::new()
    }
}

impl GzipDecompress {
    pub fn new() -> Self {
        Self {
            processed_input: 0,
            header: None,
            buffer: Vec::new(),
            inner: flate2::Decompress::new(false),
            status: GzipStatus::Header,
            crc: flate2::Crc::new(),
        }
    }

    /// Resume decoding right after a member header that was already read
    /// from the input, so the header is parsed only once.
    pub fn after_header(header: GzipHeader) -> Self {
        Self {
            header: Some(header),
            status: GzipStatus::Data,
            ..Self::new()
        }
    }

    /// Header of the member currently being decompressed, once parsed.
    pub fn header(&self) -> Option<&GzipHeader> {
        self.header.as_ref()
    }

    fn need_more(flush: Flush) -> Result<Status> {
        match flush {
            Flush::Finish => Err(Error::MoreDataRequired),
            Flush::None => Ok(Status::Ok),
        }
    }
}

const TEMPORARY_COPY_SIZE_UNIT: usize = 100;

impl Processor for GzipDecompress {
    fn process(&mut self, mut input: &[u8], output: &mut [u8], flush: Flush) -> Result<Status> {
        loop {
            match self.status {
                GzipStatus::Header => {
                    let copied_size = TEMPORARY_COPY_SIZE_UNIT.min(input.len());
                    if copied_size == 0 {
                        return if self.buffer.is_empty() {
                            Ok(Status::Ok)
                        } else {
                            Self::need_more(flush)
                        };
                    }
                    let original_buffer_size = self.buffer.len();
                    self.buffer.extend_from_slice(&input[..copied_size]);
                    match GzipHeader::parse(&self.buffer[..]) {
                        Ok(header) => {
                            let consumed_size = header.header_size - original_buffer_size;
                            log::trace!("gzip header parsed: {:?}", header);
                            self.header = Some(header);
                            input = &input[consumed_size..];
                            self.processed_input += consumed_size as u64;
                            self.status = GzipStatus::Data;
                            self.buffer.clear();
                        }
                        Err(e) => {
                            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                                input = &input[copied_size..];
                                self.processed_input += copied_size as u64;
                            } else {
                                return Err(Error::DecompressError(e.to_string()));
                            }
                        }
                    }
                }
                GzipStatus::Data => {
                    let original_total_in = self.inner.total_in();
                    let original_total_out = self.inner.total_out();
                    let status = self
                        .inner
                        .decompress(input, output, flate2::FlushDecompress::None)
                        .map_err(|e| Error::DecompressError(e.to_string()))?;
                    let current_processed_input = self.inner.total_in() - original_total_in;
                    let current_processed_output = self.inner.total_out() - original_total_out;
                    self.crc
                        .update(&output[..current_processed_output as usize]);
                    self.processed_input += current_processed_input;
                    input = &input[current_processed_input as usize..];
                    let stalled = input.is_empty() && current_processed_output == 0;
                    match status {
                        flate2::Status::Ok | flate2::Status::BufError if stalled => {
                            return Self::need_more(flush);
                        }
                        flate2::Status::Ok => {
                            return Ok(Status::Ok);
                        }
                        flate2::Status::BufError => {
                            if current_processed_input == 0 && current_processed_output == 0 {
                                return Err(Error::DecompressError("BufError".to_string()));
                            }
                            return Ok(Status::Ok);
                        }
                        flate2::Status::StreamEnd => {
                            self.status = GzipStatus::Footer;
                        }
                    }
                }
                GzipStatus::Footer => {
                    let copied_size = TEMPORARY_COPY_SIZE_UNIT.min(input.len());
                    if copied_size == 0 {
                        return Self::need_more(flush);
                    }
                    let original_buffer_size = self.buffer.len();
                    self.buffer.extend_from_slice(&input[..copied_size]);
                    match GzipFooter::parse(&self.buffer[..]) {
                        Ok(footer) => {
                            let consumed_size = footer.footer_size() - original_buffer_size;
                            self.processed_input += consumed_size as u64;
                            if footer.crc32 != self.crc.sum() {
                                return Err(Error::DecompressError("CRC32 mismatch".to_string()));
                            }
                            if footer.isize != self.inner.total_out() as u32 {
                                return Err(Error::DecompressError("ISIZE mismatch".to_string()));
                            }
                            self.status = GzipStatus::StreamEnd;
                            self.buffer.clear();
                            self.crc.reset();
                            return Ok(Status::StreamEnd);
                        }
                        Err(e) => {
                            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                                input = &input[copied_size..];
                                self.processed_input += copied_size as u64;
                            } else {
                                return Err(e.into());
                            }
                        }
                    }
                }
                GzipStatus::StreamEnd => {
                    return Ok(Status::StreamEnd);
                }
            }
        }
    }

    fn reset(&mut self) {
        self.processed_input = 0;
        self.header = None;
        self.buffer.clear();
        self.inner.reset(false);
        self.status = GzipStatus::Header;
        self.crc.reset();
    }

    fn total_in(&self) -> u64 {
        self.processed_input
    }

    fn total_out(&self) -> u64 {
        self.inner.total_out()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tests::{gzip_bytes, test_decompress, SAMPLE};
    use std::io::Read;

    #[test]
    fn test_gzip_decompress() -> anyhow::Result<()> {
        let data = gzip_bytes(SAMPLE, None)?;
        test_decompress(GzipDecompress::new(), &data)?;
        Ok(())
    }

    #[test]
    fn test_gzip_named() -> anyhow::Result<()> {
        let data = gzip_bytes(SAMPLE, Some("sample.txt"))?;
        let mut decompress = GzipDecompress::new();
        let mut output = vec![0u8; SAMPLE.len() + 16];
        assert_eq!(
            decompress.process(&data, &mut output, Flush::Finish)?,
            Status::StreamEnd
        );
        assert_eq!(
            decompress.header().and_then(|h| h.file_name()),
            Some(&b"sample.txt"[..])
        );
        assert_eq!(&output[..decompress.total_out() as usize], SAMPLE);
        Ok(())
    }

    #[test]
    fn test_gzip_after_header() -> anyhow::Result<()> {
        let half = SAMPLE.len() / 2;
        let mut data = gzip_bytes(&SAMPLE[..half], Some("first.txt"))?;
        data.extend(gzip_bytes(&SAMPLE[half..], None)?);

        let mut input = &data[..];
        let header = GzipHeader::parse(&mut input)?;
        assert_eq!(header.file_name(), Some(&b"first.txt"[..]));

        let decompress = GzipDecompress::after_header(header);
        assert_eq!(
            decompress.header().and_then(|h| h.file_name()),
            Some(&b"first.txt"[..])
        );
        let mut reader = crate::io::ProcessorReader::with_processor(decompress, input);
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        assert_eq!(buf, SAMPLE);
        Ok(())
    }

    #[test]
    fn test_gzip_multistream() -> anyhow::Result<()> {
        let half = SAMPLE.len() / 2;
        let mut data = gzip_bytes(&SAMPLE[..half], None)?;
        data.extend(gzip_bytes(&SAMPLE[half..], None)?);
        test_decompress(GzipDecompress::new(), &data)?;
        Ok(())
    }

    #[test]
    fn test_gzip_crc_mismatch() -> anyhow::Result<()> {
        let mut data = gzip_bytes(SAMPLE, None)?;
        let crc_offset = data.len() - 8;
        data[crc_offset] ^= 0xff;
        let mut output = vec![0u8; SAMPLE.len() + 16];
        let error = GzipDecompress::new()
            .process(&data, &mut output, Flush::Finish)
            .unwrap_err();
        assert!(error.is_decode_error(), "{:?}", error);
        Ok(())
    }

    #[test]
    fn test_gzip_truncated() -> anyhow::Result<()> {
        let data = gzip_bytes(SAMPLE, None)?;
        let mut reader = GzipDecompressReader::new(&data[..data.len() / 2]);
        let mut buf = Vec::new();
        let error = reader.read_to_end(&mut buf).unwrap_err();
        assert_eq!(error.kind(), std::io::ErrorKind::UnexpectedEof);
        assert!(matches!(Error::from_io(error), Error::MoreDataRequired));

        let mut decompress = GzipDecompress::new();
        let mut output = vec![0u8; SAMPLE.len() + 16];
        let consumed = data.len() - 4;
        decompress.process(&data[..consumed], &mut output, Flush::None)?;
        assert_eq!(decompress.total_in(), consumed as u64);
        let error = decompress
            .process(&[], &mut output, Flush::Finish)
            .unwrap_err();
        assert!(matches!(error, Error::MoreDataRequired), "{:?}", error);
        Ok(())
    }

    #[test]
    fn test_gzip_bad_header() {
        let mut output = [0u8; 16];
        let error = GzipDecompress::new()
            .process(&[0x1f, 0x8b, 0x07, 0, 0, 0, 0, 0, 0, 3], &mut output, Flush::Finish)
            .unwrap_err();
        assert!(matches!(error, Error::DecompressError(_)), "{:?}", error);
    }
}
