use crate::{Error, Flush, Processor, Status};
use std::io::{BufRead, Read};

/// This struct that allows reading of data processed by a [`Processor`] from a [`BufRead`].
///
/// Concatenated streams are decoded one after another. Running out of input
/// in the middle of a stream is reported as an error of kind
/// [`UnexpectedEof`](std::io::ErrorKind::UnexpectedEof) wrapping
/// [`Error::MoreDataRequired`], never as a short read.
///
/// ## Type Parameters
/// - `P`: The type of the `Processor` that processes the data.
/// - `R`: The type of the `BufRead` that provides the data.
///
/// ## Example
/// ```
/// # use std::io::prelude::*;
/// # use bzip2::{write::BzEncoder, Compression};
/// use peel::bzip2::Bzip2Decompress;
/// use peel::io::ProcessorReader;
///
/// # fn main() -> anyhow::Result<()> {
/// # let mut encoder = BzEncoder::new(Vec::new(), Compression::default());
/// # encoder.write_all(b"Hello, world")?;
/// # let compressed = encoder.finish()?;
/// let mut bzip2_reader = ProcessorReader::<Bzip2Decompress, _>::new(&compressed[..]);
/// let mut buf = Vec::new();
/// bzip2_reader.read_to_end(&mut buf)?;
/// assert_eq!(buf, b"Hello, world");
/// # Ok(())
/// # }
/// ```
pub struct ProcessorReader<P: Processor, R: BufRead> {
    processor: P,
    reader: R,
}

impl<P: Processor + Default, R: BufRead> ProcessorReader<P, R> {
    /// Create a new [`ProcessorReader`] from [`BufRead`]
    pub fn new(reader: R) -> Self {
        Self {
            processor: P::default(),
            reader,
        }
    }
}

impl<P: Processor, R: BufRead> ProcessorReader<P, R> {
    /// Create a new [`ProcessorReader`] with specified [`Processor`].
    pub fn with_processor(processor: P, reader: R) -> Self {
        Self { processor, reader }
    }

    /// Unwraps this `ProcessorReader`, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<P: Processor, R: BufRead> Read for ProcessorReader<P, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let last_total_in = self.processor.total_in();
            let last_total_out = self.processor.total_out();
            let input = self.reader.fill_buf()?;
            let flush = if input.is_empty() {
                Flush::Finish
            } else {
                Flush::None
            };
            let status = self.processor.process(input, buf, flush)?;

            let consumed = self.processor.total_in() - last_total_in;
            let produced = self.processor.total_out() - last_total_out;
            self.reader.consume(consumed as usize);

            let stream_end = status == Status::StreamEnd;
            let started = self.processor.total_in() > 0;
            if stream_end {
                self.processor.reset();
            }

            if produced > 0 {
                return Ok(produced as usize);
            }
            match flush {
                Flush::Finish if stream_end || !started => return Ok(0),
                Flush::Finish => return Err(Error::MoreDataRequired.into()),
                Flush::None if consumed == 0 && !stream_end => {
                    return Err(Error::DecompressError("decoder made no progress".to_string()).into())
                }
                Flush::None => (),
            }
        }
    }
}
