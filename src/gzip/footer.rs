use crate::ReadExt;
use std::io;

/// This type represents the footer of a gzip file.
///
/// Please read gzip specification for more information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GzipFooter {
    pub crc32: u32,
    pub isize: u32,
}

impl GzipFooter {
    /// Parse a gzip footer from a reader.
    pub fn parse(mut reader: impl io::BufRead) -> io::Result<Self> {
        let crc32 = reader.read_u32_le()?;
        let isize = reader.read_u32_le()?;
        Ok(Self { crc32, isize })
    }

    pub fn footer_size(&self) -> usize {
        8
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gzip_footer() -> anyhow::Result<()> {
        let footer = GzipFooter::parse(&[0x78, 0x56, 0x34, 0x12, 0x05, 0x00, 0x00, 0x00][..])?;
        assert_eq!(footer.crc32, 0x1234_5678);
        assert_eq!(footer.isize, 5);

        let error = GzipFooter::parse(&[0x78, 0x56, 0x34][..]).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);
        Ok(())
    }
}
