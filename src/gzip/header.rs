use crate::ReadExt;
use std::io::BufRead;

/// This type represents the header of a gzip file.
///
/// Please read gzip specification for more information.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GzipHeader {
    pub compression_method: u8,
    pub flag: u8,
    pub mtime: u32,
    pub extra_flag: u8,
    pub os: GzipOs,
    pub xlen: u16,
    pub extra: Option<Vec<u8>>,
    pub fname: Option<Vec<u8>>,
    pub fcomment: Option<Vec<u8>>,
    pub crc16: Option<u16>,
    pub header_size: usize,
}

pub const FTEXT: u8 = 0b0000_0001;
pub const FHCRC: u8 = 0b0000_0010;
pub const FEXTRA: u8 = 0b0000_0100;
pub const FNAME: u8 = 0b0000_1000;
pub const FCOMMENT: u8 = 0b0001_0000;

/// Operation System of gzip file created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GzipOs {
    FatFs = 0,
    Amiga = 1,
    Vms = 2,
    Unix = 3,
    VmCms = 4,
    AtariTos = 5,
    Hpfs = 6,
    Macintosh = 7,
    ZSystem = 8,
    Cpm = 9,
    Tops20 = 10,
    Ntfs = 11,
    Qdos = 12,
    AcornRiscos = 13,
    Unknown = 255,
}

impl From<u8> for GzipOs {
    fn from(value: u8) -> Self {
        match value {
            0 => GzipOs::FatFs,
            1 => GzipOs::Amiga,
            2 => GzipOs::Vms,
            3 => GzipOs::Unix,
            4 => GzipOs::VmCms,
            5 => GzipOs::AtariTos,
            6 => GzipOs::Hpfs,
            7 => GzipOs::Macintosh,
            8 => GzipOs::ZSystem,
            9 => GzipOs::Cpm,
            10 => GzipOs::Tops20,
            11 => GzipOs::Ntfs,
            12 => GzipOs::Qdos,
            13 => GzipOs::AcornRiscos,
            _ => GzipOs::Unknown,
        }
    }
}

impl GzipHeader {
    /// Original file name stored in the header, without the trailing NUL.
    ///
    /// Returns `None` when the FNAME field is absent or empty.
    pub fn file_name(&self) -> Option<&[u8]> {
        let fname = self.fname.as_deref()?;
        let fname = fname.strip_suffix(b"\0").unwrap_or(fname);
        if fname.is_empty() {
            None
        } else {
            Some(fname)
        }
    }

    /// Parse a gzip header from a reader.
    pub fn parse<R: BufRead>(mut reader: R) -> std::io::Result<Self> {
        let mut ids = [0u8; 2];
        reader.read_exact(&mut ids)?;
        if ids != [0x1f, 0x8b] {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "invalid gzip header",
            ));
        }

        let compression_method = reader.read_u8()?;
        if compression_method != 8 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "unsupported gzip compression method",
            ));
        }
        let flag = reader.read_u8()?;
        let mtime = reader.read_u32_le()?;
        let extra_flag = reader.read_u8()?;
        let os: GzipOs = reader.read_u8()?.into();

        let mut header_size = 2 + 1 + 1 + 4 + 1 + 1;

        let (xlen, extra) = if flag & FEXTRA != 0 {
            let xlen = reader.read_u16_le()?;
            let mut extra = vec![0u8; xlen as usize];
            reader.read_exact(&mut extra)?;
            header_size += 2 + xlen as usize;
            (xlen, Some(extra))
        } else {
            (0, None)
        };

        let fname = if flag & FNAME != 0 {
            let mut fname = Vec::new();
            reader.read_until(0, &mut fname)?;
            if !fname.ends_with(b"\0") {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "incomplete gzip header",
                ));
            }
            header_size += fname.len();
            Some(fname)
        } else {
            None
        };

        let fcomment = if flag & FCOMMENT != 0 {
            let mut fcomment = Vec::new();
            reader.read_until(0, &mut fcomment)?;
            if !fcomment.ends_with(b"\0") {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "incomplete gzip header",
                ));
            }
            header_size += fcomment.len();
            Some(fcomment)
        } else {
            None
        };

        let crc16 = if flag & FHCRC != 0 {
            header_size += 2;
            Some(reader.read_u16_le()?)
        } else {
            None
        };

        Ok(GzipHeader {
            compression_method,
            flag,
            mtime,
            extra_flag,
            os,
            xlen,
            extra,
            fname,
            fcomment,
            crc16,
            header_size,
        })
    }
}
