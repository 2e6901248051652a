//! Endian-aware byte cursor for RPF binary sections.
//!
//! Every multi-byte field in an RPF file is byte-order-corrected according
//! to the endianness indicator at the start of the header. `EndianReader`
//! wraps a byte slice and decodes fixed-width integers, IEEE doubles, and
//! padded ASCII strings with bounds checking, so the binary grammar of the
//! TOC and frame parsers stays auditable.

use thiserror::Error;

/// Byte order of multi-byte fields in an RPF section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    /// Interpret the RPF endianness-indicator byte.
    ///
    /// `0x00` means big-endian (MSB first); any other value means
    /// little-endian.
    pub fn from_indicator(byte: u8) -> Self {
        if byte == 0 {
            Endian::Big
        } else {
            Endian::Little
        }
    }
}

/// Errors that can occur while reading binary fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// A read ran past the end of the buffer.
    #[error("unexpected end of data at offset {offset}: wanted {wanted} bytes, {available} available")]
    UnexpectedEof {
        offset: usize,
        wanted: usize,
        available: usize,
    },
}

/// Cursor over a byte buffer decoding fixed-width fields.
#[derive(Debug)]
pub struct EndianReader<'a> {
    data: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> EndianReader<'a> {
    /// Create a reader over `data` decoding fields with the given byte order.
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self {
            data,
            pos: 0,
            endian,
        }
    }

    /// Current byte offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes remaining after the current position.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Byte order this reader decodes with.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Move the cursor to an absolute offset.
    ///
    /// Seeking past the end is allowed; the next read will fail.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Advance the cursor by `n` bytes without decoding them.
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n);
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ReadError> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.data.len());
        match end {
            Some(end) => {
                let slice = &self.data[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(ReadError::UnexpectedEof {
                offset: self.pos,
                wanted: n,
                available: self.remaining(),
            }),
        }
    }

    /// Read `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ReadError> {
        self.take(n)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ReadError> {
        let b = self.take(2)?;
        let raw = [b[0], b[1]];
        Ok(match self.endian {
            Endian::Big => u16::from_be_bytes(raw),
            Endian::Little => u16::from_le_bytes(raw),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        let b = self.take(4)?;
        let raw = [b[0], b[1], b[2], b[3]];
        Ok(match self.endian {
            Endian::Big => u32::from_be_bytes(raw),
            Endian::Little => u32::from_le_bytes(raw),
        })
    }

    pub fn read_f64(&mut self) -> Result<f64, ReadError> {
        let b = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(match self.endian {
            Endian::Big => f64::from_be_bytes(raw),
            Endian::Little => f64::from_le_bytes(raw),
        })
    }

    /// Read a fixed-width ASCII field, trimming trailing NUL and space padding.
    pub fn read_str(&mut self, n: usize) -> Result<String, ReadError> {
        let bytes = self.take(n)?;
        let text: String = bytes
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { '?' })
            .collect();
        Ok(text.trim_end_matches(['\0', ' ']).to_string())
    }
}
