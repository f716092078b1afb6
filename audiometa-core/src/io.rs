//! The byte-source abstraction every parser in this workspace is written against, plus a
//! buffered wrapper that caches an aligned read window over any `std::io` file-like source.

use crate::errors::Result;

/// The origin a [`ByteSource::seek`] offset is relative to.
#[derive(Debug, Clone, Copy)]
pub enum Whence {
    Start,
    Current,
    End,
}

/// Minimal seek/read/size contract consumed by every format parser in this workspace.
///
/// Implementations must return short reads past end-of-file rather than an error, and must
/// accept negative offsets for `Whence::Current`/`Whence::End`.
pub trait ByteSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64>;

    fn size(&mut self) -> Result<u64>;

    fn name(&self) -> &str;

    /// Reads exactly `buf.len()` bytes, or as many as are available before EOF.
    /// Returns the number of bytes actually read.
    fn read_fully(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            let n = self.read(&mut buf[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }

    /// Seeks, reads, then restores the original position. Used for look-ahead probes (APE
    /// footer, ID3v1 trailer, MPEG twin-header peek) that must not disturb the caller's cursor.
    fn scoped_read_at(&mut self, offset: i64, whence: Whence, buf: &mut [u8]) -> Result<usize> {
        let restore = self.seek(0, Whence::Current)?;
        self.seek(offset, whence)?;
        let n = self.read_fully(buf);
        self.seek(restore as i64, Whence::Start)?;
        n
    }
}

/// Wraps any `std::io::Read + std::io::Seek` in a [`ByteSource`], caching an aligned window of
/// the underlying file so that small sequential reads don't each incur a syscall.
pub struct BufferedSource<R> {
    inner: R,
    name: String,
    window: Vec<u8>,
    window_start: u64,
    window_len: usize,
    pos: u64,
    size: Option<u64>,
}

const WINDOW_SIZE: usize = 8 * 1024;

impl<R: std::io::Read + std::io::Seek> BufferedSource<R> {
    pub fn new(inner: R, name: impl Into<String>) -> Self {
        BufferedSource {
            inner,
            name: name.into(),
            window: vec![0; WINDOW_SIZE],
            window_start: 0,
            window_len: 0,
            pos: 0,
            size: None,
        }
    }

    fn refill(&mut self, aligned_start: u64) -> Result<()> {
        use std::io::SeekFrom;
        self.inner.seek(SeekFrom::Start(aligned_start))?;
        let mut filled = 0;
        loop {
            let n = self.inner.read(&mut self.window[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
            if filled == self.window.len() {
                break;
            }
        }
        self.window_start = aligned_start;
        self.window_len = filled;
        Ok(())
    }
}

impl<R: std::io::Read + std::io::Seek> ByteSource for BufferedSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let window_size = self.window.len() as u64;
        let in_window = self.window_len > 0
            && self.pos >= self.window_start
            && self.pos < self.window_start + self.window_len as u64;

        if !in_window {
            let aligned = (self.pos / window_size) * window_size;
            self.refill(aligned)?;
        }

        let offset_in_window = (self.pos - self.window_start) as usize;
        if offset_in_window >= self.window_len {
            // Past EOF of the window (and thus of the file, since the window fills fully
            // unless it hit EOF).
            return Ok(0);
        }

        let available = self.window_len - offset_in_window;
        let n = buf.len().min(available);
        buf[..n].copy_from_slice(&self.window[offset_in_window..offset_in_window + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let base = match whence {
            Whence::Start => 0i64,
            Whence::Current => self.pos as i64,
            Whence::End => self.size()? as i64,
        };
        let new_pos = base + offset;
        if new_pos < 0 {
            return crate::errors::malformed_error("seek before byte 0");
        }
        self.pos = new_pos as u64;
        Ok(self.pos)
    }

    fn size(&mut self) -> Result<u64> {
        if let Some(size) = self.size {
            return Ok(size);
        }
        use std::io::{Seek, SeekFrom};
        let cur = self.inner.stream_position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(cur))?;
        self.size = Some(end);
        Ok(end)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_across_window_boundary() {
        let data: Vec<u8> = (0..20_000u32).map(|i| (i % 256) as u8).collect();
        let mut src = BufferedSource::new(Cursor::new(data.clone()), "test");
        let mut buf = vec![0u8; data.len()];
        let n = src.read_fully(&mut buf).unwrap();
        assert_eq!(n, data.len());
        assert_eq!(buf, data);
    }

    #[test]
    fn short_read_past_eof_is_not_an_error() {
        let mut src = BufferedSource::new(Cursor::new(vec![1, 2, 3]), "test");
        src.seek(0, Whence::End).unwrap();
        let mut buf = [0u8; 16];
        let n = src.read(&mut buf).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn scoped_read_restores_cursor() {
        let mut src = BufferedSource::new(Cursor::new(vec![0u8, 1, 2, 3, 4, 5, 6, 7]), "test");
        src.seek(3, Whence::Start).unwrap();
        let mut buf = [0u8; 2];
        src.scoped_read_at(0, Whence::Start, &mut buf).unwrap();
        assert_eq!(buf, [0, 1]);
        assert_eq!(src.seek(0, Whence::Current).unwrap(), 3);
    }
}
