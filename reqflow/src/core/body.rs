//! Request and response body handles.
//!
//! A [`Body`] is a shared reference to a byte stream. The request that holds
//! it never closes or drains it implicitly. A [`WireBody`] is the per-attempt
//! wrapper handed to the transport: it reads through to the body until
//! closed, after which every read reports end-of-stream.

use bytes::Bytes;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::Arc;
use thiserror::Error;

/// A byte stream with random access.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

enum Stream {
    Seekable(Box<dyn ReadSeek>),
    Sequential {
        reader: Box<dyn Read + Send>,
        remaining: Option<u64>,
    },
}

impl Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Seekable(r) => r.read(buf),
            Self::Sequential { reader, remaining } => {
                let n = reader.read(buf)?;
                if let Some(left) = remaining {
                    *left = left.saturating_sub(n as u64);
                }
                Ok(n)
            }
        }
    }
}

/// A shared handle to a request body stream.
///
/// Clones share the same underlying stream and cursor. Reads are serialized
/// through an internal lock, so a handle may be read from several places
/// without tearing.
#[derive(Clone, Default)]
pub struct Body {
    stream: Option<Arc<Mutex<Stream>>>,
}

impl Body {
    /// Creates an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a seekable body over in-memory bytes.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::from_seekable(Cursor::new(bytes.into()))
    }

    /// Creates a body over a stream with random access.
    pub fn from_seekable<R>(reader: R) -> Self
    where
        R: Read + Seek + Send + 'static,
    {
        Self::wrap(Stream::Seekable(Box::new(reader)))
    }

    /// Creates a body over a forward-only stream.
    ///
    /// Such a body cannot be rewound, so a retried request carrying it fails
    /// before its second attempt.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self::wrap(Stream::Sequential {
            reader: Box::new(reader),
            remaining: None,
        })
    }

    /// Creates a forward-only body whose unread length is known up front.
    pub fn from_reader_sized<R>(reader: R, len: u64) -> Self
    where
        R: Read + Send + 'static,
    {
        Self::wrap(Stream::Sequential {
            reader: Box::new(reader),
            remaining: Some(len),
        })
    }

    fn wrap(stream: Stream) -> Self {
        Self {
            stream: Some(Arc::new(Mutex::new(stream))),
        }
    }

    /// Returns true if this is the empty body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stream.is_none()
    }

    /// Returns true if the stream supports random access.
    #[must_use]
    pub fn is_seekable(&self) -> bool {
        self.stream
            .as_ref()
            .is_some_and(|s| matches!(*s.lock(), Stream::Seekable(_)))
    }

    /// Returns true if both handles refer to the same stream.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.stream, &other.stream) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Returns the current offset of a seekable stream.
    pub fn stream_position(&self) -> io::Result<u64> {
        self.seek_to(SeekFrom::Current(0))
    }

    /// Returns the number of unread bytes, if it can be determined.
    ///
    /// Seekable streams are measured by seeking to the end and back, leaving
    /// the cursor where it was.
    pub fn remaining_len(&self) -> io::Result<Option<u64>> {
        let Some(stream) = &self.stream else {
            return Ok(Some(0));
        };
        let mut guard = stream.lock();
        match &mut *guard {
            Stream::Seekable(r) => {
                let start = r.stream_position()?;
                let end = r.seek(SeekFrom::End(0))?;
                r.seek(SeekFrom::Start(start))?;
                Ok(Some(end.saturating_sub(start)))
            }
            Stream::Sequential { remaining, .. } => Ok(*remaining),
        }
    }

    /// Reads the rest of the stream into memory.
    pub fn read_to_bytes(&self) -> io::Result<Bytes> {
        let mut buf = Vec::new();
        let mut handle = self.clone();
        handle.read_to_end(&mut buf)?;
        Ok(Bytes::from(buf))
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &self.stream {
            Some(stream) => stream.lock().read(buf),
            None => Ok(0),
        }
    }
}

impl Seek for Body {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seek_to(pos)
    }
}

impl Body {
    /// Seeks a seekable stream; forward-only streams report `Unsupported`.
    pub fn seek_to(&self, pos: SeekFrom) -> io::Result<u64> {
        let Some(stream) = &self.stream else {
            return Ok(0);
        };
        match &mut *stream.lock() {
            Stream::Seekable(r) => r.seek(pos),
            Stream::Sequential { .. } => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "body is not seekable",
            )),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.stream {
            None => "empty",
            Some(s) => match *s.lock() {
                Stream::Seekable(_) => "seekable",
                Stream::Sequential { .. } => "sequential",
            },
        };
        f.debug_struct("Body").field("kind", &kind).finish()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Self::from_bytes(Bytes::from_static(s.as_bytes()))
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::from_bytes(s.into_bytes())
    }
}

/// A body handed to the transport for one attempt.
///
/// Clones share the same slot: closing one closes all. The body closes
/// itself when it reaches end-of-stream, and the pipeline closes it when the
/// attempt that owns it returns. Once closed, reads yield end-of-stream, so a
/// stale handle from an earlier attempt can never drain a stream that has
/// since been rewound for the next one.
#[derive(Clone)]
pub struct WireBody {
    slot: Arc<Mutex<Option<Body>>>,
}

impl WireBody {
    /// Wraps a body for one attempt.
    #[must_use]
    pub fn new(body: Body) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(body))),
        }
    }

    /// Creates a wire body over in-memory bytes.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::new(Body::from_bytes(bytes))
    }

    /// Creates an already-closed wire body.
    #[must_use]
    pub fn closed() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Detaches the body. Later reads yield end-of-stream.
    pub fn close(&self) {
        self.slot.lock().take();
    }

    /// Returns true once the body has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.slot.lock().is_none()
    }

    /// Reads everything left and closes the body.
    pub fn read_all(&self) -> io::Result<Bytes> {
        let mut buf = Vec::new();
        let mut handle = self.clone();
        handle.read_to_end(&mut buf)?;
        self.close();
        Ok(Bytes::from(buf))
    }
}

impl Read for WireBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut slot = self.slot.lock();
        let Some(body) = slot.as_mut() else {
            return Ok(0);
        };
        let n = body.read(buf)?;
        if n == 0 && !buf.is_empty() {
            slot.take();
        }
        Ok(n)
    }
}

impl fmt::Debug for WireBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireBody")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Errors raised when restoring a body to its rewind point.
#[derive(Debug, Error)]
pub enum RewindError {
    /// The body does not support random access.
    #[error("request body cannot be rewound")]
    NotSeekable,

    /// Seeking the underlying stream failed.
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Remembers a seekable body's offset and restores it on demand.
///
/// After [`RewindReader::rewind`] succeeds, reading the body reproduces
/// exactly the bytes that were readable when the reader was created.
#[derive(Debug, Clone)]
pub struct RewindReader {
    body: Body,
    start: u64,
}

impl RewindReader {
    /// Captures the current offset of `body`.
    pub fn new(body: &Body) -> Result<Self, RewindError> {
        if !body.is_seekable() {
            return Err(RewindError::NotSeekable);
        }
        let start = body.stream_position()?;
        Ok(Self {
            body: body.clone(),
            start,
        })
    }

    /// Returns the captured offset.
    #[must_use]
    pub fn start_position(&self) -> u64 {
        self.start
    }

    /// Seeks the body back to the captured offset.
    pub fn rewind(&self) -> Result<(), RewindError> {
        self.body.seek_to(SeekFrom::Start(self.start))?;
        Ok(())
    }
}

impl Read for RewindReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.body.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_n(body: &Body, n: usize) -> Vec<u8> {
        let mut buf = vec![0u8; n];
        let mut handle = body.clone();
        let read = handle.read(&mut buf).unwrap();
        buf.truncate(read);
        buf
    }

    #[test]
    fn test_empty_body_reads_nothing() {
        let body = Body::empty();
        assert!(body.is_empty());
        assert!(!body.is_seekable());
        assert_eq!(body.read_to_bytes().unwrap().len(), 0);
        assert_eq!(body.remaining_len().unwrap(), Some(0));
    }

    #[test]
    fn test_clones_share_cursor() {
        let body = Body::from_bytes("hello world");
        let other = body.clone();

        assert_eq!(read_n(&body, 6), b"hello ");
        assert_eq!(other.read_to_bytes().unwrap(), Bytes::from_static(b"world"));
        assert!(body.ptr_eq(&other));
    }

    #[test]
    fn test_remaining_len_keeps_cursor() {
        let body = Body::from_bytes("0123456789");
        read_n(&body, 4);

        assert_eq!(body.remaining_len().unwrap(), Some(6));
        assert_eq!(body.stream_position().unwrap(), 4);
    }

    #[test]
    fn test_sequential_body_tracks_remaining() {
        let body = Body::from_reader_sized(Cursor::new(b"abcdef".to_vec()), 6);
        read_n(&body, 2);

        assert!(!body.is_seekable());
        assert_eq!(body.remaining_len().unwrap(), Some(4));
        assert!(body.stream_position().is_err());
    }

    #[test]
    fn test_rewind_restores_bytes_after_any_read_count() {
        let content = b"the quick brown fox jumps over the lazy dog";
        for consumed in [0usize, 1, 7, 20, content.len(), content.len() + 5] {
            let body = Body::from_bytes(&content[..]);
            read_n(&body, 4);
            let expected = content[4..].to_vec();

            let rewind = RewindReader::new(&body).unwrap();
            read_n(&body, consumed);
            rewind.rewind().unwrap();

            assert_eq!(body.read_to_bytes().unwrap().to_vec(), expected);
        }
    }

    #[test]
    fn test_rewind_reader_rejects_sequential_body() {
        let body = Body::from_reader(Cursor::new(b"abc".to_vec()));
        let err = RewindReader::new(&body).unwrap_err();
        assert!(matches!(err, RewindError::NotSeekable));
        assert_eq!(err.to_string(), "request body cannot be rewound");
    }

    #[test]
    fn test_wire_body_inert_after_close() {
        let body = Body::from_bytes("payload");
        let wire = WireBody::new(body.clone());
        let mut stale = wire.clone();

        wire.close();
        let mut buf = [0u8; 8];
        assert_eq!(stale.read(&mut buf).unwrap(), 0);
        assert!(wire.is_closed());

        // the shared body was never drained
        assert_eq!(body.read_to_bytes().unwrap(), Bytes::from_static(b"payload"));
    }

    #[test]
    fn test_drained_wire_body_stays_inert_after_rewind() {
        let body = Body::from_bytes("payload");
        let rewind = RewindReader::new(&body).unwrap();
        let wire = WireBody::new(body.clone());

        let mut handle = wire.clone();
        let mut sink = Vec::new();
        handle.read_to_end(&mut sink).unwrap();
        rewind.rewind().unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(handle.read(&mut buf).unwrap(), 0);
        assert_eq!(body.read_to_bytes().unwrap(), Bytes::from_static(b"payload"));
    }

    #[test]
    fn test_wire_body_read_all_closes() {
        let wire = WireBody::from_bytes("abc");
        assert_eq!(wire.read_all().unwrap(), Bytes::from_static(b"abc"));
        assert!(wire.is_closed());
    }
}
