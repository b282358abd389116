use ::bytes::Bytes;
use ::std::fmt::Debug;
use ::std::fs::File;
use ::std::io::ErrorKind;
use ::std::io::Read;
use ::std::io::Seek;
use ::std::io::SeekFrom;
use ::std::path::Path;
use ::std::path::PathBuf;
use ::std::sync::Arc;
use ::std::sync::Mutex;

use self::error::SourceErr;
use self::error::SourceResult;
use crate::parse::error::ParseResult;
use crate::Byte;
use crate::Offset;

/// Size of the first window read when the extent of an object is unknown.
const INITIAL_WINDOW: usize = 1 << 12;
const WINDOW_GROWTH: usize = 8;

/// Random access to the bytes of a PDF file.
///
/// Reads past the end are truncated and a read starting past the end
/// returns an empty buffer.
pub trait ByteSource: Debug + Send + Sync {
    fn read_at(&self, offset: Offset, len: usize) -> SourceResult<Bytes>;

    fn len(&self) -> Offset;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_all(&self) -> SourceResult<Bytes> {
        self.read_at(0, self.len())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySource(Bytes);

impl ByteSource for MemorySource {
    fn read_at(&self, offset: Offset, len: usize) -> SourceResult<Bytes> {
        let start = offset.min(self.0.len());
        let end = start.saturating_add(len).min(self.0.len());
        Ok(self.0.slice(start..end))
    }

    fn len(&self) -> Offset {
        self.0.len()
    }
}

/// A file read through seek and read calls on a locked handle.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    file: Mutex<File>,
    len: Offset,
}

impl ByteSource for FileSource {
    fn read_at(&self, offset: Offset, len: usize) -> SourceResult<Bytes> {
        if offset >= self.len {
            return Ok(Bytes::new());
        }
        let len = len.min(self.len - offset);
        let mut file = self.file.lock().map_err(|_| SourceErr::Poisoned)?;
        file.seek(SeekFrom::Start(offset as u64))
            .map_err(|err| SourceErr::Seek(offset, err.kind()))?;
        let mut buffer = Vec::with_capacity(len);
        (&mut *file)
            .take(len as u64)
            .read_to_end(&mut buffer)
            .map_err(|err| SourceErr::Read(offset, err.kind()))?;
        Ok(Bytes::from(buffer))
    }

    fn len(&self) -> Offset {
        self.len
    }
}

/// A bounded view over another source, e.g. one part of a partially
/// downloaded or linearised file.
#[derive(Debug, Clone)]
pub struct WindowSource {
    inner: Arc<dyn ByteSource>,
    start: Offset,
    len: Offset,
}

impl ByteSource for WindowSource {
    fn read_at(&self, offset: Offset, len: usize) -> SourceResult<Bytes> {
        if offset >= self.len {
            return Ok(Bytes::new());
        }
        let len = len.min(self.len - offset);
        self.inner.read_at(self.start + offset, len)
    }

    fn len(&self) -> Offset {
        self.len
    }
}

/// The bytes of a previous revision followed by the bytes appended by a
/// save.
#[derive(Debug, Clone)]
pub(crate) struct AppendedSource {
    head: Arc<dyn ByteSource>,
    tail: Bytes,
}

impl ByteSource for AppendedSource {
    fn read_at(&self, offset: Offset, len: usize) -> SourceResult<Bytes> {
        let head_len = self.head.len();
        let end = offset.saturating_add(len).min(self.len());
        if offset >= end {
            return Ok(Bytes::new());
        }
        if end <= head_len {
            return self.head.read_at(offset, len);
        }
        if offset >= head_len {
            return Ok(self.tail.slice(offset - head_len..end - head_len));
        }
        let mut buffer = Vec::with_capacity(end - offset);
        buffer.extend_from_slice(&self.head.read_at(offset, head_len - offset)?);
        buffer.extend_from_slice(&self.tail[..end - head_len]);
        Ok(Bytes::from(buffer))
    }

    fn len(&self) -> Offset {
        self.head.len() + self.tail.len()
    }
}

/// Parse an object of unknown extent starting at `offset`.
///
/// The parser is handed a window of the source together with a flag telling
/// whether the window reaches the end of the source. Whenever it reports
/// running out of input before that point, the window grows and the parse is
/// retried. Offsets in the returned error are absolute.
pub(crate) fn read_growing<T>(
    source: &dyn ByteSource,
    offset: Offset,
    mut parse: impl FnMut(&[Byte], bool) -> ParseResult<T>,
) -> SourceResult<ParseResult<T>> {
    let available = source.len().saturating_sub(offset);
    let mut window = INITIAL_WINDOW.min(available);
    loop {
        let bytes = source.read_at(offset, window)?;
        let complete = window >= available;
        match parse(&bytes, complete) {
            Err(err) if err.is_truncated() && !complete => {
                window = window.saturating_mul(WINDOW_GROWTH).min(available);
            }
            result => return Ok(result.map_err(|err| err.shift(offset))),
        }
    }
}

mod convert {
    use super::*;

    impl MemorySource {
        pub fn new(bytes: impl Into<Bytes>) -> Self {
            Self(bytes.into())
        }
    }

    impl From<Vec<Byte>> for MemorySource {
        fn from(bytes: Vec<Byte>) -> Self {
            Self::new(bytes)
        }
    }

    impl From<&'static [Byte]> for MemorySource {
        fn from(bytes: &'static [Byte]) -> Self {
            Self::new(Bytes::from_static(bytes))
        }
    }

    impl FileSource {
        pub fn open(path: impl AsRef<Path>) -> SourceResult<Self> {
            let path = path.as_ref();
            let file = File::open(path).map_err(|err| SourceErr::Open(path.into(), err.kind()))?;
            let len = file
                .metadata()
                .map_err(|err| SourceErr::Open(path.into(), err.kind()))?
                .len();
            let len = Offset::try_from(len)
                .map_err(|_| SourceErr::Open(path.into(), ErrorKind::InvalidData))?;
            Ok(Self {
                path: path.into(),
                file: Mutex::new(file),
                len,
            })
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl WindowSource {
        pub fn new(inner: Arc<dyn ByteSource>, start: Offset, len: Offset) -> Self {
            let start = start.min(inner.len());
            let len = len.min(inner.len() - start);
            Self { inner, start, len }
        }
    }

    impl AppendedSource {
        pub(crate) fn new(head: Arc<dyn ByteSource>, tail: impl Into<Bytes>) -> Self {
            Self {
                head,
                tail: tail.into(),
            }
        }
    }
}

pub(crate) mod error {
    use ::std::io::ErrorKind;
    use ::std::path::PathBuf;
    use ::thiserror::Error;

    use crate::Offset;

    pub type SourceResult<T> = Result<T, SourceErr>;

    // ::std::io::Error does not implement PartialEq or Clone, and
    // ::std::io::ErrorKind is enough to report the failure
    #[derive(Debug, Error, PartialEq, Clone)]
    pub enum SourceErr {
        #[error("Open. File: {}. Error kind: {1}", .0.display())]
        Open(PathBuf, ErrorKind),
        #[error("Seek. Offset: {0}. Error kind: {1}")]
        Seek(Offset, ErrorKind),
        #[error("Read. Offset: {0}. Error kind: {1}")]
        Read(Offset, ErrorKind),
        #[error("Write. Error kind: {0}")]
        Write(ErrorKind),
        #[error("The lock guarding the file handle is poisoned")]
        Poisoned,
    }
}

#[cfg(test)]
mod tests {
    use ::std::io::Write;

    use super::*;
    use crate::parse::error::ParseErrorCode;
    use crate::parse::error::ParseFailure;

    #[test]
    fn memory_source_read_at() {
        let source = MemorySource::from(b"0123456789".as_slice());
        assert_eq!(source.len(), 10);
        assert_eq!(source.read_at(2, 3).unwrap().as_ref(), b"234");
        // Truncated
        assert_eq!(source.read_at(8, 10).unwrap().as_ref(), b"89");
        // Past the end
        assert!(source.read_at(42, 1).unwrap().is_empty());
    }

    #[test]
    fn file_source_read_at() {
        let mut file = ::tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.7\nbody").unwrap();
        file.flush().unwrap();

        let source = FileSource::open(file.path()).unwrap();
        assert_eq!(source.len(), 13);
        assert_eq!(source.read_at(0, 8).unwrap().as_ref(), b"%PDF-1.7");
        assert_eq!(source.read_at(9, 100).unwrap().as_ref(), b"body");
        assert!(source.read_at(13, 1).unwrap().is_empty());
    }

    #[test]
    fn file_source_missing() {
        let dir = ::tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.pdf");
        assert_eq!(
            FileSource::open(&path).unwrap_err(),
            SourceErr::Open(path, ErrorKind::NotFound)
        );
    }

    #[test]
    fn window_source_read_at() {
        let inner: Arc<dyn ByteSource> = Arc::new(MemorySource::from(b"0123456789".as_slice()));
        let window = WindowSource::new(inner, 3, 4);
        assert_eq!(window.len(), 4);
        assert_eq!(window.read_all().unwrap().as_ref(), b"3456");
        assert_eq!(window.read_at(2, 10).unwrap().as_ref(), b"56");
        assert!(window.read_at(4, 1).unwrap().is_empty());
    }

    #[test]
    fn appended_source_read_at() {
        let head: Arc<dyn ByteSource> = Arc::new(MemorySource::from(b"01234".as_slice()));
        let source = AppendedSource::new(head, b"56789".as_slice());
        assert_eq!(source.len(), 10);
        assert_eq!(source.read_at(1, 2).unwrap().as_ref(), b"12");
        assert_eq!(source.read_at(3, 4).unwrap().as_ref(), b"3456");
        assert_eq!(source.read_at(7, 10).unwrap().as_ref(), b"789");
    }

    #[test]
    fn read_growing_retries_until_complete() {
        let mut data = vec![b' '; INITIAL_WINDOW * 3];
        data.push(b'!');
        let source = MemorySource::from(data);
        let mut attempts = 0;
        let result = read_growing(&source, 0, |bytes, _| {
            attempts += 1;
            match bytes.iter().position(|&byte| byte == b'!') {
                Some(position) => Ok(position),
                None => Err(ParseFailure::new(
                    bytes.len(),
                    "Marker",
                    ParseErrorCode::UnexpectedEof,
                )
                .into()),
            }
        })
        .unwrap();
        assert_eq!(result, Ok(INITIAL_WINDOW * 3));
        assert_eq!(attempts, 2);
    }
}
