use crate::process::filter::flate::DEFAULT_LEVEL;
use crate::DECODED_LIMIT;

/// How malformed input is treated by the tokenizer, the object parser and
/// the filter pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Any syntax error fails the parse.
    Strict,
    /// Syntax errors are substituted or skipped with a warning.
    #[default]
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    strictness: Strictness,
    /// Value substituted for a malformed numeric token in lenient mode.
    fallback_integer: i64,
    decoded_limit: usize,
    rebuild: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strictness: Strictness::default(),
            fallback_integer: 0,
            decoded_limit: DECODED_LIMIT,
            rebuild: true,
        }
    }
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self::default().set_strictness(Strictness::Strict)
    }

    pub fn lenient() -> Self {
        Self::default()
    }

    pub fn set_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn set_fallback_integer(mut self, fallback_integer: i64) -> Self {
        self.fallback_integer = fallback_integer;
        self
    }

    pub fn set_decoded_limit(mut self, decoded_limit: usize) -> Self {
        self.decoded_limit = decoded_limit;
        self
    }

    /// Whether a broken cross-reference chain is recovered by scanning the
    /// whole file for objects.
    pub fn set_rebuild(mut self, rebuild: bool) -> Self {
        self.rebuild = rebuild;
        self
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    pub fn is_strict(&self) -> bool {
        self.strictness == Strictness::Strict
    }

    pub fn fallback_integer(&self) -> i64 {
        self.fallback_integer
    }

    pub fn decoded_limit(&self) -> usize {
        self.decoded_limit
    }

    pub fn rebuild(&self) -> bool {
        self.rebuild
    }
}

/// REFERENCE: [7.5.6 Incremental updates, p60]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Every live object is written to a new file starting at offset 0.
    #[default]
    Full,
    /// Only modified, new and freed objects are appended after the bytes of
    /// the previous revision.
    Incremental,
}

/// REFERENCE: [7.5.4 Cross-reference table, p56] and [7.5.8
/// Cross-reference streams, p65]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XRefFormat {
    #[default]
    Table,
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    mode: WriteMode,
    xref_format: XRefFormat,
    object_streams: bool,
    max_objects_per_stream: usize,
    compression: u32,
    low_memory: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            mode: WriteMode::default(),
            xref_format: XRefFormat::default(),
            object_streams: false,
            max_objects_per_stream: 100,
            compression: DEFAULT_LEVEL,
            low_memory: false,
        }
    }
}

impl WriteOptions {
    pub fn full() -> Self {
        Self::default()
    }

    pub fn incremental() -> Self {
        Self::default().set_mode(WriteMode::Incremental)
    }

    pub fn set_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn set_xref_format(mut self, xref_format: XRefFormat) -> Self {
        self.xref_format = xref_format;
        self
    }

    /// Packing objects into object streams requires a cross-reference
    /// stream, so enabling it also selects `XRefFormat::Stream`.
    pub fn set_object_streams(mut self, object_streams: bool) -> Self {
        self.object_streams = object_streams;
        if object_streams {
            self.xref_format = XRefFormat::Stream;
        }
        self
    }

    pub fn set_max_objects_per_stream(mut self, max_objects_per_stream: usize) -> Self {
        self.max_objects_per_stream = max_objects_per_stream.max(1);
        self
    }

    /// Flate compression level, clamped to 0..=9.
    pub fn set_compression(mut self, compression: u32) -> Self {
        self.compression = compression.min(9);
        self
    }

    /// Evict objects from memory once written, when they can be re-read.
    pub fn set_low_memory(mut self, low_memory: bool) -> Self {
        self.low_memory = low_memory;
        self
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    pub fn xref_format(&self) -> XRefFormat {
        self.xref_format
    }

    pub fn object_streams(&self) -> bool {
        self.object_streams
    }

    pub fn max_objects_per_stream(&self) -> usize {
        self.max_objects_per_stream
    }

    pub fn compression(&self) -> u32 {
        self.compression
    }

    pub fn low_memory(&self) -> bool {
        self.low_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_options_builder() {
        let options = ParseOptions::strict()
            .set_fallback_integer(-1)
            .set_rebuild(false);
        assert!(options.is_strict());
        assert_eq!(options.fallback_integer(), -1);
        assert!(!options.rebuild());
        assert_eq!(options.decoded_limit(), DECODED_LIMIT);
        assert_eq!(ParseOptions::default().strictness(), Strictness::Lenient);
    }

    #[test]
    fn write_options_builder() {
        let options = WriteOptions::incremental()
            .set_object_streams(true)
            .set_max_objects_per_stream(0)
            .set_compression(42);
        assert_eq!(options.mode(), WriteMode::Incremental);
        assert_eq!(options.xref_format(), XRefFormat::Stream);
        assert_eq!(options.max_objects_per_stream(), 1);
        assert_eq!(options.compression(), 9);
    }
}
