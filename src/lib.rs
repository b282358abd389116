mod config;
mod convert;
mod fmt;
mod header;
mod object;
mod objstm;
mod parse;
mod pdf;
mod process;
mod source;
mod table;
mod xref;

pub use self::config::ParseOptions;
pub use self::config::Strictness;
pub use self::config::WriteMode;
pub use self::config::WriteOptions;
pub use self::config::XRefFormat;
pub use self::header::Version;
pub use self::object::direct::array::Array;
pub use self::object::direct::dictionary::error::DataTypeError;
pub use self::object::direct::dictionary::Dictionary;
pub use self::object::direct::name::Name;
pub use self::object::direct::numeric::Numeric;
pub use self::object::direct::string::StringFormat;
pub use self::object::direct::string::String_;
pub use self::object::indirect::id::Id;
pub use self::object::indirect::object::IndirectObject;
pub use self::object::indirect::reference::Reference;
pub use self::object::indirect::stream::Stream;
pub use self::object::indirect::stream::StreamData;
pub use self::object::Object;
pub use self::objstm::error::ObjStmErr;
pub use self::objstm::ObjectStream;
pub use self::objstm::ObjectStreamBuilder;
pub use self::parse::error::ParseErr;
pub use self::parse::error::ParseErrorCode;
pub use self::pdf::error::ObjectErr;
pub use self::pdf::error::PdfErr;
pub use self::pdf::error::PdfResult;
pub use self::pdf::writer::ByteRange;
pub use self::pdf::writer::SignatureHook;
pub use self::pdf::writer::SignaturePlaceholder;
pub use self::pdf::writer::WriteReport;
pub use self::pdf::writer::WriteWarning;
pub use self::pdf::Document;
pub use self::process::filter::error::FilterErr;
pub use self::process::filter::error::FilterErrorCode;
pub use self::process::filter::registry::Codec;
pub use self::process::filter::registry::CodecError;
pub use self::process::filter::registry::FilterRegistry;
pub use self::process::filter::FilterPipeline;
pub use self::source::error::SourceErr;
pub use self::source::ByteSource;
pub use self::source::FileSource;
pub use self::source::MemorySource;
pub use self::source::WindowSource;
pub use self::table::error::TableErr;
pub use self::table::EntryState;
pub use self::table::Location;
pub use self::xref::error::XRefErr;
pub use self::xref::trailer::Trailer;
pub use self::xref::XRefEntry;
pub use self::xref::XRefTable;

// Limit the size of the decoded stream to 1 GiB.
const DECODED_LIMIT: usize = 1 << 30;
const MAX_DEBUG_BYTES: usize = 100;

/// [7.5.4 Cross-reference table, p56] restricts byte offsets to 10 digits,
/// allowing for ~9.3 GiB files. Offsets index buffers, hence `usize`.
pub type Offset = usize;
/// REFERENCE: [3.33 indirect object, p10]
/// Object numbers are positive integers. 0 only names the head of the free
/// list in a cross-reference table.
pub type ObjectNumber = u32;
/// REFERENCE:
/// - [3.33 indirect object, p10]
/// - [7.5.4 Cross-reference table, p56-57]
/// Generation numbers are restricted to 5 digits with a maximum of 65,535.
pub type GenerationNumber = u16;
/// Position of an object within an object stream.
pub type IndexNumber = u32;
/// REFERENCE: [4.7 byte, p7]
pub type Byte = u8;

#[cfg(test)]
mod tests {
    #[macro_export]
    macro_rules! assert_err_eq {
        ($parse_result:expr, $expected_error:expr) => {
            assert_eq!($parse_result, Err($expected_error.into()));
        };
    }
}
