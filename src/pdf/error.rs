use ::thiserror::Error;

use crate::object::direct::dictionary::error::DataTypeError;
use crate::object::indirect::id::Id;
use crate::objstm::error::ObjStmErr;
use crate::parse::error::ParseErr;
use crate::process::filter::error::FilterErr;
use crate::source::error::SourceErr;
use crate::table::error::TableErr;
use crate::xref::error::XRefErr;

pub type PdfResult<T> = Result<T, PdfErr>;

/// REFERENCE: [7.5 File structure, p53-69]
#[derive(Debug, Error, PartialEq, Clone)]
pub enum PdfErr {
    /// Malformed tokens or objects.
    #[error("Syntax: {0}")]
    Syntax(#[from] ParseErr),
    /// Missing trailer or broken cross-reference chain.
    #[error("Structure: {0}")]
    Structure(#[from] XRefErr),
    /// Corrupt stream data.
    #[error("Filter: {0}")]
    Filter(#[from] FilterErr),
    #[error("Table: {0}")]
    Table(#[from] TableErr),
    #[error("Object stream: {0}")]
    ObjectStream(#[from] ObjStmErr),
    #[error("Source: {0}")]
    Source(#[from] SourceErr),
    #[error("Data type: {0}")]
    DataType(#[from] DataTypeError),
    #[error("Expected object {0}, found object {1}")]
    MismatchedId(Id, Id),
    #[error("Object {0} is not a {1}")]
    NotA(Id, &'static str),
    #[error("The trailer has no /Root")]
    MissingRoot,
}

impl PdfErr {
    /// Whether the error concerns the structure of the file rather than one
    /// object, so that rebuilding the cross-reference table may help.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structure(_) | Self::MissingRoot)
    }
}

/// An object that could not be loaded, as collected by
/// `Document::load_all`.
#[derive(Debug, Error, PartialEq, Clone)]
#[error("Object {id}: {err}")]
pub struct ObjectErr {
    pub id: Id,
    pub err: PdfErr,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::error::ParseErrorCode;
    use crate::parse::error::ParseFailure;

    #[test]
    fn pdf_err_taxonomy() {
        let err: PdfErr = XRefErr::RebuildNoRoot.into();
        assert!(err.is_structural());
        let err: PdfErr = TableErr::Cycle(3).into();
        assert!(!err.is_structural());
        let err: PdfErr =
            ParseErr::from(ParseFailure::new(4, "Object", ParseErrorCode::UnexpectedEof)).into();
        assert!(!err.is_structural());
        assert_eq!(
            ObjectErr {
                id: Id::new(3, 0),
                err: TableErr::Cycle(3).into(),
            }
            .to_string(),
            "Object 3 0: Table: Object 3 is being resolved: it depends on itself"
        );
    }
}
