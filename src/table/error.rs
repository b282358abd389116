use ::thiserror::Error;

use crate::ObjectNumber;

pub type TableResult<T> = Result<T, TableErr>;

#[derive(Debug, Error, PartialEq, Clone, Copy)]
pub enum TableErr {
    #[error("Object {0} is not in the table")]
    NotFound(ObjectNumber),
    #[error("Object {0} is free")]
    Free(ObjectNumber),
    #[error("Object 0 is reserved for the head of the free list")]
    ObjectZero,
    #[error("Object {0} is being resolved: it depends on itself")]
    Cycle(ObjectNumber),
    #[error("Object {0} has unsaved changes and cannot be evicted")]
    Unsaved(ObjectNumber),
    #[error("No object number left to allocate")]
    Exhausted,
}
