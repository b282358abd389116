pub(crate) mod array;
pub(crate) mod dictionary;
pub(crate) mod name;
pub(crate) mod numeric;
pub(crate) mod string;
