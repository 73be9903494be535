//! Implementation steps of evidence record validation

pub(crate) mod links;
pub(crate) mod matching;
pub(crate) mod tokens;
