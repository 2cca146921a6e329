pub mod extractor;
pub mod processing;
pub mod scratch;
