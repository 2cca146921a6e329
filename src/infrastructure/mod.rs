pub mod extractor;
pub mod scratch;
