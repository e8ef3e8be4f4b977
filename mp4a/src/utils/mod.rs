/// Error types for tables, codec configuration, decoding and the pipeline.
pub mod errors;
