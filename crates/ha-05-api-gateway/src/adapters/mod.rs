//! Adapters Layer

pub mod json_codec;

pub use json_codec::JsonCodec;
