//! Ports Layer

pub mod codec;

pub use codec::ExchangeCodec;
