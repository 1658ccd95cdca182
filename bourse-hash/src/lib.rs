// Copyright (c) 2024 BOURSE LABS

//! 32-byte blake3 digests used to derive addresses and record identifiers.

#![warn(missing_docs)]
pub use error::BourseHashError;
pub use hash::{Hash, HashDeserializer, HashSerializer};
pub use settings::HASH_SIZE_BYTES;

mod error;
mod hash;
mod settings;
