// Copyright (c) 2024 BOURSE LABS

/// Hash size
pub const HASH_SIZE_BYTES: usize = 32;
