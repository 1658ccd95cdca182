// Copyright (c) 2024 BOURSE LABS

use displaydoc::Display;
use thiserror::Error;

/// Hash error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum BourseHashError {
    /// parsing error: {0}
    ParsingError(String),
}
