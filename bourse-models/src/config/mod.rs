// Copyright (c) 2024 BOURSE LABS

/// Hard-coded protocol constants
pub mod constants;
mod settings;

pub use settings::build_bourse_settings;
