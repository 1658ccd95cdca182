// Copyright (c) 2024 BOURSE LABS

//! Structured trace events.
//!
//! `bourse_trace!("evaluation.asset.create", {"symbol": symbol})` emits a
//! `trace`-level event whose message is `bourse_trace:<event>:<json>`, so
//! evaluation steps can be grepped and parsed from node logs.

// re-exported for the macro expansion site
#[doc(hidden)]
pub use serde_json;
#[doc(hidden)]
pub use tracing;

/// Emits a `trace`-level structured event
#[macro_export]
macro_rules! bourse_trace {
    ($evt:expr, $params:tt) => {
        $crate::tracing::trace!(
            "bourse_trace:{}:{}",
            $evt,
            $crate::serde_json::json!($params)
        );
    };
}
