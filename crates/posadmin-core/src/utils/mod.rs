//! Utility functions for string formatting and client-side search.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{cmp_ignore_case, contains_ignore_case, format_money, format_phone, truncate};
