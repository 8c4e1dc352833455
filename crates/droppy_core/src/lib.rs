//! Droppy Core - compression backend for Droppy
//!
//! This crate contains the target-size image and video compression logic
//! with zero UI dependencies. It can be used by the menu-bar app or a CLI tool.

pub mod compress;
pub mod config;
pub mod jobs;
pub mod logging;
pub mod models;

#[cfg(test)]
mod test_support;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
