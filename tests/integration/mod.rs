//! Integration tests for plugin-release

mod helpers;
mod test_release;
