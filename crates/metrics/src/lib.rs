pub mod duties;
pub mod error;
pub mod missed_slots;
pub mod participation;
pub mod report;
pub mod rewards;
pub mod snapshot;
pub mod summary;
pub mod window;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
