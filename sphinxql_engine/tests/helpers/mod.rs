pub mod env;
pub mod fixtures;

#[allow(unused_imports)]
pub use env::init_test_logger;
#[allow(unused_imports)]
pub use fixtures::{forward_only, mixed_batch, rewindable, select_rows, two_row_select};
