#![allow(unused_imports)]

pub use procpipe_test_utils::builders;
pub use procpipe_test_utils::fake_process;
pub use procpipe_test_utils::{init_tracing, sh, wait_until, with_timeout};
