#[allow(unused_imports)]
pub use opvisor_test_utils::builders::*;
