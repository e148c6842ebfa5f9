mod extract_impl;
pub mod extract_thread;
pub mod progress;

pub use extract_impl::cmd_extract;
