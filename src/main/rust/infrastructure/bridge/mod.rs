mod process_teardown;

pub use process_teardown::ProcessTeardown;
