// Shared fixtures for unit tests across modules
#[path = "tests/common/fixtures.rs"]
pub mod fixtures;

// End-to-end flow through the real webhook client
#[path = "tests/integration/workflow_test.rs"]
mod workflow_test;
