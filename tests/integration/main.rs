//! Integration test driver for `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises a subsystem against mock
//! adapters (or a real loopback socket). All tests run on the host with no
//! hardware required.

mod command_flow_tests;
mod mocks;
mod server_socket_tests;
