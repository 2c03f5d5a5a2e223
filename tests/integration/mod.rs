//! Integration tests for the modtrain CLI

mod helpers;
mod test_graph;
mod test_release;
mod test_status;
