//! Unit test suite for ckg-providers
//!
//! Run with: `cargo test -p ckg-providers --test unit`

#[path = "unit/parser_tests.rs"]
mod parser;

#[path = "unit/vector_store_tests.rs"]
mod vector_store;

#[path = "unit/graph_store_tests.rs"]
mod graph_store;
