//! Demo fixture tests
//!
//! Seeds the demo collections and checks the orderings they are meant to
//! demonstrate.

mod seed;
