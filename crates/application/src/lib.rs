//! Ferrous-Resolver application layer: port traits only, no concrete logic.
//!
//! Every trait here is implemented exactly once, in
//! `ferrous-resolver-infrastructure`, and wired together by the CLI crate's
//! DI step. Keeping the traits dependency-free of any concrete transport or
//! storage lets the chain driver and dispatcher be tested against fakes.

pub mod ports;
