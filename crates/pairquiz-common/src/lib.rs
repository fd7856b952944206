//! Shared protocol and game logic for the pairquiz server.
//!
//! The wire protocol ([`protocol`]) and the pure round state machine
//! ([`game`]) live here so they can be exercised without a running server.

pub mod decoy;
pub mod game;
pub mod player;
pub mod protocol;
pub mod question;
pub mod scoring;
