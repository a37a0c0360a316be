//! Workout Music Client Library
//!
//! Client-side recommendation session manager: samples health state, asks
//! the scoring service for music recommendations, tracks playback of those
//! recommendations and feeds user ratings back.

pub mod config;
pub mod error;
pub mod scoring;
pub mod services;
pub mod session;
pub mod state;
