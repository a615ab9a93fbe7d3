//! Spotify Web API integration
//!
//! API: https://developer.spotify.com/documentation/web-api

pub mod adapter;
pub mod client;
pub mod dto;

pub use client::SpotifyClient;
