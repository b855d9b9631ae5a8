//! # tvplayer-rs
//!
//! This crate resolves [TVPlayer](https://tvplayer.com) watch pages into
//! playable HLS variants. It logs in when credentials are given, works
//! around the postcode prompt, and walks the two JSON APIs that turn the
//! page's embedded resource id into a manifest URL. DRM protected channels
//! are reported, not played.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tvplayer_rs::{
//!     auth::Credentials,
//!     resolver::{Resolution, ResolutionRequest, Resolver},
//!     util::ClientConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     // One resolver per flow: it owns the HTTP session and its cookies
//!     let resolver = Resolver::with_config(&ClientConfig::default()).unwrap();
//!
//!     let request = ResolutionRequest::parse("https://tvplayer.com/watch/bbcone")
//!         .unwrap()
//!         .with_credentials(Credentials::new("me@example.com", "secret"));
//!
//!     match resolver.resolve(&request).await {
//!         Ok(Resolution::Resolved { variants, .. }) => {
//!             for v in variants {
//!                 println!("{}: {}", v.name, v.url);
//!             }
//!         }
//!         Ok(Resolution::Unresolved(reason)) => println!("Cannot play: {}", reason),
//!         Err(e) => println!("Failed: {}", e),
//!     }
//! }
//! ```
//!
//! The lower-level modules (`page`, `context`, `stream_data`) can be used on
//! their own with any [`util::Transport`].

#![forbid(unsafe_code)]
#[macro_use]
extern crate log;

pub mod auth;
pub mod context;
pub mod hls;
pub mod matcher;
pub mod page;
pub mod resolver;
pub mod schema;
pub mod stream_data;
pub mod util;

#[cfg(test)]
mod testing;
