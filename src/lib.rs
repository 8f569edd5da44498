//! # flapper-news
//!
//! Client for the Flapper News link-sharing forum: list posts, create posts,
//! comment, vote, and register/log in with a bearer token.
//!
//! The crate is split the way a browser client would be: `net` speaks the
//! HTTP contract, `state` holds the token slot and the services, `router`
//! gates views behind their data pre-loads, and `pages` are the view
//! controllers. The `flapper` binary is a text front-end over these.

pub mod config;
pub mod error;
pub mod net;
pub mod pages;
pub mod router;
pub mod state;
