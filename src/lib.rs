//! Formaggio Web - the Formaggio.me content site
//!
//! Server-rendered pages showing newsletters and podcast episodes fetched
//! from the content API, with a footer reporting the live API version.

pub mod api;
pub mod config;
pub mod feed;
pub mod footer;
pub mod lifecycle;
pub mod routes;
