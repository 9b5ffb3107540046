// src/lib.rs

//! listing-watch library
//!
//! Polls listing pages, tracks the last known item count per page and sends
//! one notification per observed change.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
