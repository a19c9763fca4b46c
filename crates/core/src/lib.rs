//! Ruchna Core - Shared domain types and pure logic.
//!
//! This crate provides the types and rules used across all Ruchna components:
//! - `storefront` - Public JSON API (catalog, checkout, payments)
//! - `admin` - Back-office JSON API (products, orders, leads)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps the pricing and status rules testable in
//! isolation and shared verbatim between the storefront and the admin.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, phones, money and statuses
//! - [`discount`] - Canonical discount-percent resolution (incl. legacy UAH field)
//! - [`catalog`] - In-memory catalog filtering, sorting and facets
//! - [`slug`] - URL slug generation with Ukrainian transliteration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod discount;
pub mod slug;
pub mod types;

pub use types::*;
