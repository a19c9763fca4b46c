//! Core types for Ruchna.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod phone;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{CURRENCY, format_amount, to_minor_units, uah};
pub use phone::{Phone, PhoneError};
pub use status::*;
