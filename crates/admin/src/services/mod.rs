//! Admin services.
//!
//! - `password` - Argon2 hashing and login verification
//! - `cloudinary` - Signed image uploads

pub mod cloudinary;
pub mod password;
