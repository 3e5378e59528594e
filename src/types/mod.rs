//! Type definitions module.
//!
//! Contains shared types used across the application.

pub mod pool;
pub mod swap;
pub mod toast;
pub mod token;

pub use pool::*;
pub use swap::*;
pub use toast::*;
pub use token::*;
