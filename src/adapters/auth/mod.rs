//! Authentication adapters.
//!
//! - `StaticTokenProvider` - Fixed bearer token for backend calls

mod static_token;

pub use static_token::StaticTokenProvider;
