//! HTTP Handlers

mod audiobook;
mod character;
mod ping;

pub use audiobook::*;
pub use character::*;
pub use ping::*;
