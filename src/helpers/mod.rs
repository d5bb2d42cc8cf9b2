//! Helper functions shared by the renderer, the generator and the server

mod html;
mod minify;
mod url;

pub use html::*;
pub use minify::*;
pub use url::*;
