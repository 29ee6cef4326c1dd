/// Reading single cask files.
pub mod cask_file;
pub mod directory;
mod lexer;

pub use cask_file::{CaskFile, LoadError, ParseError};
pub use directory::{Directory, DirectoryLoadError};
pub use lexer::LexError;
