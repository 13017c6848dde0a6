pub mod ast;
pub mod lexer;
pub mod modify;
pub mod parser;
pub mod stack;

pub use parser::{parse, ParseError};
