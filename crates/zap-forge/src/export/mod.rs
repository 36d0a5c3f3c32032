pub mod document;
pub mod diagnostics;
pub mod builder;
pub mod scanner;
