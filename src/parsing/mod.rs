pub mod commands;
pub mod lexer;
