pub mod board;
pub mod cli;
pub mod console;
pub mod handler;
