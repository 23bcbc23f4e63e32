pub mod advice;
pub mod config;
pub mod scanner;
