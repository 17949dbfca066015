//! A small interactive shell built around a fork/exec process engine:
//! pipelines, `<`/`>`/`>>` redirections and background jobs reaped on
//! SIGCHLD.

pub mod builtin;
pub mod error;
pub mod eval;
pub mod job;
pub mod parser;
pub mod pipe;
pub mod reaper;
pub mod redirect;
pub mod shell;
pub mod types;
