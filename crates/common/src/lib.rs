// extraterm-launcher-common: command line grammar and control API types

pub mod args;
pub mod protocol;
pub mod wordcase;
