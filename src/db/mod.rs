//! Code supporting the `db *` sub commands.

pub mod clear;
pub mod init;
