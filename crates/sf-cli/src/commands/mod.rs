//! CLI command implementations

pub(crate) mod check;
pub(crate) mod common;
pub(crate) mod down;
pub(crate) mod init;
pub(crate) mod lint;
pub(crate) mod new;
pub(crate) mod render;
pub(crate) mod snapshot;
pub(crate) mod status;
pub(crate) mod up;
pub(crate) mod verify;
