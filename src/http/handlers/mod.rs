//! Request handlers, one module per resource.

pub(crate) mod config;
pub(crate) mod files;
pub(crate) mod projects;
pub(crate) mod sessions;
pub(crate) mod sockets;
pub(crate) mod tasks;
