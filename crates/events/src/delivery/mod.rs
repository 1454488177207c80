//! Concrete notification dispatchers.
//!
//! [`local`] presents notifications in-process right away; [`webhook`]
//! forwards them to an external HTTP endpoint.

pub mod local;
pub mod webhook;
