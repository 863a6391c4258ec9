//! HTTP adapters behind the engine's collaborator traits.

mod common;
pub mod elements;
pub mod eschol;

pub(crate) use common::resolve_credential;
pub use elements::ElementsClient;
pub use eschol::EscholClient;
