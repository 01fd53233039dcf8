//! HTTP surface of `muto-server`.
//!
//! - `GET /`: liveness
//! - `POST /api/v1/process`: run a processing request
//! - `GET /results/{key}`: published objects from the local store

mod errors;
mod handlers;
mod router;

pub use router::{router, serve};
