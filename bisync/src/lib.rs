//! Decision core of a two-way file synchronization library.
//!
//! Given a local tree and a remote tree, each exposed through a
//! "list children of a path" capability, the [`Provider`] walks both
//! trees depth-first and emits the stream of [`Decision`]s that would
//! bring them into agreement. The engine only decides; moving bytes,
//! computing etags and persisting state belong to the host.

pub mod compare;
mod decision;
mod error;
pub mod path;
mod provider;
mod storage;

pub use decision::{Decision, DecisionFlag, DecisionSink, Why};
pub use error::{Error, Result};
pub use provider::{Options, Provider};
pub use storage::{Commit, LocalEntry, LocalTree, RemoteEntry, RemoteTree};
