//! mirrorsync - Recreate Gitea push mirrors towards external git hosts
//!
//! mirrorsync walks every organization of a Gitea instance, drops the push
//! mirrors registered on each repository and registers fresh ones pointing at
//! the configured destinations, carrying current credentials.
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`gitea`]: Gitea REST API client
//! - [`filter`]: Repository ignore list
//! - [`discovery`]: Organization / repository / mirror enumeration
//! - [`prompt`]: Per-repository confirmation
//! - [`sync`]: Mirror recreation
//! - [`logging`]: Console output

pub mod config;
pub mod discovery;
pub mod filter;
pub mod gitea;
pub mod logging;
pub mod prompt;
pub mod sync;

pub use config::Config;
pub use discovery::{Discovery, RepoDescriptor};
pub use gitea::{ApiError, GiteaClient};
pub use sync::{RepoOutcome, SyncEngine, SyncOptions, SyncSummary};
