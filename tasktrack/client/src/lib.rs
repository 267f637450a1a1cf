//! Client-side data access for the Tasktrack project and task API.
//!
//! The layers build on each other: [`graphql`] talks to the server and caches what
//! it returns, [`preferences`] remembers the selected organization, and
//! [`service::DataService`] turns both into collections a front end can render.
pub mod cli;
pub mod config;
pub mod graphql;
pub mod preferences;
pub mod service;

pub use config::{ClientConfig, Profile};
pub use graphql::{ClientError, HttpTransport, RemoteClient, Transport};
pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use service::{DataService, Limits, Loadable};
