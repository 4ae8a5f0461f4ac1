//! sky_drive - A client for the SkyDrive (Live Connect) REST API.
//!
//! This library provides functionality to:
//! - Authorize an application with the OAuth2 authorization-code flow
//! - Browse folders, read file metadata and the storage quota
//! - Create, upload, read, copy, move, rename and delete files and folders
//!
//! # Example
//!
//! ```no_run
//! use sky_drive::{ClientConfig, Scope, SkyDriveClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::from_file("app.json")?;
//!     let client = SkyDriveClient::new(config)?;
//!
//!     println!("{}", client.authorization_url(&[Scope::SkyDriveUpdate, Scope::OfflineAccess])?);
//!     client.get_access_token("code-from-redirect").await?;
//!
//!     for resource in client.get_contents(None).await? {
//!         println!("{}", resource);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod request;
pub mod scope;
pub mod url_parser;

// Re-exports for convenience
pub use auth::{Authenticator, Credentials, TokenStore};
pub use client::SkyDriveClient;
pub use config::{AppCredentials, ClientConfig, VerbOverrideStyle};
pub use error::{DriveError, Result};
pub use models::{Resource, ResourceKind, UserQuota, ROOT_FOLDER};
pub use request::{RequestDescriptor, RequestGenerator};
pub use scope::Scope;
pub use url_parser::extract_code;
