//! Backend client for the DisasterWatch dashboard.
//!
//! # Modules
//!
//! - [`api`] -- [`ApiClient`], the REST client for alerts, authentication
//!   and user administration. Implements the core `FeedBackend` seam.
//! - [`forms`] -- Validated login and signup forms.
//! - [`directory`] -- [`UserDirectory`], the user administration list.
//! - [`push`] -- Live alerts over Socket.IO with an RAII
//!   [`PushSubscription`].
//! - [`error`] -- [`ClientError`].
//!
//! [`ApiClient`]: api::ApiClient
//! [`UserDirectory`]: directory::UserDirectory
//! [`PushSubscription`]: push::PushSubscription
//! [`ClientError`]: error::ClientError

pub mod api;
pub mod directory;
pub mod error;
pub mod forms;
pub mod push;

pub use api::ApiClient;
pub use directory::UserDirectory;
pub use error::ClientError;
pub use forms::{LoginForm, SignupForm};
pub use push::{PushChannel, PushEvent, PushSubscription};
