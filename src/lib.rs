//! # Lorebook
//!
//! Storage and sharing for a character wiki, usable both as a standalone
//! binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! lorebook = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use lorebook::config::AppConfig;
//! use lorebook::types::Category;
//! use lorebook::wiki::Wiki;
//!
//! let config = AppConfig::load("./data")?;
//! let wiki = Wiki::open(&config)?;
//! for character in wiki.characters(Category::Allies)? {
//!     println!("{}", character.name);
//! }
//!
//! let link = wiki.configured_share_transport(&config)?.share_link(None).await?;
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod images;
pub mod migrate;
pub mod share;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod wiki;
