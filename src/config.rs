//! Configuration types for dircast

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Audio library configuration (root directory and file selection)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Root directory to scan for audio files (default: "./library")
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Audio file extension to include, without the dot (default: "mp3")
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            extension: default_extension(),
        }
    }
}

/// Channel-level feed metadata
///
/// Static configuration for the podcast channel. Individual requests may
/// override the title and image via query parameters; those overrides are
/// per-request only and never persisted here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Podcast title (default: "Audio Library")
    #[serde(default = "default_channel_title")]
    pub title: String,

    /// Podcast description (default: "Audio files served as a podcast feed")
    #[serde(default = "default_channel_description")]
    pub description: String,

    /// Optional channel artwork
    #[serde(default)]
    pub image: Option<ChannelImage>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            title: default_channel_title(),
            description: default_channel_description(),
            image: None,
        }
    }
}

/// Channel artwork description for the feed `<image>` element
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChannelImage {
    /// Image URL
    pub url: String,

    /// Image title
    #[serde(default)]
    pub title: String,

    /// Link target for the image
    #[serde(default)]
    pub link: String,

    /// Optional image description
    #[serde(default)]
    pub description: Option<String>,

    /// Image width in pixels
    #[serde(default)]
    pub width: Option<u32>,

    /// Image height in pixels
    #[serde(default)]
    pub height: Option<u32>,
}

/// HTTP server configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to (default: "127.0.0.1:8765")
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS (default: false)
    #[serde(default)]
    pub cors_enabled: bool,

    /// Allowed CORS origins ("*" allows any; default: empty = any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: false,
            cors_origins: Vec::new(),
        }
    }
}

/// Main configuration for dircast
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Audio library settings
    #[serde(default)]
    pub library: LibraryConfig,

    /// Channel-level feed metadata
    #[serde(default)]
    pub channel: ChannelConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("./library")
}

fn default_extension() -> String {
    "mp3".to_string()
}

fn default_channel_title() -> String {
    "Audio Library".to_string()
}

fn default_channel_description() -> String {
    "Audio files served as a podcast feed".to_string()
}

fn default_bind_address() -> SocketAddr {
    #[allow(clippy::unwrap_used)] // constant literal, cannot fail
    "127.0.0.1:8765".parse().unwrap()
}
