//! Feed document assembly
//!
//! Renders the filtered/sorted item view plus channel-level metadata into
//! an `rss::Channel` document tree. Serialization to XML text stays with
//! the `rss` crate at the HTTP boundary; this module only builds the tree.
//!
//! Resource URLs are reconstructed from the inbound request's scheme, host
//! and mount path — a client-supplied absolute URL is never trusted.

use chrono::Utc;
use rss::extension::atom::{AtomExtension, Link};
use rss::extension::itunes::ITunesItemExtension;
use rss::{Category, Channel, Enclosure, Guid, Image, Item as FeedEntry};
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

use crate::config::ChannelImage;
use crate::error::{Error, Result};
use crate::extractor::Item;

/// Optional hook applied to the assembled document tree before
/// serialization. Identity when unset.
pub type FeedTransform = Arc<dyn Fn(Channel) -> Channel + Send + Sync>;

/// Builds resource URLs from the inbound request's scheme, host and mount
/// path.
#[derive(Debug, Clone)]
pub struct ResourceUrls {
    base: Url,
}

impl ResourceUrls {
    /// Reconstruct the request base URL.
    ///
    /// # Errors
    ///
    /// Rejects a host that does not form a valid URL as
    /// [`Error::InvalidQuery`].
    pub fn new(scheme: &str, host: &str, mount_path: &str) -> Result<Self> {
        let mount = if mount_path.starts_with('/') {
            mount_path.to_string()
        } else {
            format!("/{mount_path}")
        };
        let base = Url::parse(&format!("{scheme}://{host}{mount}"))
            .map_err(|e| Error::InvalidQuery(format!("cannot reconstruct request URL: {e}")))?;
        Ok(Self { base })
    }

    /// Absolute URL for a resource-scoped path segment under the mount.
    pub fn resource(&self, segment: &str) -> String {
        let mut url = self.base.clone();
        let mut path = url.path().to_string();
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(segment.trim_start_matches('/'));
        url.set_path(&path);
        url.to_string()
    }

    /// The mount base itself, with a trailing slash.
    pub fn base(&self) -> String {
        self.resource("")
    }
}

/// Per-request channel-level inputs for feed assembly
#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// Channel title (configured, possibly overridden per request)
    pub title: String,
    /// Channel description
    pub description: String,
    /// Channel artwork (configured, possibly overridden per request)
    pub image: Option<ChannelImage>,
    /// Raw query string of the request, echoed into the description
    pub query_string: Option<String>,
}

/// Assemble the channel document tree from an ordered item sequence.
pub fn build_channel(items: &[Arc<Item>], opts: &FeedOptions, urls: &ResourceUrls) -> Channel {
    let mut channel = Channel::default();

    let mut namespaces = BTreeMap::new();
    namespaces.insert(
        "googleplay".to_string(),
        "http://www.google.com/schemas/play-podcasts/1.0".to_string(),
    );
    channel.set_namespaces(namespaces);

    let mut self_link = Link::default();
    self_link.set_href(urls.resource("feed.xml"));
    self_link.set_rel("self");
    self_link.set_mime_type(Some("application/rss+xml".to_string()));
    self_link.set_title(Some("MP3 Audio".to_string()));

    let mut hub_link = Link::default();
    hub_link.set_href("https://pubsubhubbub.appspot.com/");
    hub_link.set_rel("hub");

    let mut atom_ext = AtomExtension::default();
    atom_ext.set_links(vec![self_link, hub_link]);
    channel.set_atom_ext(Some(atom_ext));

    channel.set_title(opts.title.clone());
    channel.set_link(urls.base());
    channel.set_description(match opts.query_string.as_deref() {
        Some(query) if !query.is_empty() => {
            format!("<p>{}</p>\n\n<p>query: {query}</p>", opts.description)
        }
        _ => opts.description.clone(),
    });
    channel.set_last_build_date(Some(Utc::now().to_rfc2822()));
    channel.set_generator(Some(urls.base()));

    if let Some(image) = &opts.image {
        channel.set_image(Some(channel_image(image)));
    }

    channel.set_items(
        items
            .iter()
            .map(|item| build_entry(item, urls))
            .collect::<Vec<_>>(),
    );

    channel
}

fn channel_image(image: &ChannelImage) -> Image {
    let mut out = Image::default();
    out.set_url(image.url.clone());
    out.set_title(image.title.clone());
    out.set_link(image.link.clone());
    out.set_description(image.description.clone());
    out.set_width(image.width.map(|w| w.to_string()));
    out.set_height(image.height.map(|h| h.to_string()));
    out
}

/// Map one cached item to a feed entry. Absent fields are omitted rather
/// than emitted as empty elements.
fn build_entry(item: &Item, urls: &ResourceUrls) -> FeedEntry {
    let mut entry = FeedEntry::default();

    let mut guid = Guid::default();
    guid.set_value(item.id.clone());
    guid.set_permalink(false);
    entry.set_guid(Some(guid));

    entry.set_title(Some(item.title.clone()));
    entry.set_description(Some(item.description.clone()));
    entry.set_author(Some(item.author.clone()));
    entry.set_pub_date(Some(item.published_at.to_rfc2822()));
    entry.set_content(Some(item.description.clone()));

    if !item.categories.is_empty() {
        entry.set_categories(
            item.categories
                .iter()
                .map(|name| {
                    let mut category = Category::default();
                    category.set_name(name.clone());
                    category
                })
                .collect::<Vec<_>>(),
        );
    }

    let mut enclosure = Enclosure::default();
    enclosure.set_url(urls.resource(&format!("resource/{}/audio.mp3", item.id)));
    enclosure.set_length(item.size_bytes.to_string());
    enclosure.set_mime_type(item.mime_type.clone());
    entry.set_enclosure(Some(enclosure));

    let mut itunes = ITunesItemExtension::default();
    itunes.set_author(Some(item.author.clone()));
    itunes.set_duration(item.duration_secs.map(format_duration));
    itunes.set_image(Some(urls.resource(&format!("resource/{}/image", item.id))));
    itunes.set_summary(Some(item.description.clone()));
    itunes.set_subtitle(Some(item.description.clone()));
    itunes.set_explicit(Some("no".to_string()));
    itunes.set_episode_type(Some("full".to_string()));
    entry.set_itunes_ext(Some(itunes));

    entry
}

/// Whole seconds, the way podcast clients expect `itunes:duration`.
fn format_duration(secs: f64) -> String {
    format!("{}", secs.round() as u64)
}
