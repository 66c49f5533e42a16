//! Hacker News story feed.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::ClientResult;

pub const HN_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";

/// One feed item: the raw JSON body plus the fields worth logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub raw: Vec<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct ItemFields {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl FeedItem {
    /// Parse an item body. `null` (deleted items) yields an item without id.
    pub fn from_bytes(raw: Vec<u8>) -> ClientResult<Self> {
        let fields: Option<ItemFields> = serde_json::from_slice(&raw)?;
        let fields = fields.unwrap_or_default();
        Ok(Self {
            id: fields.id,
            title: fields.title,
            url: fields.url,
            raw,
        })
    }
}

/// Source of story ids and items.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Ids of the newest stories.
    async fn new_story_ids(&self) -> ClientResult<Vec<u64>>;

    async fn item(&self, id: u64) -> ClientResult<FeedItem>;
}

/// Public Hacker News API over HTTP.
pub struct HackerNewsFeed {
    client: Client,
    base_url: String,
}

impl HackerNewsFeed {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl FeedSource for HackerNewsFeed {
    async fn new_story_ids(&self) -> ClientResult<Vec<u64>> {
        let url = format!("{}/newstories.json", self.base_url);
        let body = self.client.get(url).send().await?.bytes().await?;
        if body.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Option<Vec<u64>> = serde_json::from_slice(&body)?;
        Ok(ids.unwrap_or_default())
    }

    async fn item(&self, id: u64) -> ClientResult<FeedItem> {
        let url = format!("{}/item/{}.json", self.base_url, id);
        let body = self.client.get(url).send().await?.bytes().await?;
        FeedItem::from_bytes(body.to_vec())
    }
}
