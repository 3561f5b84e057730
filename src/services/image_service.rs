use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::services::providers::{ImageSearch, ProviderError};

const THUMBNAIL_SIZE: &str = "800";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryPages>,
}

#[derive(Debug, Deserialize)]
struct QueryPages {
    #[serde(default)]
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    index: Option<u32>,
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: String,
}

/// Thumbnail lookup through the MediaWiki `pageimages` API, searching by title.
#[derive(Clone)]
pub struct WikipediaImageSearch {
    client: Client,
    endpoint: String,
}

impl WikipediaImageSearch {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ImageSearch for WikipediaImageSearch {
    async fn thumbnail(&self, query: &str) -> Result<Option<String>, ProviderError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", "1"),
                ("prop", "pageimages"),
                ("piprop", "thumbnail"),
                ("pithumbsize", THUMBNAIL_SIZE),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: QueryResponse = response.json().await?;
        Ok(first_thumbnail(body))
    }
}

// Pages come back keyed by page id; `index` carries the search rank
fn first_thumbnail(body: QueryResponse) -> Option<String> {
    let mut pages: Vec<Page> = body.query?.pages.into_values().collect();
    pages.sort_by_key(|p| p.index.unwrap_or(u32::MAX));
    pages
        .into_iter()
        .find_map(|p| p.thumbnail)
        .map(|t| t.source)
        .filter(|source| !source.is_empty())
}

/// Deterministic placeholder images; never touches the network.
#[derive(Debug, Clone)]
pub struct PlaceholderImages {
    base_url: String,
}

impl PlaceholderImages {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `Taj Mahal` becomes `<base>/Taj,Mahal,travel`.
    pub fn url_for(&self, query: &str) -> String {
        let mut tags: Vec<String> = query
            .split_whitespace()
            .map(|word| url::form_urlencoded::byte_serialize(word.as_bytes()).collect())
            .collect();
        tags.push("travel".to_string());
        format!("{}/{}", self.base_url, tags.join(","))
    }
}
