use crate::models::PageInfo;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Page property holding the article's content area classification
const CONTENT_AREA_PROP: &str = "ArticleContentArea";

/// Errors that can occur when resolving page metadata
#[derive(Debug, Error)]
pub enum PageDirectoryError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("wiki API returned status {0}")]
    Status(u16),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Failed to read page catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse page catalog: {0}")]
    Catalog(#[from] toml::de::Error),
}

/// Resolves article ids to page metadata on behalf of the wiki host
#[async_trait]
pub trait PageDirectory: Send + Sync {
    /// `Ok(None)` when the id does not belong to any page
    async fn page_info(&self, article_id: u64) -> Result<Option<PageInfo>, PageDirectoryError>;
}

#[derive(Debug, Deserialize)]
struct PageCatalog {
    #[serde(default)]
    pages: Vec<PageInfo>,
}

/// In-memory page catalog, loaded from TOML or built directly
#[derive(Debug, Default, Clone)]
pub struct StaticPageDirectory {
    pages: HashMap<u64, PageInfo>,
}

impl StaticPageDirectory {
    pub fn new(pages: impl IntoIterator<Item = PageInfo>) -> Self {
        Self {
            pages: pages.into_iter().map(|p| (p.article_id, p)).collect(),
        }
    }

    pub fn from_toml(source: &str) -> Result<Self, PageDirectoryError> {
        let catalog: PageCatalog = toml::from_str(source)?;
        Ok(Self::new(catalog.pages))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PageDirectoryError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml(&source)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[async_trait]
impl PageDirectory for StaticPageDirectory {
    async fn page_info(&self, article_id: u64) -> Result<Option<PageInfo>, PageDirectoryError> {
        Ok(self.pages.get(&article_id).cloned())
    }
}

/// Page metadata from the wiki's action API
pub struct WikiApiPageDirectory {
    api_url: String,
    client: Client,
}

impl WikiApiPageDirectory {
    pub fn new(api_url: String) -> Result<Self, PageDirectoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { api_url, client })
    }

    fn parse_page(article_id: u64, json: &Value) -> Result<Option<PageInfo>, PageDirectoryError> {
        let page = json
            .pointer("/query/pages/0")
            .ok_or_else(|| PageDirectoryError::InvalidResponse("Missing query.pages".into()))?;

        if page.get("missing").is_some() || page.get("invalid").is_some() {
            return Ok(None);
        }

        let title = page
            .get("title")
            .and_then(|t| t.as_str())
            .ok_or_else(|| PageDirectoryError::InvalidResponse("Missing page title".into()))?
            .to_string();

        // Category titles come namespaced ("Category:Foo bar"); keep the db key
        let categories = page
            .get("categories")
            .and_then(|c| c.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|c| c.get("title").and_then(|t| t.as_str()))
                    .map(|t| t.split_once(':').map(|(_, name)| name).unwrap_or(t))
                    .map(|name| name.replace(' ', "_"))
                    .collect()
            })
            .unwrap_or_default();

        let language_links = page
            .get("langlinks")
            .and_then(|l| l.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|l| {
                        let lang = l.get("lang")?.as_str()?;
                        let target = l.get("title").and_then(|t| t.as_str()).unwrap_or_default();
                        Some((lang.to_string(), target.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let content_area = page
            .get("pageprops")
            .and_then(|p| p.get(CONTENT_AREA_PROP))
            .and_then(|a| a.as_str())
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        Ok(Some(PageInfo {
            article_id,
            title,
            categories,
            language_links,
            content_area,
        }))
    }
}

#[async_trait]
impl PageDirectory for WikiApiPageDirectory {
    async fn page_info(&self, article_id: u64) -> Result<Option<PageInfo>, PageDirectoryError> {
        let page_id = article_id.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("pageids", page_id.as_str()),
                ("prop", "categories|langlinks|pageprops"),
                ("cllimit", "max"),
                ("lllimit", "max"),
                ("ppprop", CONTENT_AREA_PROP),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::error!("Wiki API returned {} for article {}", response.status(), article_id);
            return Err(PageDirectoryError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Wiki API sent unparsable JSON for article {}: {}", article_id, e);
            PageDirectoryError::InvalidResponse(e.to_string())
        })?;
        Self::parse_page(article_id, &json)
    }
}
