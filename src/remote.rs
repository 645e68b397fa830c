//! PokeAPI-backed [`PokemonSource`].
//!
//! `read_all` requests one summary page, then hydrates every entry with a
//! detail request keyed by name. The fan-out is bounded and lenient: at most
//! `detail_concurrency` requests are in flight at once, a failed detail
//! drops that entry from the page instead of failing the whole read, and
//! survivors come back in summary order.
//!
//! A failed summary request fails the whole read and issues no detail
//! requests at all.
//!
//! The wire DTOs below never leave this module; the mapper flattens them
//! into [`Pokemon`] and turns absent sprite URLs into empty strings.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::models::Pokemon;
use crate::source::PokemonSource;

/// HTTP client for the Pokémon API.
pub struct RemoteSource {
    client: reqwest::Client,
    base_url: String,
    page_limit: u32,
    page_offset: u32,
    detail_concurrency: usize,
}

#[derive(Debug, Deserialize)]
struct PageDto {
    results: Vec<SummaryDto>,
}

/// One entry of the summary page. The `url` field is the detail locator the
/// upstream API advertises; requests are keyed by `name`, which resolves to
/// the same resource.
#[derive(Debug, Deserialize)]
struct SummaryDto {
    name: String,
    #[allow(dead_code)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct DetailDto {
    id: i64,
    name: String,
    sprites: SpritesDto,
}

#[derive(Debug, Deserialize)]
struct SpritesDto {
    front_default: Option<String>,
    other: Option<OtherSpritesDto>,
}

#[derive(Debug, Deserialize)]
struct OtherSpritesDto {
    #[serde(rename = "official-artwork")]
    official_artwork: Option<ArtworkDto>,
}

#[derive(Debug, Deserialize)]
struct ArtworkDto {
    front_default: Option<String>,
}

fn map_detail(d: DetailDto) -> Pokemon {
    let artwork_url = d
        .sprites
        .other
        .and_then(|o| o.official_artwork)
        .and_then(|a| a.front_default)
        .unwrap_or_default();
    Pokemon {
        id: d.id,
        name: d.name,
        sprite_url: d.sprites.front_default.unwrap_or_default(),
        artwork_url,
    }
}

impl RemoteSource {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_limit: config.page_limit,
            page_offset: config.page_offset,
            detail_concurrency: config.detail_concurrency,
        })
    }

    async fn fetch_page(&self) -> Result<PageDto> {
        let url = format!("{}/api/v2/pokemon/", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("limit", self.page_limit), ("offset", self.page_offset)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::Remote {
                status: resp.status().as_u16(),
            });
        }

        Ok(resp.json::<PageDto>().await?)
    }

    /// Fetch and map one detail resource. `key` is a name or a numeric id;
    /// the API serves both from the same path.
    async fn fetch_detail(&self, key: &str) -> Result<Pokemon> {
        let url = format!("{}/api/v2/pokemon/{}", self.base_url, key);
        let resp = self.client.get(&url).send().await?;

        if !resp.status().is_success() {
            return Err(Error::Remote {
                status: resp.status().as_u16(),
            });
        }

        Ok(map_detail(resp.json::<DetailDto>().await?))
    }

    /// Hydrate a summary page with bounded, lenient detail fan-out.
    ///
    /// Results are re-sorted to summary order; entries whose detail fetch
    /// failed are dropped with a warning.
    async fn hydrate(&self, summaries: Vec<SummaryDto>) -> Result<Vec<Pokemon>> {
        let semaphore = Arc::new(Semaphore::new(self.detail_concurrency));
        let mut set: JoinSet<(usize, Option<Pokemon>)> = JoinSet::new();

        for (index, summary) in summaries.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let client = self.client.clone();
            let url = format!("{}/api/v2/pokemon/{}", self.base_url, summary.name);
            let name = summary.name;

            set.spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, None),
                };
                match fetch_detail_with(&client, &url).await {
                    Ok(p) => (index, Some(p)),
                    Err(e) => {
                        warn!(name = %name, error = %e, "dropping entry; detail fetch failed");
                        (index, None)
                    }
                }
            });
        }

        let mut hydrated: Vec<(usize, Option<Pokemon>)> = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(pair) => hydrated.push(pair),
                Err(e) => warn!(error = %e, "detail fetch task failed to join"),
            }
        }

        hydrated.sort_by_key(|(index, _)| *index);
        let records: Vec<Pokemon> = hydrated.into_iter().filter_map(|(_, p)| p).collect();
        debug!(count = records.len(), "hydrated summary page");
        Ok(records)
    }
}

/// Standalone detail fetch used inside spawned fan-out tasks, where `self`
/// cannot be borrowed.
async fn fetch_detail_with(client: &reqwest::Client, url: &str) -> Result<Pokemon> {
    let resp = client.get(url).send().await?;

    if !resp.status().is_success() {
        return Err(Error::Remote {
            status: resp.status().as_u16(),
        });
    }

    Ok(map_detail(resp.json::<DetailDto>().await?))
}

#[async_trait]
impl PokemonSource for RemoteSource {
    async fn read_all(&self) -> Result<Vec<Pokemon>> {
        let page = self.fetch_page().await?;
        self.hydrate(page.results).await
    }

    async fn read_one(&self, id: i64) -> Result<Pokemon> {
        self.fetch_detail(&id.to_string()).await
    }
}
