//! Caching PokeAPI client.
//!
//! ## Memoization
//!
//! Pokémon and species documents are cached by name for the lifetime of the
//! client, with no eviction. Each name owns a `OnceCell` that doubles as the
//! in-flight marker: concurrent lookups of the same name wait on a single
//! fetch, so every name is fetched at most once. A failed fetch leaves the
//! cell empty.
//!
//! ## Listings
//!
//! [`PokeClient::list_all`] follows `next` cursors lazily. Nothing is
//! requested until the stream is polled, and each call starts again from
//! the first page.

use std::sync::Arc;

use dashmap::DashMap;
use futures::Stream;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::config::ClientConfig;
use crate::doc::DocExt;
use crate::transport::{resolve_url, HttpTransport, Transport};
use crate::types::{InsightsResult, TransportError};

type Memo = DashMap<String, Arc<OnceCell<Arc<Value>>>>;

const POKEMON_PATH: &str = "pokemon";
const SPECIES_PATH: &str = "pokemon-species";
const TYPE_PATH: &str = "type";

/// PokeAPI client with per-name memoization of Pokémon and species.
pub struct PokeClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    concurrency: usize,
    pokemon: Memo,
    species: Memo,
}

impl PokeClient {
    /// Create a client that talks HTTP using `config`.
    pub fn new(config: &ClientConfig) -> InsightsResult<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over any transport. `config` is not validated.
    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: config.base_url.clone(),
            concurrency: config.concurrency.max(1),
            pokemon: DashMap::new(),
            species: DashMap::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Detail fetches a query may keep in flight at once.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetch a path (relative to the base URL) or an absolute URL.
    pub async fn get_json(&self, path: &str) -> Result<Value, TransportError> {
        let url = resolve_url(&self.base_url, path);
        self.transport.fetch(&url).await
    }

    /// Pokémon document by name, fetched at most once.
    pub async fn pokemon(&self, name: &str) -> Result<Arc<Value>, TransportError> {
        self.memoized(&self.pokemon, POKEMON_PATH, name).await
    }

    /// Species document by name, fetched at most once.
    pub async fn species(&self, name: &str) -> Result<Arc<Value>, TransportError> {
        self.memoized(&self.species, SPECIES_PATH, name).await
    }

    /// Species a Pokémon belongs to.
    ///
    /// Falls back to the Pokémon's own name when its document carries no
    /// species link.
    pub async fn species_of(&self, pokemon_name: &str) -> Result<Arc<Value>, TransportError> {
        let pokemon = self.pokemon(pokemon_name).await?;
        let species_name = pokemon
            .str_at(&["species", "name"])
            .unwrap_or(pokemon_name)
            .to_string();
        self.species(&species_name).await
    }

    /// Root node of a species' evolution chain.
    ///
    /// `None` when the species has no chain link or the chain document has
    /// no root.
    pub async fn chain_of(&self, species: &Value) -> Result<Option<Value>, TransportError> {
        let Some(url) = species.str_at(&["evolution_chain", "url"]) else {
            return Ok(None);
        };
        let mut document = self.get_json(url).await?;
        Ok(document
            .get_mut("chain")
            .map(Value::take)
            .filter(|root| !root.is_null()))
    }

    /// Names of every Pokémon listed under a type, in listing order.
    ///
    /// Type listings are not paginated; one request covers the category.
    pub async fn category_members(&self, type_name: &str) -> Result<Vec<String>, TransportError> {
        let document = self.get_json(&format!("{TYPE_PATH}/{type_name}")).await?;
        let members: Vec<String> = document
            .items(&["pokemon"])
            .iter()
            .filter_map(|slot| slot.str_at(&["pokemon", "name"]))
            .map(str::to_string)
            .collect();
        tracing::debug!("type {type_name}: {} members", members.len());
        Ok(members)
    }

    /// Lazily enumerate every entry of a paginated listing.
    pub fn list_all<'a>(
        &'a self,
        listing_path: &str,
    ) -> impl Stream<Item = Result<Value, TransportError>> + 'a {
        let first = resolve_url(&self.base_url, listing_path);
        async_stream::stream! {
            let mut next = Some(first);
            let mut pages = 0usize;
            while let Some(url) = next.take() {
                let mut page = match self.transport.fetch(&url).await {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                pages += 1;
                next = page.str_at(&["next"]).map(str::to_string);
                if let Some(Value::Array(results)) = page.get_mut("results").map(Value::take) {
                    for entry in results {
                        yield Ok(entry);
                    }
                }
            }
            tracing::debug!("listing exhausted after {pages} page(s)");
        }
    }

    /// Number of cached `(pokemon, species)` documents.
    pub fn cached_counts(&self) -> (usize, usize) {
        (filled(&self.pokemon), filled(&self.species))
    }

    async fn memoized(
        &self,
        memo: &Memo,
        kind: &str,
        name: &str,
    ) -> Result<Arc<Value>, TransportError> {
        // Clone the cell out so no map shard stays locked across the fetch.
        let cell = memo.entry(name.to_string()).or_default().clone();
        if let Some(hit) = cell.get() {
            tracing::trace!("cache hit: {kind}/{name}");
            return Ok(Arc::clone(hit));
        }

        let value = cell
            .get_or_try_init(|| async {
                tracing::debug!("cache miss: {kind}/{name}");
                self.get_json(&format!("{kind}/{name}")).await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(value))
    }
}

fn filled(memo: &Memo) -> usize {
    memo.iter().filter(|entry| entry.value().initialized()).count()
}

/// `name` field of a listing entry.
pub fn entry_name(entry: &Value) -> Option<&str> {
    entry.str_at(&["name"])
}
