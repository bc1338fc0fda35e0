//! # Card Catalog
//!
//! The catalog is an external collaborator behind the [`CardCatalog`] trait:
//! find a set by name, list a set's cards, search cards by name. Production
//! talks to the TCGdex REST API with a blocking `reqwest` client; it is only
//! ever called from worker threads.
//!
//! Every failure (network error, timeout, bad status, not found) comes back as
//! an `Err`. Callers treat them all alike: no data this cycle, nothing applied.

use crate::error::{BinderError, Result};
use crate::model::Card;
use log::debug;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

const IMAGE_QUALITY_SUFFIX: &str = "low.jpg";
const BUY_URL: &str = "https://www.tcgplayer.com/search/all/product";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetSummary {
    pub id: String,
    pub name: String,
}

/// A card as the catalog returns it. Set fields are only present on some
/// endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogCard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub set_id: Option<String>,
    #[serde(default)]
    pub set_name: Option<String>,
}

impl CatalogCard {
    /// Converts to a binder card. `set` wins over the card's own set fields;
    /// with neither, the set id is taken from the card id prefix.
    pub fn into_card(self, set: Option<&SetSummary>) -> Card {
        let image = self
            .image
            .map(|base| image_locator(&base))
            .unwrap_or_default();
        let (set_id, set_name) = match set {
            Some(set) => (set.id.clone(), set.name.clone()),
            None => (
                self.set_id
                    .or_else(|| self.id.rsplit_once('-').map(|(prefix, _)| prefix.to_string()))
                    .unwrap_or_default(),
                self.set_name.unwrap_or_default(),
            ),
        };
        Card::new(self.id, self.name, image, set_name, set_id)
    }
}

/// TCGdex image bases have no extension; the low-quality JPEG sits under them.
fn image_locator(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with(".jpg") || base.ends_with(".png") || base.ends_with(".webp") {
        base.to_string()
    } else {
        format!("{}/{}", base, IMAGE_QUALITY_SUFFIX)
    }
}

pub trait CardCatalog: Send + Sync {
    fn find_set_by_name(&self, query: &str) -> Result<Option<SetSummary>>;

    fn get_set_cards(&self, set_id: &str) -> Result<Vec<CatalogCard>>;

    fn search_cards_by_name(&self, query: &str) -> Result<Vec<CatalogCard>>;
}

/// Finds a set and fetches all of its cards, each tagged with the set.
pub fn load_set(catalog: &dyn CardCatalog, query: &str) -> Result<(SetSummary, Vec<Card>)> {
    let query = query.trim();
    if query.is_empty() {
        return Err(BinderError::Validation("Set name cannot be empty".to_string()));
    }
    let set = catalog
        .find_set_by_name(query)?
        .ok_or_else(|| BinderError::Api(format!("No set matching '{}'", query)))?;
    let cards = catalog
        .get_set_cards(&set.id)?
        .into_iter()
        .map(|card| card.into_card(Some(&set)))
        .collect();
    Ok((set, cards))
}

pub fn search_cards(catalog: &dyn CardCatalog, query: &str) -> Result<Vec<Card>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(BinderError::Validation(
            "Search text cannot be empty".to_string(),
        ));
    }
    Ok(catalog
        .search_cards_by_name(query)?
        .into_iter()
        .map(|card| card.into_card(None))
        .collect())
}

/// Marketplace search link for a card: its name plus the upper-cased set id.
pub fn buy_url(card: &Card) -> Result<String> {
    let q = format!("{} {}", card.name, card.set_id.to_uppercase());
    let url = Url::parse_with_params(BUY_URL, &[("q", q.trim())])
        .map_err(|e| BinderError::Api(format!("Could not build buy link: {}", e)))?;
    Ok(url.to_string())
}

#[derive(Deserialize)]
struct SetDetail {
    #[serde(default)]
    cards: Vec<CatalogCard>,
}

/// The TCGdex v2 REST API.
pub struct TcgdexCatalog {
    client: Client,
    base_url: String,
}

impl TcgdexCatalog {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tcgbinder/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(response.json()?)
    }

    fn url(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| BinderError::Api(format!("Bad catalog URL: {}", e)))
    }
}

impl CardCatalog for TcgdexCatalog {
    fn find_set_by_name(&self, query: &str) -> Result<Option<SetSummary>> {
        let sets: Vec<SetSummary> = self.get_json(self.url("sets")?)?;
        let needle = query.trim().to_lowercase();
        Ok(sets
            .into_iter()
            .find(|set| set.name.to_lowercase().contains(&needle)))
    }

    fn get_set_cards(&self, set_id: &str) -> Result<Vec<CatalogCard>> {
        let mut url = self.url("sets")?;
        url.path_segments_mut()
            .map_err(|_| BinderError::Api("Bad catalog URL".to_string()))?
            .push(set_id);
        let detail: SetDetail = self.get_json(url)?;
        Ok(detail.cards)
    }

    fn search_cards_by_name(&self, query: &str) -> Result<Vec<CatalogCard>> {
        let mut url = self.url("cards")?;
        url.query_pairs_mut().append_pair("name", query);
        self.get_json(url)
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned catalog. Set lookups may be delayed per query to stage races.
    #[derive(Default)]
    pub struct StaticCatalog {
        pub sets: Vec<SetSummary>,
        pub cards: HashMap<String, Vec<CatalogCard>>,
        pub delays: HashMap<String, Duration>,
        pub offline: bool,
        pub calls: Mutex<Vec<String>>,
    }

    impl StaticCatalog {
        pub fn new() -> Self {
            Self::default()
        }

        /// Adds a set with `count` cards named "<set name> #n".
        pub fn with_set(mut self, id: &str, name: &str, count: usize) -> Self {
            self.sets.push(SetSummary {
                id: id.to_string(),
                name: name.to_string(),
            });
            let cards = (1..=count)
                .map(|n| CatalogCard {
                    id: format!("{}-{:03}", id, n),
                    name: format!("{} #{}", name, n),
                    image: Some(format!("https://assets.example/{}/{:03}", id, n)),
                    set_id: None,
                    set_name: None,
                })
                .collect();
            self.cards.insert(id.to_string(), cards);
            self
        }

        pub fn with_delay(mut self, query: &str, delay: Duration) -> Self {
            self.delays.insert(query.to_lowercase(), delay);
            self
        }

        pub fn offline(mut self) -> Self {
            self.offline = true;
            self
        }

        fn record(&self, call: String) -> Result<()> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call);
            }
            if self.offline {
                return Err(BinderError::Api("catalog unreachable".to_string()));
            }
            Ok(())
        }
    }

    impl CardCatalog for StaticCatalog {
        fn find_set_by_name(&self, query: &str) -> Result<Option<SetSummary>> {
            self.record(format!("find_set:{}", query))?;
            let needle = query.to_lowercase();
            if let Some(delay) = self.delays.get(&needle) {
                std::thread::sleep(*delay);
            }
            Ok(self
                .sets
                .iter()
                .find(|s| s.name.to_lowercase().contains(&needle))
                .cloned())
        }

        fn get_set_cards(&self, set_id: &str) -> Result<Vec<CatalogCard>> {
            self.record(format!("set_cards:{}", set_id))?;
            self.cards
                .get(set_id)
                .cloned()
                .ok_or_else(|| BinderError::Api(format!("unknown set {}", set_id)))
        }

        fn search_cards_by_name(&self, query: &str) -> Result<Vec<CatalogCard>> {
            self.record(format!("search:{}", query))?;
            let needle = query.to_lowercase();
            Ok(self
                .cards
                .values()
                .flatten()
                .filter(|c| c.name.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        }
    }
}
