//! # API Facade
//!
//! [`BinderApp`] is the single entry point for every binder operation,
//! whatever the client. It lives on the main context (see
//! [`runtime`](crate::runtime)) and owns:
//!
//! - the [`CollectionStore`], the only owner of slot sequences
//! - the [`Session`], the explicit "current user and binder"
//! - the [`BinderView`] and [`SearchView`], derived snapshots
//! - the catalog and image cache handles used by workers
//!
//! ## Role and Responsibilities
//!
//! The facade:
//! - **Dispatches** to the command functions in `commands/*.rs`
//! - **Translates positions**: clients address what they see, so binder
//!   positions are display positions and go through the view to raw indexes
//! - **Re-derives views** after every mutation, keeping the current page
//! - **Schedules work**: catalog and image requests run on workers and come
//!   back as posted tasks; filter edits go through a debouncer
//! - **Records status**: the last message of every operation
//!
//! Business rules stay in the command layer; rendering stays in the client.
//!
//! ## Stale results
//!
//! Catalog requests share one [`RequestGuard`]. A result whose token is no
//! longer the latest is dropped, so a slow old request cannot overwrite a
//! newer one. Image results are dropped if their slot no longer holds the
//! card they were fetched for.

use crate::cache::ImageCache;
use crate::catalog::{self, CardCatalog, SetSummary};
use crate::commands::{self, progress::SetProgress, CmdMessage, CmdResult};
use crate::config::BinderConfig;
use crate::error::{BinderError, Result};
use crate::layout::{GridSize, Layout};
use crate::model::{Card, Session, Slot};
use crate::moves::MoveOrigin;
use crate::runtime::{spawn_worker, Debouncer, MainContext, Poster, RequestGuard, RequestToken};
use crate::store::{CollectionStore, StorageBackend};
use crate::view::{BinderView, PageCell, SearchView};
use image::RgbImage;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// A snapshot of the visible binder page.
#[derive(Debug, Clone)]
pub struct BinderPage {
    pub binder: String,
    pub page: usize,
    pub page_count: usize,
    pub layout: Layout,
    pub query: String,
    pub cells: Vec<PageCell>,
}

/// A snapshot of the visible search page.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub set: Option<SetSummary>,
    pub page: usize,
    pub page_count: usize,
    pub grid: GridSize,
    pub query: String,
    pub total: usize,
    /// Display positions and their cards.
    pub cards: Vec<(usize, Card)>,
}

struct SlotImage {
    card_id: String,
    image: RgbImage,
}

enum CatalogResult {
    Set(Result<(SetSummary, Vec<Card>)>),
    Search(String, Result<Vec<Card>>),
}

pub struct BinderApp<B: StorageBackend + 'static> {
    store: CollectionStore<B>,
    session: Session,
    binder_view: BinderView,
    search_view: SearchView,
    catalog: Arc<dyn CardCatalog>,
    images: Option<Arc<ImageCache>>,
    poster: Poster<BinderApp<B>>,
    binder_filter: Debouncer,
    search_filter: Debouncer,
    requests: RequestGuard,
    in_flight: usize,
    slot_images: HashMap<usize, SlotImage>,
    status: Option<CmdMessage>,
}

impl<B: StorageBackend + 'static> BinderApp<B> {
    pub fn new(
        mut store: CollectionStore<B>,
        main: &MainContext<Self>,
        catalog: Arc<dyn CardCatalog>,
        config: &BinderConfig,
    ) -> Result<Self> {
        if let Err(e) = store.ensure_default_user() {
            warn!("Could not save the default profile: {}", e);
        }
        let session = store.default_session()?;
        let mut app = Self {
            store,
            session,
            binder_view: BinderView::new(),
            search_view: SearchView::new(config.search_grid()),
            catalog,
            images: None,
            poster: main.poster(),
            binder_filter: Debouncer::new(config.filter_debounce()),
            search_filter: Debouncer::new(config.filter_debounce()),
            requests: RequestGuard::default(),
            in_flight: 0,
            slot_images: HashMap::new(),
            status: None,
        };
        app.refresh_binder();
        Ok(app)
    }

    pub fn with_images(mut self, cache: Arc<ImageCache>) -> Self {
        self.images = Some(cache);
        self
    }

    // --- Accessors ---

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &CollectionStore<B> {
        &self.store
    }

    pub fn binder_view(&self) -> &BinderView {
        &self.binder_view
    }

    pub fn search_view(&self) -> &SearchView {
        &self.search_view
    }

    pub fn status(&self) -> Option<&CmdMessage> {
        self.status.as_ref()
    }

    pub fn dark_mode(&self) -> bool {
        self.store
            .user(&self.session.user)
            .map(|u| u.dark_mode)
            .unwrap_or_default()
    }

    /// True when no catalog or image request is outstanding.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    pub fn slots(&self) -> Result<&[Slot]> {
        self.store.slots(&self.session)
    }

    pub fn layout(&self) -> Result<Layout> {
        self.store.layout(&self.session)
    }

    // --- Sessions and profiles ---

    /// Switches to another binder of the current user. Back to page 1.
    pub fn select_binder(&mut self, name: &str) -> Result<()> {
        let session = self
            .store
            .session_for(Some(&self.session.user), Some(name))?;
        self.switch_session(session);
        self.status = Some(CmdMessage::info(format!("Opened {}", name)));
        Ok(())
    }

    pub fn create_profile(&mut self, name: &str, password: &str) -> Result<CmdResult> {
        let result = commands::profile::create_user(&mut self.store, name, password);
        self.finish(result)
    }

    /// Signs in as another profile and opens its first binder.
    pub fn login(&mut self, name: &str, password: &str) -> Result<()> {
        match commands::profile::authenticate(&self.store, name, password) {
            Ok(session) => {
                self.switch_session(session);
                self.status = Some(CmdMessage::success(format!("Welcome, {}", name)));
                Ok(())
            }
            Err(e) => {
                self.status = Some(CmdMessage::error(e.to_string()));
                Err(e)
            }
        }
    }

    pub fn set_theme(&mut self, dark_mode: bool) -> Result<CmdResult> {
        let user = self.session.user.clone();
        let result = commands::profile::set_theme(&mut self.store, &user, dark_mode);
        self.finish(result)
    }

    fn switch_session(&mut self, session: Session) {
        self.session = session;
        self.slot_images.clear();
        let query = self.binder_view.query().to_string();
        self.binder_filter.cancel();
        self.apply_binder_query(&query);
    }

    // --- Pages ---

    pub fn binder_page(&self) -> Result<BinderPage> {
        let layout = self.layout()?;
        Ok(BinderPage {
            binder: self.session.binder.clone(),
            page: self.binder_view.page(),
            page_count: self.binder_view.page_count(&layout),
            layout,
            query: self.binder_view.query().to_string(),
            cells: self.binder_view.cells(&layout),
        })
    }

    pub fn search_page(&self) -> SearchPage {
        SearchPage {
            set: self.search_view.loaded_set().cloned(),
            page: self.search_view.page(),
            page_count: self.search_view.page_count(),
            grid: self.search_view.grid(),
            query: self.search_view.query().to_string(),
            total: self.search_view.displayed().len(),
            cards: self
                .search_view
                .page_cards()
                .into_iter()
                .map(|(position, card)| (position, card.clone()))
                .collect(),
        }
    }

    pub fn go_to_page(&mut self, page: usize) -> Result<usize> {
        let layout = self.layout()?;
        Ok(self.binder_view.go_to(page, &layout))
    }

    pub fn next_page(&mut self) -> Result<usize> {
        let layout = self.layout()?;
        Ok(self.binder_view.step(1, &layout))
    }

    pub fn prev_page(&mut self) -> Result<usize> {
        let layout = self.layout()?;
        Ok(self.binder_view.step(-1, &layout))
    }

    pub fn search_go_to_page(&mut self, page: usize) -> usize {
        self.search_view.go_to(page)
    }

    pub fn search_next_page(&mut self) -> usize {
        self.search_view.step(1)
    }

    pub fn search_prev_page(&mut self) -> usize {
        self.search_view.step(-1)
    }

    // --- Binder mutations ---

    pub fn add_card(&mut self, card: Card, confirmed: bool) -> Result<CmdResult> {
        let result = commands::cards::add(&mut self.store, &self.session, card, confirmed);
        self.finish(result)
    }

    /// Appends the search result at `position` (a search display position).
    pub fn add_search_result(&mut self, position: usize, confirmed: bool) -> Result<CmdResult> {
        let card = self.search_card(position)?;
        self.add_card(card, confirmed)
    }

    /// Appends every card of the loaded set.
    pub fn add_loaded_set(&mut self, confirmed: bool) -> Result<CmdResult> {
        if self.search_view.loaded_set().is_none() {
            return self.fail(BinderError::Validation("No set is loaded".to_string()));
        }
        let cards = self.search_view.cards().to_vec();
        let result = commands::cards::add_many(&mut self.store, &self.session, cards, confirmed);
        self.finish(result)
    }

    /// Empties the slot at display `position`.
    pub fn remove_card(&mut self, position: usize) -> Result<CmdResult> {
        let Some(index) = self.binder_view.raw_index(position) else {
            return Ok(CmdResult::default());
        };
        let result = commands::cards::remove(&mut self.store, &self.session, index);
        self.finish(result)
    }

    pub fn clear_binder(&mut self) -> Result<CmdResult> {
        let result = commands::binders::clear(&mut self.store, &self.session);
        self.finish(result)
    }

    pub fn sort_by_name(&mut self) -> Result<CmdResult> {
        let result = commands::sort::by_name(&mut self.store, &self.session);
        self.finish(result)
    }

    pub fn sort_by_number(&mut self) -> Result<CmdResult> {
        let result = commands::sort::by_number(&mut self.store, &self.session);
        self.finish(result)
    }

    /// Applies a binder grid from raw text fields.
    pub fn apply_layout(&mut self, rows: &str, cols: &str, pages: &str) -> Result<CmdResult> {
        let result = commands::layout::apply(&mut self.store, &self.session, rows, cols, pages);
        self.finish(result)
    }

    /// Resizes the search grid. Nothing is persisted.
    pub fn apply_search_grid(&mut self, rows: &str, cols: &str) -> Result<CmdResult> {
        match GridSize::parse(rows, cols) {
            Ok(grid) => {
                self.search_view.set_grid(grid);
                let mut result = CmdResult::default();
                result.add_message(CmdMessage::success(format!(
                    "Search grid set to {}x{}",
                    grid.rows, grid.cols
                )));
                self.finish(Ok(result))
            }
            Err(e) => self.fail(e),
        }
    }

    pub fn create_binder(&mut self, name: &str) -> Result<CmdResult> {
        let user = self.session.user.clone();
        let result = commands::binders::create(&mut self.store, &user, name);
        self.finish(result)
    }

    /// Deletes a binder. Deleting the open one switches to the first binder left.
    pub fn delete_binder(&mut self, name: &str) -> Result<CmdResult> {
        let user = self.session.user.clone();
        let result = commands::binders::delete(&mut self.store, &user, name);
        let result = self.finish(result)?;
        if self.session.binder == name {
            let session = self.store.session_for(Some(&user), None)?;
            self.switch_session(session);
        }
        Ok(result)
    }

    pub fn list_binders(&self) -> Result<CmdResult> {
        commands::binders::list(&self.store, &self.session.user)
    }

    // --- Moves ---

    /// Drops the card at display position `from` onto display position `to`.
    /// A position with no slot behind it is an unresolved target: no-op.
    pub fn move_card(&mut self, from: usize, to: usize) -> Result<CmdResult> {
        let (Some(from), Some(to)) = (
            self.binder_view.raw_index(from),
            self.binder_view.raw_index(to),
        ) else {
            return Ok(CmdResult::default());
        };
        let result =
            commands::moves::move_card(&mut self.store, &self.session, MoveOrigin::Binder(from), to);
        self.finish(result)
    }

    /// Drops search result `search_position` onto binder display position `to`.
    pub fn drop_from_search(&mut self, search_position: usize, to: usize) -> Result<CmdResult> {
        let card = self.search_card(search_position)?;
        let Some(to) = self.binder_view.raw_index(to) else {
            return Ok(CmdResult::default());
        };
        let result = commands::moves::move_card(
            &mut self.store,
            &self.session,
            MoveOrigin::External(card),
            to,
        );
        self.finish(result)
    }

    /// Moves the card at display position `from` to the first free slot of `page`.
    pub fn move_to_page(&mut self, from: usize, page: usize) -> Result<CmdResult> {
        let Some(from) = self.binder_view.raw_index(from) else {
            return Ok(CmdResult::default());
        };
        let result = commands::moves::move_to_page(
            &mut self.store,
            &self.session,
            MoveOrigin::Binder(from),
            page,
        );
        self.finish(result)
    }

    // --- Filters ---

    /// Live edit of the binder filter. Applied after the debounce delay.
    pub fn set_binder_query(&mut self, query: &str) -> Result<()> {
        let query = query.to_string();
        self.binder_filter
            .schedule(&self.poster, move |app: &mut Self| {
                app.apply_binder_query(&query)
            })
    }

    /// Applies the binder filter immediately.
    pub fn set_binder_query_now(&mut self, query: &str) {
        self.binder_filter.cancel();
        self.apply_binder_query(query);
    }

    /// Live edit of the search pane filter. Applied after the debounce delay.
    pub fn set_search_query(&mut self, query: &str) -> Result<()> {
        let query = query.to_string();
        self.search_filter
            .schedule(&self.poster, move |app: &mut Self| {
                app.search_view.set_query(&query)
            })
    }

    pub fn set_search_query_now(&mut self, query: &str) {
        self.search_filter.cancel();
        self.search_view.set_query(query);
    }

    fn apply_binder_query(&mut self, query: &str) {
        match (self.store.slots(&self.session), self.store.layout(&self.session)) {
            (Ok(slots), Ok(layout)) => self.binder_view.set_query(query, slots, &layout),
            (Err(e), _) | (_, Err(e)) => warn!("Cannot filter {}: {}", self.session.binder, e),
        }
    }

    // --- Catalog ---

    /// Loads a set into the search pane on a worker.
    pub fn load_set(&mut self, query: &str) -> Result<()> {
        let query = query.trim().to_string();
        let catalog = Arc::clone(&self.catalog);
        self.status = Some(CmdMessage::info(format!("Loading set '{}'...", query)));
        self.request("catalog-set", move || {
            CatalogResult::Set(catalog::load_set(catalog.as_ref(), &query))
        })
    }

    /// Searches cards by name into the search pane on a worker.
    pub fn search_cards(&mut self, query: &str) -> Result<()> {
        let query = query.trim().to_string();
        let catalog = Arc::clone(&self.catalog);
        self.status = Some(CmdMessage::info(format!("Searching for '{}'...", query)));
        self.request("catalog-search", move || {
            let found = catalog::search_cards(catalog.as_ref(), &query);
            CatalogResult::Search(query, found)
        })
    }

    fn request<J>(&mut self, name: &str, job: J) -> Result<()>
    where
        J: FnOnce() -> CatalogResult + Send + 'static,
    {
        let token = self.requests.issue();
        spawn_worker(&self.poster, name, job, move |app: &mut Self, found| {
            app.apply_catalog_result(token, found)
        })?;
        self.in_flight += 1;
        Ok(())
    }

    fn apply_catalog_result(&mut self, token: RequestToken, found: CatalogResult) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if !self.requests.is_current(token) {
            debug!("Dropping stale catalog result {:?}", token);
            return;
        }
        match found {
            CatalogResult::Set(Ok((set, cards))) => {
                let message = format!("Loaded {} ({} cards)", set.name, cards.len());
                self.search_view.replace(Some(set), cards);
                self.status = Some(CmdMessage::success(message));
            }
            CatalogResult::Search(query, Ok(cards)) => {
                let message = format!("{} card(s) found for '{}'", cards.len(), query);
                self.search_view.replace(None, cards);
                self.status = Some(CmdMessage::success(message));
            }
            CatalogResult::Set(Err(e)) | CatalogResult::Search(_, Err(e)) => {
                warn!("Catalog request failed: {}", e);
                self.status = Some(CmdMessage::error(format!("Catalog unavailable: {}", e)));
            }
        }
    }

    /// Progress of the binder against the loaded set.
    pub fn progress(&self) -> Result<Option<SetProgress>> {
        let Some(set) = self.search_view.loaded_set() else {
            return Ok(None);
        };
        Ok(Some(commands::progress::run(
            self.slots()?,
            &set.id,
            &set.name,
            self.search_view.cards().len(),
        )))
    }

    /// Marketplace link for the card at binder display position `position`.
    pub fn buy_url(&self, position: usize) -> Result<String> {
        let card = self
            .binder_view
            .raw_index(position)
            .and_then(|index| self.slots().ok()?.get(index)?.card().cloned())
            .ok_or_else(|| {
                BinderError::Validation(format!("No card at position {}", position + 1))
            })?;
        catalog::buy_url(&card)
    }

    // --- Images ---

    /// Fetches and renders the image of the card at display `position` on a
    /// worker. Returns false when there is nothing to fetch.
    pub fn request_slot_image(&mut self, position: usize, width: u32) -> Result<bool> {
        let Some(cache) = self.images.clone() else {
            return Ok(false);
        };
        let layout = self.layout()?;
        let Some(index) = self.binder_view.raw_index(position) else {
            return Ok(false);
        };
        let Some(card) = self.slots()?.get(index).and_then(Slot::card).cloned() else {
            return Ok(false);
        };
        let dimmed = layout.is_overflow(index);

        let card_id = card.id.clone();
        spawn_worker(
            &self.poster,
            "image-fetch",
            move || cache.get(&card.id, &card.image, width, dimmed),
            move |app: &mut Self, image| app.apply_slot_image(index, card_id, image),
        )?;
        self.in_flight += 1;
        Ok(true)
    }

    fn apply_slot_image(&mut self, index: usize, card_id: String, image: Option<RgbImage>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let still_there = self
            .slots()
            .ok()
            .and_then(|slots| slots.get(index)?.card().map(|c| c.id == card_id))
            .unwrap_or(false);
        if !still_there {
            debug!("Slot {} changed, dropping image for {}", index, card_id);
            return;
        }
        match image {
            Some(image) => {
                self.slot_images.insert(index, SlotImage { card_id, image });
            }
            None => {
                self.slot_images.remove(&index);
            }
        }
    }

    /// The rendered image for raw slot `index`, if it still matches the slot.
    pub fn slot_image(&self, index: usize) -> Option<&RgbImage> {
        let entry = self.slot_images.get(&index)?;
        let current = self.slots().ok()?.get(index)?.card()?;
        (current.id == entry.card_id).then_some(&entry.image)
    }

    // --- Internals ---

    fn search_card(&mut self, position: usize) -> Result<Card> {
        match self.search_view.card_at(position) {
            Some(card) => Ok(card.clone()),
            None => {
                let e = BinderError::Validation(format!(
                    "No search result at position {}",
                    position + 1
                ));
                self.status = Some(CmdMessage::error(e.to_string()));
                Err(e)
            }
        }
    }

    fn refresh_binder(&mut self) {
        match (self.store.slots(&self.session), self.store.layout(&self.session)) {
            (Ok(slots), Ok(layout)) => self.binder_view.refresh(slots, &layout),
            (Err(e), _) | (_, Err(e)) => warn!("Cannot refresh {}: {}", self.session.binder, e),
        }
    }

    /// Re-derives the binder view and records the status of a command.
    fn finish(&mut self, result: Result<CmdResult>) -> Result<CmdResult> {
        match result {
            Ok(result) => {
                self.refresh_binder();
                if let Some(message) = result.status() {
                    self.status = Some(message.clone());
                }
                Ok(result)
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, e: BinderError) -> Result<CmdResult> {
        self.status = Some(CmdMessage::error(e.to_string()));
        Err(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::fixtures::FakeImageSource;
    use crate::catalog::fixtures::StaticCatalog;
    use crate::commands::MessageLevel;
    use crate::store::memory::fixtures::{card, names};
    use crate::store::mem_backend::MemBackend;
    use crate::store::memory::InMemoryStore;
    use std::time::Duration;
    use tempfile::TempDir;

    const WAIT: Duration = Duration::from_secs(5);

    type TestApp = BinderApp<MemBackend>;

    fn app_with(catalog: StaticCatalog) -> (MainContext<TestApp>, TestApp) {
        let main = MainContext::new();
        let config = BinderConfig {
            filter_debounce_ms: 30,
            ..BinderConfig::default()
        };
        let app = BinderApp::new(InMemoryStore::new(), &main, Arc::new(catalog), &config).unwrap();
        (main, app)
    }

    fn app() -> (MainContext<TestApp>, TestApp) {
        app_with(StaticCatalog::new().with_set("sv08", "Surging Sparks", 5))
    }

    fn slot_names(app: &TestApp) -> Vec<String> {
        names(app.slots().unwrap())
    }

    fn settle(main: &MainContext<TestApp>, app: &mut TestApp) {
        assert!(main.run_until(app, |a| a.is_idle(), WAIT));
    }

    #[test]
    fn new_app_opens_the_default_binder() {
        let (_main, app) = app();
        assert_eq!(app.session().user, "default");
        assert_eq!(app.session().binder, "Main Binder");
        let page = app.binder_page().unwrap();
        assert_eq!(page.page_count, 10);
        assert_eq!(page.cells.len(), 9);
    }

    #[test]
    fn tenth_card_asks_for_confirmation_on_a_full_binder() {
        let (_main, mut app) = app();
        app.apply_layout("3", "3", "1").unwrap();
        for n in 1..=9 {
            app.add_card(card(n, &format!("Card {}", n)), false).unwrap();
        }
        let result = app.add_card(card(10, "Card 10"), false).unwrap();
        assert!(result.needs_confirmation());
        assert_eq!(app.slots().unwrap().len(), 9);

        app.add_card(card(10, "Card 10"), true).unwrap();
        let layout = app.layout().unwrap();
        assert!(layout.is_overflow(9));
        assert!((0..9).all(|i| !layout.is_overflow(i)));
    }

    #[test]
    fn load_set_fills_the_search_pane_and_adds_it() {
        let (main, mut app) = app();
        app.load_set("surging").unwrap();
        settle(&main, &mut app);

        let page = app.search_page();
        assert_eq!(page.set.unwrap().id, "sv08");
        assert_eq!(page.total, 5);

        app.add_search_result(1, false).unwrap();
        assert_eq!(slot_names(&app), vec!["Surging Sparks #2"]);
        assert_eq!(app.progress().unwrap().unwrap().to_string(), "Surging Sparks: 1/5");

        app.add_loaded_set(false).unwrap();
        assert_eq!(app.slots().unwrap().len(), 6);
    }

    #[test]
    fn failed_catalog_request_leaves_state_untouched() {
        let (main, mut app) = app_with(StaticCatalog::new().offline());
        app.load_set("anything").unwrap();
        settle(&main, &mut app);
        assert!(app.search_view().loaded_set().is_none());
        assert_eq!(app.status().unwrap().level, MessageLevel::Error);
    }

    #[test]
    fn stale_catalog_result_is_dropped() {
        let catalog = StaticCatalog::new()
            .with_set("sv07", "Stellar Crown", 2)
            .with_set("sv08", "Surging Sparks", 3)
            .with_delay("stellar", Duration::from_millis(150));
        let (main, mut app) = app_with(catalog);

        app.load_set("stellar").unwrap();
        app.load_set("surging").unwrap();
        settle(&main, &mut app);

        assert_eq!(app.search_view().loaded_set().unwrap().id, "sv08");
        assert_eq!(app.search_view().cards().len(), 3);
    }

    #[test]
    fn moves_swap_within_the_binder() {
        let (_main, mut app) = app();
        for (n, name) in ["A", "B", "C", "D"].iter().enumerate() {
            app.add_card(card(n + 1, name), false).unwrap();
        }
        app.remove_card(2).unwrap();
        assert_eq!(slot_names(&app), vec!["A", "B", "empty", "D"]);

        app.move_card(0, 3).unwrap();
        assert_eq!(slot_names(&app), vec!["D", "B", "empty", "A"]);
    }

    #[test]
    fn filtered_positions_map_to_raw_slots() {
        let (_main, mut app) = app();
        for (n, name) in ["Pikachu", "Zapdos", "Pikachu ex"].iter().enumerate() {
            app.add_card(card(n + 1, name), false).unwrap();
        }
        app.set_binder_query_now("pika");
        app.move_card(1, 0).unwrap();
        assert_eq!(slot_names(&app), vec!["Pikachu ex", "Zapdos", "Pikachu"]);

        // Nothing displayed at position 5 under this filter.
        let result = app.move_card(0, 5).unwrap();
        assert!(result.messages.is_empty());
        assert_eq!(slot_names(&app), vec!["Pikachu ex", "Zapdos", "Pikachu"]);
    }

    #[test]
    fn huge_layouts_and_far_moves_are_rejected() {
        let (_main, mut app) = app();
        app.add_card(card(1, "A"), false).unwrap();
        let before = app.layout().unwrap();

        let err = app
            .apply_layout("4294967296", "4294967296", "2")
            .unwrap_err();
        assert!(matches!(err, BinderError::Validation(_)));
        assert_eq!(app.layout().unwrap(), before);

        assert!(app.move_card(0, usize::MAX - 1).is_err());
        assert!(app.move_to_page(0, usize::MAX).is_err());
        assert_eq!(slot_names(&app), vec!["A"]);
        assert_eq!(app.status().unwrap().level, MessageLevel::Error);
    }

    #[test]
    fn drop_from_search_overwrites_target() {
        let (main, mut app) = app();
        app.add_card(card(1, "Keep"), false).unwrap();
        app.search_cards("#3").unwrap();
        settle(&main, &mut app);

        app.drop_from_search(0, 4).unwrap();
        assert_eq!(
            slot_names(&app),
            vec!["Keep", "empty", "empty", "empty", "Surging Sparks #3"]
        );
    }

    #[test]
    fn move_to_page_keeps_current_page() {
        let (_main, mut app) = app();
        app.apply_layout("1", "2", "3").unwrap();
        for n in 1..=3 {
            app.add_card(card(n, &format!("C{}", n)), false).unwrap();
        }
        app.go_to_page(2).unwrap();
        app.move_to_page(2, 3).unwrap();
        assert_eq!(app.binder_view().page(), 2);
        assert_eq!(slot_names(&app), vec!["C1", "C2", "empty", "empty", "C3"]);
    }

    #[test]
    fn debounced_binder_filter_applies_last_edit_once() {
        let (main, mut app) = app();
        app.add_card(card(1, "Pikachu"), false).unwrap();
        app.add_card(card(2, "Zapdos"), false).unwrap();
        app.go_to_page(3).unwrap();

        for partial in ["z", "za", "zap"] {
            app.set_binder_query(partial).unwrap();
        }
        assert_eq!(app.binder_view().query(), "");
        assert!(main.run_until(&mut app, |a| a.binder_view().query() == "zap", WAIT));
        assert_eq!(app.binder_view().page(), 1);
        assert_eq!(app.binder_view().displayed().len(), 1);
    }

    #[test]
    fn deleting_the_open_binder_switches_to_another() {
        let (_main, mut app) = app();
        app.create_binder("Trades").unwrap();
        app.select_binder("Trades").unwrap();
        app.delete_binder("Trades").unwrap();
        assert_eq!(app.session().binder, "Main Binder");

        assert!(app.delete_binder("Main Binder").is_err());
        assert_eq!(app.store().binder_names("default").unwrap().len(), 1);
    }

    #[test]
    fn invalid_layout_keeps_the_previous_one() {
        let (_main, mut app) = app();
        assert!(app.apply_layout("0", "3", "2").is_err());
        assert_eq!(app.layout().unwrap(), Layout::default());
        assert_eq!(app.status().unwrap().level, MessageLevel::Error);
    }

    #[test]
    fn login_switches_profile() {
        let (_main, mut app) = app();
        app.create_profile("ash", "pikachu").unwrap();
        assert!(app.login("ash", "wrong").is_err());
        app.login("ash", "pikachu").unwrap();
        assert_eq!(app.session().user, "ash");
        app.set_theme(false).unwrap();
        assert!(!app.dark_mode());
    }

    #[test]
    fn slot_image_is_kept_only_for_the_same_card() {
        let temp = TempDir::new().unwrap();
        let (main, app) = app();
        let cache = ImageCache::new(
            temp.path().join("card_cache"),
            10,
            Arc::new(FakeImageSource::new()),
        );
        let mut app = app.with_images(Arc::new(cache));
        app.add_card(card(1, "Pikachu"), false).unwrap();

        assert!(app.request_slot_image(0, 40).unwrap());
        settle(&main, &mut app);
        assert_eq!(app.slot_image(0).unwrap().dimensions(), (40, 56));

        app.remove_card(0).unwrap();
        assert!(app.slot_image(0).is_none());
        assert!(!app.request_slot_image(0, 40).unwrap());
    }

    #[test]
    fn buy_url_for_a_binder_card() {
        let (_main, mut app) = app();
        app.add_card(card(25, "Pikachu ex"), false).unwrap();
        assert!(app.buy_url(0).unwrap().ends_with("Pikachu+ex+SV08"));
        assert!(app.buy_url(3).is_err());
    }
}
