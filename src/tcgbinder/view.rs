//! # Derived Views
//!
//! A view is a recomputed snapshot over data it does not own: [`BinderView`]
//! over the active binder's slot sequence in the store, [`SearchView`] over
//! the cards of the loaded set or the last name search. Views never write
//! back; the store remains the only owner of a binder.
//!
//! Both views keep a 1-based page that never drops below 1 or past the last
//! page. Editing a view's query sends it back to page 1; refreshing it after a
//! store mutation keeps the page (clamped).

use crate::catalog::SetSummary;
use crate::filter::{filter_cards, filter_slots, DisplaySlot, Query};
use crate::layout::{GridSize, Layout};
use crate::model::{Card, Slot};

/// What a client draws in one pocket of the visible binder page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCell {
    /// A card, with its raw binder index. `overflow` marks cards beyond the
    /// declared capacity.
    Card {
        position: usize,
        index: usize,
        card: Card,
        overflow: bool,
    },
    /// An empty pocket inside the declared capacity.
    Blank {
        position: usize,
        page: usize,
        slot_number: usize,
    },
    /// Nothing to show: past the capacity, or past the end of a filtered list.
    Void { position: usize },
}

impl PageCell {
    pub fn position(&self) -> usize {
        match self {
            PageCell::Card { position, .. }
            | PageCell::Blank { position, .. }
            | PageCell::Void { position } => *position,
        }
    }

    pub fn card(&self) -> Option<&Card> {
        match self {
            PageCell::Card { card, .. } => Some(card),
            _ => None,
        }
    }
}

fn clamp_page(page: usize, page_count: usize) -> usize {
    page.clamp(1, page_count.max(1))
}

fn stepped(page: usize, delta: isize) -> usize {
    if delta < 0 {
        page.saturating_sub(delta.unsigned_abs())
    } else {
        page.saturating_add(delta.unsigned_abs())
    }
}

#[derive(Debug, Clone)]
pub struct BinderView {
    query: String,
    displayed: Vec<DisplaySlot>,
    page: usize,
}

impl Default for BinderView {
    fn default() -> Self {
        Self {
            query: String::new(),
            displayed: Vec::new(),
            page: 1,
        }
    }
}

impl BinderView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn displayed(&self) -> &[DisplaySlot] {
        &self.displayed
    }

    pub fn is_filtered(&self) -> bool {
        !Query::parse(&self.query).is_all()
    }

    /// Re-derives the displayed slots after the store changed.
    pub fn refresh(&mut self, slots: &[Slot], layout: &Layout) {
        self.displayed = filter_slots(slots, &self.query);
        self.page = clamp_page(self.page, self.page_count(layout));
    }

    /// Applies a new query and returns to page 1.
    pub fn set_query(&mut self, query: &str, slots: &[Slot], layout: &Layout) {
        self.query = query.to_string();
        self.page = 1;
        self.refresh(slots, layout);
    }

    pub fn page_count(&self, layout: &Layout) -> usize {
        layout.page_count(self.displayed.len())
    }

    pub fn go_to(&mut self, page: usize, layout: &Layout) -> usize {
        self.page = clamp_page(page, self.page_count(layout));
        self.page
    }

    pub fn step(&mut self, delta: isize, layout: &Layout) -> usize {
        self.go_to(stepped(self.page, delta), layout)
    }

    /// Maps a display position to a raw slot index.
    ///
    /// Unfiltered, positions are indexes, including ones past the end of the
    /// sequence. Filtered, only positions with a displayed slot resolve.
    pub fn raw_index(&self, position: usize) -> Option<usize> {
        if self.is_filtered() {
            self.displayed.get(position).map(|d| d.index)
        } else {
            Some(position)
        }
    }

    /// The pockets of the current page.
    pub fn cells(&self, layout: &Layout) -> Vec<PageCell> {
        layout
            .slots_for_page(self.page)
            .map(|position| match self.displayed.get(position) {
                Some(DisplaySlot {
                    index,
                    slot: Slot::Card(card),
                }) => PageCell::Card {
                    position,
                    index: *index,
                    card: card.clone(),
                    overflow: layout.is_overflow(*index),
                },
                Some(_) => self.blank_or_void(position, layout),
                None if !self.is_filtered() => self.blank_or_void(position, layout),
                None => PageCell::Void { position },
            })
            .collect()
    }

    fn blank_or_void(&self, position: usize, layout: &Layout) -> PageCell {
        if layout.is_overflow(position) {
            PageCell::Void { position }
        } else {
            PageCell::Blank {
                position,
                page: layout.page_of(position),
                slot_number: position + 1,
            }
        }
    }
}

/// The search pane: a loaded set or a name search, with its own filter.
#[derive(Debug, Clone)]
pub struct SearchView {
    set: Option<SetSummary>,
    cards: Vec<Card>,
    query: String,
    displayed: Vec<Card>,
    page: usize,
    grid: GridSize,
}

impl SearchView {
    pub fn new(grid: GridSize) -> Self {
        Self {
            set: None,
            cards: Vec::new(),
            query: String::new(),
            displayed: Vec::new(),
            page: 1,
            grid,
        }
    }

    /// Replaces the results, keeping the pane's filter. Back to page 1.
    pub fn replace(&mut self, set: Option<SetSummary>, cards: Vec<Card>) {
        self.set = set;
        self.cards = cards;
        self.page = 1;
        self.refresh();
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.page = 1;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.displayed = filter_cards(&self.cards, &self.query);
        self.page = clamp_page(self.page, self.page_count());
    }

    pub fn set_grid(&mut self, grid: GridSize) {
        self.grid = grid;
        self.page = clamp_page(self.page, self.page_count());
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn loaded_set(&self) -> Option<&SetSummary> {
        self.set.as_ref()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn displayed(&self) -> &[Card] {
        &self.displayed
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.grid.page_count(self.displayed.len())
    }

    pub fn go_to(&mut self, page: usize) -> usize {
        self.page = clamp_page(page, self.page_count());
        self.page
    }

    pub fn step(&mut self, delta: isize) -> usize {
        self.go_to(stepped(self.page, delta))
    }

    /// The card at a display position.
    pub fn card_at(&self, position: usize) -> Option<&Card> {
        self.displayed.get(position)
    }

    /// Display positions and cards of the current page.
    pub fn page_cards(&self) -> Vec<(usize, &Card)> {
        self.grid
            .slots_for_page(self.page)
            .filter_map(|position| self.displayed.get(position).map(|card| (position, card)))
            .collect()
    }
}
