use crate::layout::Layout;
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted id of the empty sentinel. Only the serialization boundary knows it.
pub const EMPTY_SLOT_ID: &str = "empty";
const EMPTY_SLOT_NAME: &str = "Empty Slot";

pub const DEFAULT_USER: &str = "default";
pub const DEFAULT_BINDER: &str = "Main Binder";

/// Separators that split a card identifier into set prefix and local number.
const ID_SEPARATORS: &[char] = &['-', '_', '/'];

/// A card record as returned by the catalog.
///
/// The derived card number is computed on first use and memoized on the
/// record; it is neither persisted nor part of equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub set_name: String,
    #[serde(default)]
    pub set_id: String,
    #[serde(skip)]
    number: OnceCell<Option<String>>,
}

impl Card {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        image: impl Into<String>,
        set_name: impl Into<String>,
        set_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: image.into(),
            set_name: set_name.into(),
            set_id: set_id.into(),
            number: OnceCell::new(),
        }
    }

    /// The card's number as the digit run found in its id or image locator.
    pub fn number(&self) -> Option<&str> {
        self.number
            .get_or_init(|| derive_card_number(&self.id, &self.image, &self.set_id))
            .as_deref()
    }

    /// Numeric sort key; `None` means unknown and sorts last.
    pub fn number_value(&self) -> Option<u64> {
        self.number().and_then(|digits| digits.parse().ok())
    }

    pub fn is_number_derived(&self) -> bool {
        self.number.get().is_some()
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.image == other.image
            && self.set_name == other.set_name
            && self.set_id == other.set_id
    }
}

impl Eq for Card {}

/// Extracts the card number: the trailing digit run of the identifier's last
/// segment, or failing that of the locator's file name or the folder just
/// above it. A folder naming the card's set (`.../sv08/low.jpg`) is not a number.
pub fn derive_card_number(id: &str, image: &str, set_id: &str) -> Option<String> {
    let last_segment = id.rsplit(ID_SEPARATORS).next().unwrap_or(id);
    if let Some(digits) = trailing_digits(last_segment) {
        return Some(digits.to_string());
    }

    let names_set = |segment: &str| {
        (!set_id.is_empty() && segment.eq_ignore_ascii_case(set_id))
            || id
                .rsplit(ID_SEPARATORS)
                .skip(1)
                .any(|part| part.eq_ignore_ascii_case(segment))
    };
    let path = image.split(&['?', '#'][..]).next().unwrap_or("");
    path.rsplit('/')
        .take(2)
        .map(|segment| segment.split('.').next().unwrap_or(segment))
        .filter(|segment| !names_set(segment))
        .find_map(trailing_digits)
        .map(str::to_string)
}

fn trailing_digits(segment: &str) -> Option<&str> {
    let start = segment
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    Some(&segment[start..])
}

/// One position in a binder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SlotRecord", into = "SlotRecord")]
pub enum Slot {
    Empty,
    Card(Card),
}

impl Slot {
    pub fn card(&self) -> Option<&Card> {
        match self {
            Slot::Card(card) => Some(card),
            Slot::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }
}

impl From<Card> for Slot {
    fn from(card: Card) -> Self {
        Slot::Card(card)
    }
}

/// On-disk shape of a slot: a card record, or the sentinel with id "empty".
#[derive(Serialize, Deserialize)]
struct SlotRecord {
    id: String,
    name: String,
    #[serde(default)]
    image: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    set_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    set_id: String,
}

impl From<SlotRecord> for Slot {
    fn from(record: SlotRecord) -> Self {
        if record.id == EMPTY_SLOT_ID {
            return Slot::Empty;
        }
        Slot::Card(Card::new(
            record.id,
            record.name,
            record.image,
            record.set_name,
            record.set_id,
        ))
    }
}

impl From<Slot> for SlotRecord {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::Empty => SlotRecord {
                id: EMPTY_SLOT_ID.to_string(),
                name: EMPTY_SLOT_NAME.to_string(),
                image: String::new(),
                set_name: String::new(),
                set_id: String::new(),
            },
            Slot::Card(card) => SlotRecord {
                id: card.id,
                name: card.name,
                image: card.image,
                set_name: card.set_name,
                set_id: card.set_id,
            },
        }
    }
}

fn default_dark_mode() -> bool {
    true
}

/// A profile and everything it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub binders: BTreeMap<String, Vec<Slot>>,
    #[serde(default)]
    pub binder_order: Vec<String>,
    #[serde(default)]
    pub binder_settings: BTreeMap<String, Layout>,
    #[serde(default = "default_dark_mode")]
    pub dark_mode: bool,
}

impl User {
    pub fn new(password: impl Into<String>) -> Self {
        let mut user = Self {
            password: password.into(),
            binders: BTreeMap::new(),
            binder_order: Vec::new(),
            binder_settings: BTreeMap::new(),
            dark_mode: default_dark_mode(),
        };
        user.insert_binder(DEFAULT_BINDER);
        user
    }

    pub fn insert_binder(&mut self, name: &str) {
        self.binders.insert(name.to_string(), Vec::new());
        self.binder_order.push(name.to_string());
        self.binder_settings
            .insert(name.to_string(), Layout::default());
    }

    pub fn layout(&self, binder: &str) -> Layout {
        self.binder_settings
            .get(binder)
            .copied()
            .unwrap_or_default()
    }

    /// Repairs a loaded record: the order lists exactly the stored binders,
    /// every binder has a valid layout, and at least one binder exists.
    /// Returns true if anything changed.
    pub fn normalize(&mut self) -> bool {
        let before = self.clone();

        let binders = &self.binders;
        self.binder_order.retain(|name| binders.contains_key(name));
        let mut seen = std::collections::HashSet::new();
        self.binder_order.retain(|name| seen.insert(name.clone()));
        for name in self.binders.keys() {
            if !self.binder_order.contains(name) {
                self.binder_order.push(name.clone());
            }
        }

        let binders = &self.binders;
        self.binder_settings
            .retain(|name, layout| binders.contains_key(name) && layout.is_valid());
        for name in self.binders.keys() {
            self.binder_settings.entry(name.clone()).or_default();
        }

        if self.binders.is_empty() {
            self.insert_binder(DEFAULT_BINDER);
        }

        *self != before
    }
}

/// All persisted profiles, keyed by user name.
pub type Collection = BTreeMap<String, User>;

/// Who is acting and on which binder. Every store, layout and move operation
/// is addressed through one of these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Session {
    pub user: String,
    pub binder: String,
}

impl Session {
    pub fn new(user: impl Into<String>, binder: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            binder: binder.into(),
        }
    }
}
