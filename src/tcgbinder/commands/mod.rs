//! # Command Layer
//!
//! The **core business logic** of the binder. Each command lives in its own
//! submodule and is a plain function over a [`CollectionStore`] and a
//! [`Session`](crate::model::Session).
//!
//! ## Role and Responsibilities
//!
//! Commands:
//! - Validate their inputs and leave state untouched when validation fails
//! - Mutate the addressed slot sequence in place
//! - Persist immediately (write-through, see [`helpers::write_through`])
//! - Return a structured [`CmdResult`]
//!
//! ## What Commands Do NOT Do
//!
//! - **Any terminal I/O**: no stdout or stderr
//! - **User interaction**: a capacity confirmation is returned as data in
//!   [`CmdResult::confirmation`]; the caller asks and calls again
//! - **View bookkeeping**: re-deriving the filtered view is the API's job
//!
//! ## Failure model
//!
//! Hard failures (unknown binder, invalid layout, deleting the last binder)
//! are `Err` and change nothing. A failed save is *not* an `Err`: the
//! in-memory change stands and the result carries an error-level message.
//!
//! [`CollectionStore`]: crate::store::CollectionStore

use crate::config::BinderConfig;
use crate::model::Card;

pub mod binders;
pub mod cards;
pub mod config;
pub mod helpers;
pub mod layout;
pub mod moves;
pub mod profile;
pub mod progress;
pub mod sort;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// An add that would run past the binder's declared capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityPrompt {
    pub adding: usize,
    pub capacity: usize,
    /// Slot index of the last card the add would place.
    pub last_index: usize,
}

impl CapacityPrompt {
    pub fn question(&self) -> String {
        format!(
            "Adding {} card(s) goes beyond this binder's capacity of {} slots. Add anyway?",
            self.adding, self.capacity
        )
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_cards: Vec<Card>,
    /// Raw slot indexes touched by the command.
    pub slot_indexes: Vec<usize>,
    pub binders: Vec<String>,
    pub config: Option<BinderConfig>,
    pub confirmation: Option<CapacityPrompt>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_cards(mut self, cards: Vec<Card>) -> Self {
        self.affected_cards = cards;
        self
    }

    pub fn with_slot_indexes(mut self, indexes: Vec<usize>) -> Self {
        self.slot_indexes = indexes;
        self
    }

    pub fn with_binders(mut self, binders: Vec<String>) -> Self {
        self.binders = binders;
        self
    }

    pub fn with_config(mut self, config: BinderConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_confirmation(mut self, prompt: CapacityPrompt) -> Self {
        self.confirmation = Some(prompt);
        self
    }

    /// True when the command stopped to ask for a capacity confirmation.
    pub fn needs_confirmation(&self) -> bool {
        self.confirmation.is_some()
    }

    /// The message a client shows on its status line.
    pub fn status(&self) -> Option<&CmdMessage> {
        self.messages.last()
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }
}
