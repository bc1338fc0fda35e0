//! # tcgbinder Architecture
//!
//! tcgbinder is a **UI-agnostic trading-card binder library**: a paginated,
//! fixed-capacity grid of slots that mirrors a physical binder, filled from an
//! online card catalog. The `binder` terminal client is one client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, renders pages, handles terminal I/O    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs) on the main context (runtime.rs)        │
//! │  - Session, derived views, display position translation     │
//! │  - Schedules catalog/image workers and filter debounce      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Binder mutations with write-through persistence          │
//! │  - Built on the layout, move and filter engines             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - StorageBackend trait: FsBackend, MemBackend              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The catalog ([`catalog`]) and image cache ([`cache`]) sit beside the
//! layers: only workers call them, and only the API hands their results to
//! the rest of the crate.
//!
//! ## Threading
//!
//! One thread owns every piece of mutable state. Network work runs on worker
//! threads that post their results back; nothing is shared behind a lock.
//! See [`runtime`].
//!
//! ## Module Overview
//!
//! - [`api`]: The facade, entry point for all operations
//! - [`commands`]: Business logic for each mutation
//! - [`store`]: Persistence abstraction and implementations
//! - [`model`]: Cards, slots, users, sessions
//! - [`layout`]: Page arithmetic and overflow classification
//! - [`moves`]: Swap and move-to-page relocation
//! - [`filter`]: Name and card-number queries
//! - [`view`]: Derived binder and search pages
//! - [`runtime`]: Main context, workers, request tokens, debounce
//! - [`catalog`]: Card catalog trait and the TCGdex client
//! - [`cache`]: Bounded on-disk image cache
//! - [`config`]: Configuration management
//! - [`init`]: Data directory and context setup
//! - [`error`]: Error types

pub mod api;
pub mod cache;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod init;
pub mod layout;
pub mod model;
pub mod moves;
pub mod runtime;
pub mod store;
pub mod view;
