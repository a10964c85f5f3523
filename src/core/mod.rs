//! # Core Application Logic
//!
//! This module contains the council client's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Transcript + turns   │
//!                    │  • Composer             │
//!                    │  • State / Action       │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    │  No I/O. No UI. Pure.   │
//!                    └───────────┬─────────────┘
//!                                │
//!                 ┌──────────────┴──────────────┐
//!                 ▼                             ▼
//!          ┌────────────┐                ┌────────────┐
//!          │    TUI     │                │ Transport  │
//!          │  Adapter   │                │  (reqwest) │
//!          │ (ratatui)  │                │            │
//!          └────────────┘                └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`stage`]: Stage ids, payloads and the per-stage state machine
//! - [`turn`]: User and assistant turns
//! - [`transcript`]: The ordered turn list and the only place that mutates it
//! - [`composer`]: Draft text, attachment selection and submit rules
//! - [`state`]: The `App` struct, all application state in one place
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`config`]: Layered configuration

pub mod action;
pub mod composer;
pub mod config;
pub mod stage;
pub mod state;
pub mod transcript;
pub mod turn;
