//! Checklist - task and list lifecycle engine for a personal checklist
//!
//! This library implements the core of a per-user checklist: standalone tasks
//! and named lists of tasks that move between an active and an archived
//! partition, with completion cascades, search, progress counters and a
//! mirror of the user's document kept in sync with a remote store.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`model`] - Tasks, lists and the per-user document
//! * [`lifecycle`] - Completion, archive and restore transitions
//! * [`views`] - Partitioned, searchable views and counters
//! * [`store`] - Remote document store abstraction
//! * [`sync`] - Local mirror and write-back
//! * [`identity`] - Accounts and authentication
//! * [`app`] - Application state machine

/// Application state machine tying identity, sync and views together
pub mod app;

/// Configuration module for managing application settings
pub mod config;

/// Application constants and default values
pub mod constants;

/// Identity provider abstraction and in-memory implementation
pub mod identity;

/// Lifecycle transitions for tasks and lists
pub mod lifecycle;

/// Logging utilities for debugging and error tracking
pub mod logger;

/// Data model of the checklist document
pub mod model;

/// Per-user document stores
pub mod store;

/// Synchronization between the local mirror and the document store
pub mod sync;

/// Utility functions for date/time handling
pub mod utils;

/// Filtering, search and aggregation over the document
pub mod views;
