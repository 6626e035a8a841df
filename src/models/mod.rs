//! Core data models for the backup monitor.
//!
//! These types describe what a single check sees (object keys, parsed
//! manifests, the triggering event) and what it produces (a notification
//! and the outcome returned to the caller). None of them are persisted.

pub mod event;
pub mod manifest;
pub mod notification;
