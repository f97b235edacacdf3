//! Quote Simulation API Library
//!
//! Lead capture for an insurance brokerage: a public quote-simulation form,
//! the confirmation payload shown after it, and a password-protected admin
//! dashboard that lists and aggregates submitted simulations. Storage and
//! authentication live in a hosted backend reached over REST.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Form, dashboard and auth logic.
//! - `integrations`: Hosted backend clients.
//! - `auth_guard`: Login flow and the require-admin guard.
//! - `backend`: Data-access trait injected into every component.
//! - `catalog`: Plan and partner catalogs.
//! - `config`: Configuration management.
//! - `dashboard`: Stats aggregation and filtering.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and router.
//! - `memory_backend`: In-memory backend for tests.
//! - `models`: Records and request/response models.
//! - `obs`: Tracing setup and log fingerprinting.
//! - `quote_form`: Form state, validation and submission.
//! - `supabase_client`: REST client for the hosted backend.

pub mod api;
pub mod core;
pub mod integrations;

pub mod auth_guard;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod handlers;
pub mod memory_backend;
pub mod models;
pub mod obs;
pub mod quote_form;
pub mod supabase_client;
