//! # Atestado Core
//!
//! Core logic for the medical leave certificate generator.
//!
//! This crate contains the form model and everything derived from it:
//! - Form state with the recomputed certificate text and start-date validation
//! - DD/MM/YYYY masking and calendar validation
//! - Portuguese number words for the days-off field
//! - Debounced CID (ICD-10) suggestion lookup
//! - Referral request ("interconsulta") sub-forms
//! - Printable certificate documents
//! - In-memory sessions
//!
//! **No API concerns**: HTTP routing and the CLI belong in `api-rest` and `atestado-cli`.

pub mod cid;
pub mod config;
pub mod constants;
pub mod date;
pub mod error;
pub mod form;
pub mod lookup;
pub mod notice;
pub mod print;
pub mod requests;
pub mod session;
pub mod template;
pub mod validation;
pub mod words;

pub use cid::{CidSearch, CidSuggestion, HttpCidSearch};
pub use config::CoreConfig;
pub use error::{AtestadoError, AtestadoResult};
pub use form::{FormData, FormField, FormState};
pub use lookup::{CidLookup, SuggestionState};
pub use notice::{Notice, NoticeKind};
pub use requests::{CharCounter, RequestCounters, RequestDetails, RequestField, RequestList};
pub use session::{Session, SessionStore, SessionView};
