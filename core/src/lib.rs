//! ZapCampanhas analytics engine.
//!
//! DATA FLOW (one direction, no shared state between calls):
//!   1. loader     raw CSV/spreadsheet files → typed rows per dataset role
//!   2. derive     cleaned phones, first names, canonical neighborhoods
//!   3. segment    new / inactive / high-ticket customers, geography, products
//!   4. report     one CSV or spreadsheet file per result
//!
//! `pipeline` runs the standard reports in a fixed order; `insights` and
//! `query` sit on top of the segment results. `leads` exports the roster as
//! WhatsApp click-to-chat lists.

pub mod config;
pub mod derive;
pub mod error;
pub mod insights;
pub mod leads;
pub mod loader;
pub mod normalizer;
pub mod pipeline;
pub mod query;
pub mod records;
pub mod report;
pub mod segment;
pub mod types;
