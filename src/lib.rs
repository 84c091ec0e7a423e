//! # folio
//!
//! A command-line toolkit for acquiring scanned books and periodicals from
//! external archives, reconciling their page numbering, and producing the
//! paginated-index payloads consumed by a wiki proofreading platform.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌───────────────┐
//! │   Sources    │──▶│   PageList     │──▶│  Index page    │
//! │  IA / Hathi  │   │ append/clean/ │   │  <pagelist/>  │
//! │  label feeds │   │ strip/render  │   │   wikitext    │
//! └──────────────┘   └───────────────┘   └───────────────┘
//! ```
//!
//! The page-numbering core ([`pagelist`]) is pure and synchronous; the
//! source adapters and download pipeline around it are async glue over the
//! archives' HTTP APIs.
//!
//! ## Quick Start
//!
//! ```bash
//! folio pagelist --source ia --id work00test     # print the pagelist tag
//! folio download hathi uc1.b280676               # fetch page images
//! folio index --source ia --id work00test --title "Some Work"
//! folio select "1,4-7,22-end" --last 30          # expand a page selection
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`pagelist`] | Page-numbering reconciliation core |
//! | [`range_selection`] | Operator page-selection expressions |
//! | [`source`] | `ScanSource` trait and shared helpers |
//! | [`source_ia`] | Internet Archive adapter |
//! | [`source_ht`] | HathiTrust adapter |
//! | [`download`] | Page image acquisition |
//! | [`index_writer`] | Index page wikitext rendering |
//! | [`config`] | TOML configuration parsing |

pub mod config;
pub mod download;
pub mod index_writer;
pub mod models;
pub mod pagelist;
pub mod pagelist_cmd;
pub mod progress;
pub mod range_selection;
pub mod source;
pub mod source_ht;
pub mod source_ia;
pub mod sources;
