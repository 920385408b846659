//! # Rackpress
//!
//! A static site builder for editorial sites. Content is arranged as a tree:
//! pages hold sections, sections hold racks, and racks hold articles through
//! hangers, each hanger carrying its own order and expiration date.
//!
//! # Architecture: Load, Assemble, Render
//!
//! ```text
//! 1. Load      content/site.toml  →  MemoryStore       (validated records)
//! 2. Assemble  store + today      →  RenderModel       (only what shows today)
//! 3. Render    RenderModel        →  dist/             (final HTML site)
//! ```
//!
//! Assembly is the heart of the crate. Given a page and a date it keeps an
//! article only if it is displayed, published and not expired; drops racks
//! with nothing left; drops empty sections unless they opt out of collapsing;
//! and splits what remains into regular and special sections. It is a pure
//! function of the store and the injected date, so a build can be reproduced
//! for any day with `--today`.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`model`] | Stored records: pages, sections, racks, hangers, articles, menus, comments |
//! | [`store`] | `site.toml` loading and validation, ordered queries, set-null deletes, moderation |
//! | [`assemble`] | Visibility predicate and page assembly into a serializable view model |
//! | [`generate`] | Renders pages, articles and racks to HTML with Maud |
//! | [`config`] | `config.toml` loading, validation, merging, and CSS generation |
//! | [`markdown`] | Markdown conversion behind a trait |
//! | [`iframe`] | Article embed resolution against an allow-list |
//! | [`slug`] | URL slug validation |
//! | [`output`] | CLI output formatting: content inventory and command results |
//!
//! # Design Decisions
//!
//! ## One TOML Store
//!
//! All content lives in `content/site.toml` as arrays of tables, one per
//! record type, linked by numeric ids. The file is diffable and reviewable in
//! a pull request, and needs no database. References are checked at load: a
//! reference is either absent or points at an existing record.
//!
//! ## Deletes Detach, They Don't Cascade
//!
//! Deleting a rack leaves its hangers in place with no rack; deleting an
//! article leaves its hangers with no article. Assembly quietly skips anything
//! detached, so a delete never breaks a page. Only menu attachments and an
//! article's comments go with their owner. See [`store::detach`].
//!
//! ## Injected Date
//!
//! Nothing in assembly reads the clock. The CLI resolves `--today` (or the
//! local date) once and passes it down, which keeps tests deterministic and
//! lets an editor preview a page as it will look next week.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time HTML
//! macro system. Malformed HTML is a build error, template variables are
//! plain Rust expressions, and all interpolation is auto-escaped. Converted
//! markdown is the only pre-escaped input.

pub mod assemble;
pub mod config;
pub mod generate;
pub mod iframe;
pub mod markdown;
pub mod model;
pub mod output;
pub mod slug;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
