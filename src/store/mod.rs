//! Content repository.
//!
//! The assembler never walks relations implicitly. Everything it needs comes
//! from the explicit, already-ordered queries on [`ContentRepository`]:
//!
//! | Query | Order |
//! |-------|-------|
//! | [`pages`](ContentRepository::pages) | `order`, `title`, `id` |
//! | [`sections_for_page`](ContentRepository::sections_for_page) | `order`, `title`, `id` |
//! | [`racks_for_section`](ContentRepository::racks_for_section) | `order`, `id` |
//! | [`hangers_for_rack`](ContentRepository::hangers_for_rack) | `order`, article (newest first, then title), `id` |
//! | [`articles`](ContentRepository::articles) | newest `publish_date` first, `title`, `id` |
//! | [`main_menus`](ContentRepository::main_menus) / [`menus_for_page`](ContentRepository::menus_for_page) | highest `level` first, `id` |
//! | [`menu_items`](ContentRepository::menu_items) | `order`, `id` |
//! | [`active_comments`](ContentRepository::active_comments) | `when`, `id` |
//!
//! References are `Option<Id>`. Deleting a record nullifies every reference
//! to it (see [`detach`]), so a dangling reference always shows up as `None`
//! and never as a lookup failure.
//!
//! [`MemoryStore`] is the only implementation: the whole site is small enough
//! to live in one `site.toml` that is loaded, validated, and written back whole.

pub mod detach;
pub mod memory;

pub use memory::MemoryStore;

use crate::model::{
    Article, Author, Comment, Document, Hanger, Id, Image, Menu, Menuitem, Page, Rack, Section,
};
use crate::slug::SlugProblem;
use std::cmp::{Ordering, Reverse};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
    #[error("Duplicate {0} id {1}")]
    DuplicateId(EntityKind, Id),
    #[error("Duplicate {0} slug '{1}'")]
    DuplicateSlug(EntityKind, String),
    #[error("Invalid {kind} slug '{slug}': {problem}")]
    InvalidSlug {
        kind: EntityKind,
        slug: String,
        problem: SlugProblem,
    },
    #[error("Duplicate image name '{0}'")]
    DuplicateImageName(String),
    #[error("{kind} {id}: {field} refers to missing {target} {target_id}")]
    DanglingReference {
        kind: EntityKind,
        id: Id,
        field: &'static str,
        target: EntityKind,
        target_id: Id,
    },
    #[error("No {0} with id {1}")]
    NotFound(EntityKind, Id),
}

/// Record types held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum EntityKind {
    Page,
    Section,
    Rack,
    Hanger,
    Article,
    Author,
    Document,
    Image,
    Menu,
    Menuitem,
    MenuPage,
    Comment,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Page => "page",
            EntityKind::Section => "section",
            EntityKind::Rack => "rack",
            EntityKind::Hanger => "hanger",
            EntityKind::Article => "article",
            EntityKind::Author => "author",
            EntityKind::Document => "document",
            EntityKind::Image => "image",
            EntityKind::Menu => "menu",
            EntityKind::Menuitem => "menu item",
            EntityKind::MenuPage => "menu page",
            EntityKind::Comment => "comment",
        };
        f.write_str(name)
    }
}

/// Read access to stored content with deterministic ordering.
///
/// `Sync` so page trees can be loaded from several rayon workers at once.
pub trait ContentRepository: Sync {
    /// All pages.
    fn pages(&self) -> Vec<&Page>;
    fn page_by_slug(&self, slug: &str) -> Option<&Page>;

    /// The first page flagged `is_home`, in page order.
    fn home_page(&self) -> Option<&Page> {
        self.pages().into_iter().find(|p| p.is_home)
    }

    fn sections_for_page(&self, page: Id) -> Vec<&Section>;
    fn racks_for_section(&self, section: Id) -> Vec<&Rack>;
    fn hangers_for_rack(&self, rack: Id) -> Vec<&Hanger>;

    /// All racks, including ones detached from any section.
    fn racks(&self) -> Vec<&Rack>;
    fn rack_by_slug(&self, slug: &str) -> Option<&Rack>;

    fn articles(&self) -> Vec<&Article>;
    fn article(&self, id: Id) -> Option<&Article>;
    fn article_by_slug(&self, slug: &str) -> Option<&Article>;

    fn author(&self, id: Id) -> Option<&Author>;
    fn document(&self, id: Id) -> Option<&Document>;
    fn image(&self, id: Id) -> Option<&Image>;
    fn image_by_name(&self, name: &str) -> Option<&Image>;

    /// Menus attached to `page` through menu pages.
    fn menus_for_page(&self, page: Id) -> Vec<&Menu>;
    /// Menus with `level >= min_level`.
    fn main_menus(&self, min_level: i32) -> Vec<&Menu>;
    fn menu_items(&self, menu: Id) -> Vec<&Menuitem>;

    /// Approved comments on `article`, oldest first.
    fn active_comments(&self, article: Id) -> Vec<&Comment>;
}

// ============================================================================
// Orderings
// ============================================================================

pub(crate) fn page_order(a: &Page, b: &Page) -> Ordering {
    (a.order, &a.title, a.id).cmp(&(b.order, &b.title, b.id))
}

pub(crate) fn section_order(a: &Section, b: &Section) -> Ordering {
    (a.order, &a.title, a.id).cmp(&(b.order, &b.title, b.id))
}

pub(crate) fn rack_order(a: &Rack, b: &Rack) -> Ordering {
    (a.order, a.id).cmp(&(b.order, b.id))
}

pub(crate) fn article_order(a: &Article, b: &Article) -> Ordering {
    (Reverse(a.publish_date), &a.title, a.id).cmp(&(Reverse(b.publish_date), &b.title, b.id))
}

/// Hangers tie on `order` by their article's own ordering. Hangers without an
/// article sort after those with one.
pub(crate) fn hanger_order(
    a: (&Hanger, Option<&Article>),
    b: (&Hanger, Option<&Article>),
) -> Ordering {
    a.0.order
        .cmp(&b.0.order)
        .then_with(|| match (a.1, b.1) {
            (Some(x), Some(y)) => article_order(x, y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.0.id.cmp(&b.0.id))
}

pub(crate) fn menu_order(a: &Menu, b: &Menu) -> Ordering {
    (Reverse(a.level), a.id).cmp(&(Reverse(b.level), b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{article, hanger, section};

    #[test]
    fn sections_tie_break_on_title() {
        let mut a = section(1, Some(1), "b-side");
        a.title = "Beta".to_string();
        let mut b = section(2, Some(1), "a-side");
        b.title = "Alpha".to_string();
        assert_eq!(section_order(&a, &b), Ordering::Greater);
        b.order = 5;
        assert_eq!(section_order(&a, &b), Ordering::Less);
    }

    #[test]
    fn hangers_tie_break_on_newest_article() {
        let older = article(1, "older", "2024-01-01");
        let newer = article(2, "newer", "2024-03-01");
        let h1 = hanger(1, Some(1), Some(1), 0);
        let h2 = hanger(2, Some(1), Some(2), 0);
        assert_eq!(
            hanger_order((&h2, Some(&newer)), (&h1, Some(&older))),
            Ordering::Less
        );
    }

    #[test]
    fn hangers_without_article_sort_last_within_order() {
        let art = article(1, "a", "2024-01-01");
        let with = hanger(5, Some(1), Some(1), 0);
        let without = hanger(1, Some(1), None, 0);
        assert_eq!(
            hanger_order((&without, None), (&with, Some(&art))),
            Ordering::Greater
        );
    }

    #[test]
    fn hanger_order_key_wins_over_article() {
        let art = article(1, "a", "2024-01-01");
        let first = hanger(9, Some(1), None, -1);
        let second = hanger(1, Some(1), Some(1), 0);
        assert_eq!(
            hanger_order((&first, None), (&second, Some(&art))),
            Ordering::Less
        );
    }

    #[test]
    fn menus_highest_level_first() {
        let main = Menu {
            id: 2,
            name: "Main".to_string(),
            level: 1000,
        };
        let local = Menu {
            id: 1,
            name: "Local".to_string(),
            level: 10,
        };
        assert_eq!(menu_order(&main, &local), Ordering::Less);
    }

    #[test]
    fn entity_kind_display() {
        assert_eq!(EntityKind::MenuPage.to_string(), "menu page");
        assert_eq!(EntityKind::Hanger.to_string(), "hanger");
    }
}
