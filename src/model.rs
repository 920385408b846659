//! Stored content records.
//!
//! These are the rows of the content store (`site.toml`). References between
//! records are plain ids wrapped in `Option`: a `None` reference is a record
//! that was detached when its target was deleted, and every consumer must
//! treat it as "nothing there" rather than an error.
//!
//! The assembler never mutates these types. Editing happens by hand in
//! `site.toml` or through the store's delete and moderation operations.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Primary key shared by every record type.
pub type Id = u32;

/// How a page is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageDisplay {
    #[default]
    Normal,
    /// Generated, but menus should not link to it.
    HiddenFromMenus,
    DoNotDisplay,
}

/// Display mode shared by sections, racks and articles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Display {
    #[default]
    Normal,
    PreviewOnly,
    DoNotDisplay,
}

/// Which rendering slot a section goes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    #[default]
    Regular,
    /// Kept out of the regular section loop, rendered in its own slot.
    Special,
}

/// Article metadata a rack shows next to each article.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleMeta {
    #[default]
    None,
    Author,
    Date,
    AuthorAndDate,
}

impl ArticleMeta {
    pub fn shows_author(self) -> bool {
        matches!(self, ArticleMeta::Author | ArticleMeta::AuthorAndDate)
    }

    pub fn shows_date(self) -> bool {
        matches!(self, ArticleMeta::Date | ArticleMeta::AuthorAndDate)
    }
}

/// What to show in place of an empty summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryFallback {
    ShowBlank,
    #[default]
    ShowContent,
}

fn yes() -> bool {
    true
}

fn one() -> u32 {
    1
}

fn read_more_default() -> String {
    "Read More".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Page {
    pub id: Id,
    #[serde(default)]
    pub title: String,
    #[serde(default = "yes")]
    pub show_title: bool,
    pub slug: String,
    #[serde(default)]
    pub is_home: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub display: PageDisplay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Section {
    pub id: Id,
    #[serde(default)]
    pub page: Option<Id>,
    #[serde(default)]
    pub title: String,
    #[serde(default = "yes")]
    pub show_title: bool,
    pub slug: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub content_before_racks: String,
    #[serde(default)]
    pub content_after_racks: String,
    #[serde(default)]
    pub display: Display,
    /// Hide the section when none of its racks have anything to show.
    #[serde(default = "yes")]
    pub collapse: bool,
    #[serde(default)]
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rack {
    pub id: Id,
    #[serde(default)]
    pub section: Option<Id>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub show_title: bool,
    pub slug: String,
    /// Width relative to the narrowest rack.
    #[serde(default = "one")]
    pub width: u32,
    #[serde(default)]
    pub show_article_meta: ArticleMeta,
    #[serde(default)]
    pub content_before_articles: String,
    #[serde(default)]
    pub content_after_articles: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub display: Display,
    // Not consulted by assembly: an empty rack is always dropped.
    #[serde(default = "yes")]
    pub collapse: bool,
}

/// Placement of one article in one rack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hanger {
    pub id: Id,
    #[serde(default)]
    pub rack: Option<Id>,
    #[serde(default)]
    pub article: Option<Id>,
    #[serde(default)]
    pub order: i32,
    /// The article stops showing in the rack on this date.
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Article {
    pub id: Id,
    pub title: String,
    #[serde(default = "yes")]
    pub show_title: bool,
    #[serde(default)]
    pub author: Option<Id>,
    pub slug: String,
    /// Takes precedence over `iframe_src` when set.
    #[serde(default)]
    pub iframe_document: Option<Id>,
    /// `"<url>"` or `"<url> <css height>"`.
    #[serde(default)]
    pub iframe_src: String,
    #[serde(default)]
    pub iframe_height: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_classes: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub if_summary_blank: SummaryFallback,
    #[serde(default = "read_more_default")]
    pub read_more: String,
    #[serde(default)]
    pub created: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated: Option<NaiveDateTime>,
    pub publish_date: NaiveDate,
    #[serde(default)]
    pub display: Display,
    #[serde(default)]
    pub featured_image: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Author {
    pub id: Id,
    pub name: String,
}

/// An uploaded file that can be shown in an article's iframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    pub id: Id,
    #[serde(default)]
    pub title: String,
    #[serde(default = "yes")]
    pub show_title: bool,
    pub slug: String,
    /// Path relative to the media directory.
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Image {
    pub id: Id,
    /// Path relative to the media directory.
    pub file: String,
    /// Unique handle authors use to refer to the image.
    pub name: String,
    pub alt_text: String,
    #[serde(default)]
    pub title: String,
}

impl Image {
    pub fn url(&self) -> String {
        format!("/media/{}", self.file)
    }

    /// Markdown snippet authors paste into article bodies.
    pub fn markdown_code(&self) -> String {
        format!("![{}]({})", self.alt_text, self.url())
    }
}

impl Document {
    pub fn url(&self) -> String {
        format!("/media/{}", self.file)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Menu {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    /// Not unique. Main menus use a high level (1000 by default).
    #[serde(default)]
    pub level: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Menuitem {
    pub id: Id,
    #[serde(default)]
    pub menu: Option<Id>,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub label: String,
    pub order: i32,
}

/// Attaches a menu to a page. Removed together with either side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuPage {
    pub id: Id,
    pub menu: Id,
    pub page: Id,
}

/// A reader comment on an article. Only active comments are published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Comment {
    pub id: Id,
    pub article: Id,
    pub name: String,
    pub email: String,
    pub content: String,
    pub when: NaiveDateTime,
    #[serde(default)]
    pub active: bool,
}
