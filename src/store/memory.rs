//! In-memory content store backed by `site.toml`.
//!
//! ## File Format
//!
//! One array of tables per record type. Records reference each other by id:
//!
//! ```toml
//! [[page]]
//! id = 1
//! title = "Front Page"
//! slug = "front"
//! is_home = true
//!
//! [[section]]
//! id = 1
//! page = 1
//! slug = "headlines"
//!
//! [[rack]]
//! id = 1
//! section = 1
//! slug = "top-stories"
//!
//! [[article]]
//! id = 1
//! title = "Bridge reopens"
//! slug = "bridge-reopens"
//! publish_date = "2024-05-01"
//! summary = "The **river crossing** is open again."
//!
//! [[hanger]]
//! id = 1
//! rack = 1
//! article = 1
//! expiration_date = "2024-06-01"
//! ```
//!
//! ## Validation
//!
//! [`MemoryStore::validate`] runs on every load and enforces:
//! - ids are unique per record type
//! - slugs are URL-safe and unique per record type; image names are unique
//! - every non-empty reference points at an existing record

use super::{
    ContentRepository, EntityKind, StoreError, article_order, hanger_order, menu_order,
    page_order, rack_order, section_order,
};
use crate::model::{
    Article, Author, Comment, Document, Hanger, Id, Image, Menu, MenuPage, Menuitem, Page, Rack,
    Section,
};
use crate::slug::check_slug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// File name of the store inside the content root.
pub const STORE_FILENAME: &str = "site.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryStore {
    #[serde(default, rename = "page", skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<Page>,
    #[serde(default, rename = "section", skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
    #[serde(default, rename = "rack", skip_serializing_if = "Vec::is_empty")]
    pub racks: Vec<Rack>,
    #[serde(default, rename = "hanger", skip_serializing_if = "Vec::is_empty")]
    pub hangers: Vec<Hanger>,
    #[serde(default, rename = "article", skip_serializing_if = "Vec::is_empty")]
    pub articles: Vec<Article>,
    #[serde(default, rename = "author", skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,
    #[serde(default, rename = "document", skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,
    #[serde(default, rename = "image", skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
    #[serde(default, rename = "menu", skip_serializing_if = "Vec::is_empty")]
    pub menus: Vec<Menu>,
    #[serde(default, rename = "menuitem", skip_serializing_if = "Vec::is_empty")]
    pub menuitems: Vec<Menuitem>,
    #[serde(default, rename = "menu_page", skip_serializing_if = "Vec::is_empty")]
    pub menu_pages: Vec<MenuPage>,
    #[serde(default, rename = "comment", skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

impl MemoryStore {
    /// Load and validate `site.toml` from the content root.
    pub fn load(root: &Path) -> Result<Self, StoreError> {
        let path = root.join(STORE_FILENAME);
        let content = fs::read_to_string(&path)?;
        let store = Self::from_toml_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            pages = store.pages.len(),
            articles = store.articles.len(),
            "loaded content store"
        );
        Ok(store)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, StoreError> {
        let store: MemoryStore = toml::from_str(content)?;
        store.validate()?;
        Ok(store)
    }

    /// Write the whole store back to `site.toml` in the content root.
    pub fn save(&self, root: &Path) -> Result<(), StoreError> {
        let path = root.join(STORE_FILENAME);
        fs::write(&path, toml::to_string_pretty(self)?)?;
        tracing::info!(path = %path.display(), "saved content store");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        let page_ids = unique_ids(EntityKind::Page, &self.pages, |p| p.id)?;
        let section_ids = unique_ids(EntityKind::Section, &self.sections, |s| s.id)?;
        let rack_ids = unique_ids(EntityKind::Rack, &self.racks, |r| r.id)?;
        unique_ids(EntityKind::Hanger, &self.hangers, |h| h.id)?;
        let article_ids = unique_ids(EntityKind::Article, &self.articles, |a| a.id)?;
        let author_ids = unique_ids(EntityKind::Author, &self.authors, |a| a.id)?;
        let document_ids = unique_ids(EntityKind::Document, &self.documents, |d| d.id)?;
        let image_ids = unique_ids(EntityKind::Image, &self.images, |i| i.id)?;
        let menu_ids = unique_ids(EntityKind::Menu, &self.menus, |m| m.id)?;
        unique_ids(EntityKind::Menuitem, &self.menuitems, |m| m.id)?;
        unique_ids(EntityKind::MenuPage, &self.menu_pages, |m| m.id)?;
        unique_ids(EntityKind::Comment, &self.comments, |c| c.id)?;

        unique_slugs(EntityKind::Page, self.pages.iter().map(|p| p.slug.as_str()))?;
        unique_slugs(EntityKind::Section, self.sections.iter().map(|s| s.slug.as_str()))?;
        unique_slugs(EntityKind::Rack, self.racks.iter().map(|r| r.slug.as_str()))?;
        unique_slugs(EntityKind::Article, self.articles.iter().map(|a| a.slug.as_str()))?;
        unique_slugs(EntityKind::Document, self.documents.iter().map(|d| d.slug.as_str()))?;

        let mut names = HashSet::new();
        for image in &self.images {
            if !names.insert(image.name.as_str()) {
                return Err(StoreError::DuplicateImageName(image.name.clone()));
            }
        }

        for s in &self.sections {
            check_ref(EntityKind::Section, s.id, "page", s.page, EntityKind::Page, &page_ids)?;
        }
        for r in &self.racks {
            check_ref(
                EntityKind::Rack,
                r.id,
                "section",
                r.section,
                EntityKind::Section,
                &section_ids,
            )?;
        }
        for h in &self.hangers {
            check_ref(EntityKind::Hanger, h.id, "rack", h.rack, EntityKind::Rack, &rack_ids)?;
            check_ref(
                EntityKind::Hanger,
                h.id,
                "article",
                h.article,
                EntityKind::Article,
                &article_ids,
            )?;
        }
        for a in &self.articles {
            check_ref(
                EntityKind::Article,
                a.id,
                "author",
                a.author,
                EntityKind::Author,
                &author_ids,
            )?;
            check_ref(
                EntityKind::Article,
                a.id,
                "iframe_document",
                a.iframe_document,
                EntityKind::Document,
                &document_ids,
            )?;
            check_ref(
                EntityKind::Article,
                a.id,
                "featured_image",
                a.featured_image,
                EntityKind::Image,
                &image_ids,
            )?;
        }
        for m in &self.menuitems {
            check_ref(EntityKind::Menuitem, m.id, "menu", m.menu, EntityKind::Menu, &menu_ids)?;
        }
        for mp in &self.menu_pages {
            check_ref(
                EntityKind::MenuPage,
                mp.id,
                "menu",
                Some(mp.menu),
                EntityKind::Menu,
                &menu_ids,
            )?;
            check_ref(
                EntityKind::MenuPage,
                mp.id,
                "page",
                Some(mp.page),
                EntityKind::Page,
                &page_ids,
            )?;
        }
        for c in &self.comments {
            check_ref(
                EntityKind::Comment,
                c.id,
                "article",
                Some(c.article),
                EntityKind::Article,
                &article_ids,
            )?;
        }
        Ok(())
    }
}

fn unique_ids<T>(
    kind: EntityKind,
    items: &[T],
    id: impl Fn(&T) -> Id,
) -> Result<HashSet<Id>, StoreError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        let id = id(item);
        if !seen.insert(id) {
            return Err(StoreError::DuplicateId(kind, id));
        }
    }
    Ok(seen)
}

fn unique_slugs<'a>(
    kind: EntityKind,
    slugs: impl Iterator<Item = &'a str>,
) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    for slug in slugs {
        check_slug(slug).map_err(|problem| StoreError::InvalidSlug {
            kind,
            slug: slug.to_string(),
            problem,
        })?;
        if !seen.insert(slug) {
            return Err(StoreError::DuplicateSlug(kind, slug.to_string()));
        }
    }
    Ok(())
}

fn check_ref(
    kind: EntityKind,
    id: Id,
    field: &'static str,
    reference: Option<Id>,
    target: EntityKind,
    known: &HashSet<Id>,
) -> Result<(), StoreError> {
    match reference {
        Some(target_id) if !known.contains(&target_id) => Err(StoreError::DanglingReference {
            kind,
            id,
            field,
            target,
            target_id,
        }),
        _ => Ok(()),
    }
}

impl ContentRepository for MemoryStore {
    fn pages(&self) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self.pages.iter().collect();
        pages.sort_by(|a, b| page_order(a, b));
        pages
    }

    fn page_by_slug(&self, slug: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.slug == slug)
    }

    fn sections_for_page(&self, page: Id) -> Vec<&Section> {
        let mut sections: Vec<&Section> = self
            .sections
            .iter()
            .filter(|s| s.page == Some(page))
            .collect();
        sections.sort_by(|a, b| section_order(a, b));
        sections
    }

    fn racks_for_section(&self, section: Id) -> Vec<&Rack> {
        let mut racks: Vec<&Rack> = self
            .racks
            .iter()
            .filter(|r| r.section == Some(section))
            .collect();
        racks.sort_by(|a, b| rack_order(a, b));
        racks
    }

    fn hangers_for_rack(&self, rack: Id) -> Vec<&Hanger> {
        let mut hangers: Vec<(&Hanger, Option<&Article>)> = self
            .hangers
            .iter()
            .filter(|h| h.rack == Some(rack))
            .map(|h| (h, h.article.and_then(|id| self.article(id))))
            .collect();
        hangers.sort_by(|a, b| hanger_order(*a, *b));
        hangers.into_iter().map(|(h, _)| h).collect()
    }

    fn racks(&self) -> Vec<&Rack> {
        let mut racks: Vec<&Rack> = self.racks.iter().collect();
        racks.sort_by(|a, b| rack_order(a, b));
        racks
    }

    fn rack_by_slug(&self, slug: &str) -> Option<&Rack> {
        self.racks.iter().find(|r| r.slug == slug)
    }

    fn articles(&self) -> Vec<&Article> {
        let mut articles: Vec<&Article> = self.articles.iter().collect();
        articles.sort_by(|a, b| article_order(a, b));
        articles
    }

    fn article(&self, id: Id) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }

    fn article_by_slug(&self, slug: &str) -> Option<&Article> {
        self.articles.iter().find(|a| a.slug == slug)
    }

    fn author(&self, id: Id) -> Option<&Author> {
        self.authors.iter().find(|a| a.id == id)
    }

    fn document(&self, id: Id) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    fn image(&self, id: Id) -> Option<&Image> {
        self.images.iter().find(|i| i.id == id)
    }

    fn image_by_name(&self, name: &str) -> Option<&Image> {
        self.images.iter().find(|i| i.name == name)
    }

    fn menus_for_page(&self, page: Id) -> Vec<&Menu> {
        let attached: HashSet<Id> = self
            .menu_pages
            .iter()
            .filter(|mp| mp.page == page)
            .map(|mp| mp.menu)
            .collect();
        let mut menus: Vec<&Menu> = self
            .menus
            .iter()
            .filter(|m| attached.contains(&m.id))
            .collect();
        menus.sort_by(|a, b| menu_order(a, b));
        menus
    }

    fn main_menus(&self, min_level: i32) -> Vec<&Menu> {
        let mut menus: Vec<&Menu> = self.menus.iter().filter(|m| m.level >= min_level).collect();
        menus.sort_by(|a, b| menu_order(a, b));
        menus
    }

    fn menu_items(&self, menu: Id) -> Vec<&Menuitem> {
        let mut items: Vec<&Menuitem> = self
            .menuitems
            .iter()
            .filter(|m| m.menu == Some(menu))
            .collect();
        items.sort_by_key(|m| (m.order, m.id));
        items
    }

    fn active_comments(&self, article: Id) -> Vec<&Comment> {
        let mut comments: Vec<&Comment> = self
            .comments
            .iter()
            .filter(|c| c.article == article && c.active)
            .collect();
        comments.sort_by_key(|c| (c.when, c.id));
        comments
    }
}
