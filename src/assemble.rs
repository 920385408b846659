//! Content assembly: from a stored page to a render-ready view model.
//!
//! Assembly happens in two steps:
//!
//! 1. [`load_page_tree`] asks the repository for the page's sections, each
//!    section's racks and each rack's hangers, already ordered, and resolves
//!    every hanger's article (or `None` when it was detached).
//! 2. [`Assembler::assemble`] walks that tree once and keeps only what is
//!    displayable today:
//!
//! ```text
//! hanger   visible iff article exists, display = normal,
//!          publish_date <= today, no expiration or expiration > today
//! rack     kept iff at least one visible hanger
//! section  kept iff at least one kept rack, or collapse = false
//!          then routed to `sections` or `special_sections` by placement
//! ```
//!
//! Order is preserved at every level; exclusion is silent. The second step is
//! a pure function of the tree, the markdown renderer and the injected date,
//! so assembling the same tree twice yields identical output.

use crate::config::IframeConfig;
use crate::iframe::{IframeEmbed, resolve_iframe};
use crate::markdown::MarkdownRenderer;
use crate::model::{
    Article, ArticleMeta, Author, Display, Document, Hanger, Id, Image, Page, Placement, Rack,
    Section, SummaryFallback,
};
use crate::store::ContentRepository;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

// ============================================================================
// Loaded content tree
// ============================================================================

/// An article together with the records it references.
#[derive(Debug, Clone, Copy)]
pub struct ArticleNode<'a> {
    pub article: &'a Article,
    pub author: Option<&'a Author>,
    pub document: Option<&'a Document>,
    pub featured_image: Option<&'a Image>,
}

#[derive(Debug, Clone, Copy)]
pub struct HangerNode<'a> {
    pub hanger: &'a Hanger,
    /// `None` when the article was deleted.
    pub article: Option<ArticleNode<'a>>,
}

#[derive(Debug, Clone)]
pub struct RackTree<'a> {
    pub rack: &'a Rack,
    pub hangers: Vec<HangerNode<'a>>,
}

#[derive(Debug, Clone)]
pub struct SectionTree<'a> {
    pub section: &'a Section,
    pub racks: Vec<RackTree<'a>>,
}

#[derive(Debug, Clone)]
pub struct PageTree<'a> {
    pub page: &'a Page,
    pub sections: Vec<SectionTree<'a>>,
}

pub fn load_article_node<'a, R: ContentRepository>(
    repo: &'a R,
    article: &'a Article,
) -> ArticleNode<'a> {
    ArticleNode {
        article,
        author: article.author.and_then(|id| repo.author(id)),
        document: article.iframe_document.and_then(|id| repo.document(id)),
        featured_image: article.featured_image.and_then(|id| repo.image(id)),
    }
}

pub fn load_rack_tree<'a, R: ContentRepository>(repo: &'a R, rack: &'a Rack) -> RackTree<'a> {
    let hangers = repo
        .hangers_for_rack(rack.id)
        .into_iter()
        .map(|hanger| HangerNode {
            hanger,
            article: hanger
                .article
                .and_then(|id| repo.article(id))
                .map(|article| load_article_node(repo, article)),
        })
        .collect();
    RackTree { rack, hangers }
}

pub fn load_page_tree<'a, R: ContentRepository>(repo: &'a R, page: &'a Page) -> PageTree<'a> {
    let sections = repo
        .sections_for_page(page.id)
        .into_iter()
        .map(|section| SectionTree {
            section,
            racks: repo
                .racks_for_section(section.id)
                .into_iter()
                .map(|rack| load_rack_tree(repo, rack))
                .collect(),
        })
        .collect();
    PageTree { page, sections }
}

// ============================================================================
// Visibility
// ============================================================================

/// Why a hanger is left out, or `None` when it is shown.
pub fn exclusion_reason(node: &HangerNode<'_>, today: NaiveDate) -> Option<&'static str> {
    let Some(ArticleNode { article, .. }) = node.article else {
        return Some("no article");
    };
    if article.display != Display::Normal {
        return Some("article not displayed");
    }
    if article.publish_date > today {
        return Some("not yet published");
    }
    match node.hanger.expiration_date {
        Some(expires) if expires <= today => Some("expired"),
        _ => None,
    }
}

/// Whether a hanger's article shows in its rack on `today`.
pub fn is_hanger_visible(node: &HangerNode<'_>, today: NaiveDate) -> bool {
    exclusion_reason(node, today).is_none()
}

// ============================================================================
// View model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeaturedImage {
    pub url: String,
    pub alt_text: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleView {
    pub id: Id,
    pub slug: String,
    pub title: String,
    pub show_title: bool,
    pub author: Option<String>,
    pub created: Option<NaiveDateTime>,
    pub updated: Option<NaiveDateTime>,
    pub publish_date: NaiveDate,
    pub content_classes: String,
    pub read_more: String,
    pub summary_html: String,
    pub content_html: String,
    pub if_summary_blank: SummaryFallback,
    pub iframe: Option<IframeEmbed>,
    pub featured_image: Option<FeaturedImage>,
}

impl ArticleView {
    /// What a rack shows for this article: the summary, or the content when
    /// the summary is blank and the article asks for that.
    pub fn teaser_html(&self) -> &str {
        if self.summary_html.trim().is_empty()
            && self.if_summary_blank == SummaryFallback::ShowContent
        {
            &self.content_html
        } else {
            &self.summary_html
        }
    }

    pub fn url(&self) -> String {
        format!("/article/{}/", self.slug)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HangerView {
    pub id: Id,
    pub article: ArticleView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RackView {
    pub id: Id,
    pub slug: String,
    pub title: String,
    pub show_title: bool,
    pub width: u32,
    pub show_article_meta: ArticleMeta,
    pub content_before_articles: String,
    pub content_after_articles: String,
    pub hangers: Vec<HangerView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub id: Id,
    pub slug: String,
    pub title: String,
    pub show_title: bool,
    pub content_before_racks: String,
    pub content_after_racks: String,
    pub collapse: bool,
    pub placement: Placement,
    pub racks: Vec<RackView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub id: Id,
    pub slug: String,
    pub title: String,
    pub show_title: bool,
}

/// Everything needed to render one page's content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderModel {
    pub page: PageView,
    /// Regular sections in persisted order.
    pub sections: Vec<SectionView>,
    /// Special sections in persisted order, rendered in their own slot.
    pub special_sections: Vec<SectionView>,
}

// ============================================================================
// Assembler
// ============================================================================

/// Projects loaded trees into view models for a fixed date.
pub struct Assembler<'a> {
    renderer: &'a dyn MarkdownRenderer,
    iframe: &'a IframeConfig,
    today: NaiveDate,
}

impl<'a> Assembler<'a> {
    pub fn new(
        renderer: &'a dyn MarkdownRenderer,
        iframe: &'a IframeConfig,
        today: NaiveDate,
    ) -> Self {
        Self {
            renderer,
            iframe,
            today,
        }
    }

    pub fn assemble(&self, tree: &PageTree<'_>) -> RenderModel {
        let mut sections = Vec::new();
        let mut special_sections = Vec::new();

        for section_tree in &tree.sections {
            let section = section_tree.section;
            let racks: Vec<RackView> = section_tree
                .racks
                .iter()
                .filter_map(|rack_tree| self.assemble_rack(rack_tree))
                .collect();

            if racks.is_empty() && section.collapse {
                tracing::debug!(section = %section.slug, "collapsed empty section");
                continue;
            }

            let view = project_section(section, racks);
            match section.placement {
                Placement::Regular => sections.push(view),
                Placement::Special => special_sections.push(view),
            }
        }

        RenderModel {
            page: PageView {
                id: tree.page.id,
                slug: tree.page.slug.clone(),
                title: tree.page.title.clone(),
                show_title: tree.page.show_title,
            },
            sections,
            special_sections,
        }
    }

    /// A rack with only its visible hangers, or `None` if none are visible.
    pub fn assemble_rack(&self, tree: &RackTree<'_>) -> Option<RackView> {
        let hangers: Vec<HangerView> = tree
            .hangers
            .iter()
            .filter_map(|node| match (exclusion_reason(node, self.today), node.article) {
                (None, Some(article)) => Some(HangerView {
                    id: node.hanger.id,
                    article: self.project_article(&article),
                }),
                (reason, _) => {
                    tracing::debug!(
                        rack = %tree.rack.slug,
                        hanger = node.hanger.id,
                        reason = reason.unwrap_or("no article"),
                        "hanger excluded"
                    );
                    None
                }
            })
            .collect();

        if hangers.is_empty() {
            return None;
        }

        let rack = tree.rack;
        Some(RackView {
            id: rack.id,
            slug: rack.slug.clone(),
            title: rack.title.clone(),
            show_title: rack.show_title,
            width: rack.width,
            show_article_meta: rack.show_article_meta,
            content_before_articles: rack.content_before_articles.clone(),
            content_after_articles: rack.content_after_articles.clone(),
            hangers,
        })
    }

    /// Flat view of one article with its markdown rendered.
    pub fn project_article(&self, node: &ArticleNode<'_>) -> ArticleView {
        let article = node.article;
        ArticleView {
            id: article.id,
            slug: article.slug.clone(),
            title: article.title.clone(),
            show_title: article.show_title,
            author: node.author.map(|a| a.name.clone()),
            created: article.created,
            updated: article.updated,
            publish_date: article.publish_date,
            content_classes: article.content_classes.clone(),
            read_more: article.read_more.clone(),
            summary_html: self.renderer.convert(&article.summary),
            content_html: self.renderer.convert(&article.content),
            if_summary_blank: article.if_summary_blank,
            iframe: resolve_iframe(article, node.document, self.iframe),
            featured_image: node.featured_image.map(|image| FeaturedImage {
                url: image.url(),
                alt_text: image.alt_text.clone(),
                title: image.title.clone(),
            }),
        }
    }
}

fn project_section(section: &Section, racks: Vec<RackView>) -> SectionView {
    SectionView {
        id: section.id,
        slug: section.slug.clone(),
        title: section.title.clone(),
        show_title: section.show_title,
        content_before_racks: section.content_before_racks.clone(),
        content_after_racks: section.content_after_racks.clone(),
        collapse: section.collapse,
        placement: section.placement,
        racks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::CmarkRenderer;
    use crate::store::{ContentRepository, MemoryStore};
    use crate::test_helpers::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts conversions and tags output with the input.
    #[derive(Default)]
    struct CountingRenderer {
        calls: AtomicUsize,
    }

    impl MarkdownRenderer for CountingRenderer {
        fn convert(&self, text: &str) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            format!("<p>{text}</p>")
        }
    }

    fn assemble_page(store: &MemoryStore, slug: &str) -> RenderModel {
        let renderer = CmarkRenderer::new();
        let iframe = IframeConfig::default();
        let page = store.page_by_slug(slug).unwrap();
        let tree = load_page_tree(store, page);
        Assembler::new(&renderer, &iframe, today()).assemble(&tree)
    }

    fn section_slugs(sections: &[SectionView]) -> Vec<&str> {
        sections.iter().map(|s| s.slug.as_str()).collect()
    }

    fn node<'a>(hanger: &'a Hanger, article: Option<&'a Article>) -> HangerNode<'a> {
        HangerNode {
            hanger,
            article: article.map(|article| ArticleNode {
                article,
                author: None,
                document: None,
                featured_image: None,
            }),
        }
    }

    // =========================================================================
    // Visibility predicate
    // =========================================================================

    #[test]
    fn visible_when_published_and_not_expired() {
        let art = article(1, "a", "2024-06-14");
        let h = hanger(1, Some(1), Some(1), 0);
        assert!(is_hanger_visible(&node(&h, Some(&art)), today()));
    }

    #[test]
    fn visible_on_publish_date() {
        let art = article(1, "a", "2024-06-15");
        let h = hanger(1, Some(1), Some(1), 0);
        assert!(is_hanger_visible(&node(&h, Some(&art)), today()));
    }

    #[test]
    fn hidden_before_publish_date() {
        let art = article(1, "a", "2024-06-16");
        let h = hanger(1, Some(1), Some(1), 0);
        assert_eq!(
            exclusion_reason(&node(&h, Some(&art)), today()),
            Some("not yet published")
        );
    }

    #[test]
    fn hidden_on_expiration_date() {
        let art = article(1, "a", "2024-01-01");
        let mut h = hanger(1, Some(1), Some(1), 0);
        h.expiration_date = Some(today());
        assert!(!is_hanger_visible(&node(&h, Some(&art)), today()));
    }

    #[test]
    fn visible_day_before_expiration() {
        let art = article(1, "a", "2024-01-01");
        let mut h = hanger(1, Some(1), Some(1), 0);
        h.expiration_date = Some(date("2024-06-16"));
        assert!(is_hanger_visible(&node(&h, Some(&art)), today()));
    }

    #[test]
    fn hidden_unless_display_normal() {
        let h = hanger(1, Some(1), Some(1), 0);
        for display in [Display::PreviewOnly, Display::DoNotDisplay] {
            let mut art = article(1, "a", "2024-01-01");
            art.display = display;
            assert!(!is_hanger_visible(&node(&h, Some(&art)), today()));
        }
    }

    #[test]
    fn detached_hanger_hidden() {
        let h = hanger(1, Some(1), None, 0);
        assert_eq!(exclusion_reason(&node(&h, None), today()), Some("no article"));
    }

    // =========================================================================
    // Rack assembly
    // =========================================================================

    #[test]
    fn rack_keeps_only_published_hanger() {
        // One published yesterday, one publishing tomorrow
        let mut store = MemoryStore::default();
        store.racks.push(rack(1, None, "r"));
        store.articles.push(article(1, "a1", "2024-06-14"));
        store.articles.push(article(2, "a2", "2024-06-16"));
        store.hangers.push(hanger(1, Some(1), Some(1), 0));
        store.hangers.push(hanger(2, Some(1), Some(2), 1));

        let renderer = CmarkRenderer::new();
        let iframe = IframeConfig::default();
        let tree = load_rack_tree(&store, &store.racks[0]);
        let view = Assembler::new(&renderer, &iframe, today())
            .assemble_rack(&tree)
            .unwrap();

        assert_eq!(view.hangers.len(), 1);
        assert_eq!(view.hangers[0].id, 1);
        assert_eq!(view.hangers[0].article.slug, "a1");
    }

    #[test]
    fn rack_without_visible_hangers_is_none() {
        let store = sample_store();
        let renderer = CmarkRenderer::new();
        let iframe = IframeConfig::default();
        let briefs = store.rack_by_slug("briefs").unwrap();
        let tree = load_rack_tree(&store, briefs);
        assert!(
            Assembler::new(&renderer, &iframe, today())
                .assemble_rack(&tree)
                .is_none()
        );
    }

    #[test]
    fn empty_rack_dropped_even_without_collapse() {
        let mut store = sample_store();
        for r in &mut store.racks {
            r.collapse = false;
        }
        let model = assemble_page(&store, "front");
        let news = &model.sections[0];
        let racks: Vec<&str> = news.racks.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(racks, vec!["top-stories"]);
    }

    // =========================================================================
    // Page assembly
    // =========================================================================

    #[test]
    fn sample_front_page_shape() {
        let store = sample_store();
        let model = assemble_page(&store, "front");

        assert_eq!(model.page.slug, "front");
        assert_eq!(section_slugs(&model.sections), vec!["news", "coming-soon"]);
        assert_eq!(section_slugs(&model.special_sections), vec!["notices"]);

        let board = &model.special_sections[0].racks[0];
        let articles: Vec<&str> = board
            .hangers
            .iter()
            .map(|h| h.article.slug.as_str())
            .collect();
        assert_eq!(articles, vec!["road-closures"]);
    }

    #[test]
    fn forced_section_kept_with_no_racks() {
        let store = sample_store();
        let model = assemble_page(&store, "front");
        let coming = model
            .sections
            .iter()
            .find(|s| s.slug == "coming-soon")
            .unwrap();
        assert!(coming.racks.is_empty());
        assert!(!coming.collapse);
        assert_eq!(coming.content_before_racks, "Stay tuned.");
    }

    #[test]
    fn collapsing_section_with_empty_racks_omitted() {
        let mut store = sample_store();
        // Leave the notices section with nothing visible
        store.articles.iter_mut().find(|a| a.id == 6).unwrap().display = Display::PreviewOnly;
        let model = assemble_page(&store, "front");
        assert!(model.special_sections.is_empty());
        assert!(!section_slugs(&model.sections).contains(&"notices"));
    }

    #[test]
    fn special_sections_never_in_regular_list() {
        let mut store = sample_store();
        for s in &mut store.sections {
            s.collapse = false;
        }
        let model = assemble_page(&store, "front");
        assert!(model.sections.iter().all(|s| s.placement == Placement::Regular));
        assert!(
            model
                .special_sections
                .iter()
                .all(|s| s.placement == Placement::Special)
        );
    }

    #[test]
    fn order_preserved_at_every_level() {
        let mut store = MemoryStore::default();
        store.pages.push(page(1, "p"));
        for (id, order) in [(1, 3), (2, 1), (3, 2)] {
            let mut s = section(id, Some(1), &format!("s{id}"));
            s.order = order;
            s.collapse = false;
            store.sections.push(s);
            let mut r = rack(id, Some(2), &format!("r{id}"));
            r.order = -order;
            store.racks.push(r);
        }
        for (id, order) in [(1, 2), (2, 0), (3, 1)] {
            store.articles.push(article(id, &format!("a{id}"), "2024-01-01"));
            store.hangers.push(hanger(id, Some(1), Some(id), order));
        }
        store.articles.push(article(4, "a4", "2024-01-01"));
        store.hangers.push(hanger(4, Some(3), Some(4), 0));

        let model = assemble_page(&store, "p");
        assert_eq!(section_slugs(&model.sections), vec!["s2", "s3", "s1"]);
        let racks: Vec<&str> = model.sections[0]
            .racks
            .iter()
            .map(|r| r.slug.as_str())
            .collect();
        assert_eq!(racks, vec!["r1", "r3"]);
        let hangers: Vec<Id> = model.sections[0].racks[0]
            .hangers
            .iter()
            .map(|h| h.id)
            .collect();
        assert_eq!(hangers, vec![2, 3, 1]);
    }

    #[test]
    fn detached_article_excluded_without_error() {
        let mut store = sample_store();
        store.delete(crate::store::EntityKind::Article, 1).unwrap();
        let model = assemble_page(&store, "front");
        // top-stories only had article 1 visible; news collapses
        assert_eq!(section_slugs(&model.sections), vec!["coming-soon"]);
    }

    #[test]
    fn assembly_is_idempotent() {
        let store = sample_store();
        assert_eq!(assemble_page(&store, "front"), assemble_page(&store, "front"));
    }

    #[test]
    fn markdown_rendered_once_per_visible_field() {
        let store = sample_store();
        let renderer = CountingRenderer::default();
        let iframe = IframeConfig::default();
        let page = store.page_by_slug("front").unwrap();
        let tree = load_page_tree(&store, page);
        let model = Assembler::new(&renderer, &iframe, today()).assemble(&tree);

        let visible: usize = model
            .sections
            .iter()
            .chain(&model.special_sections)
            .flat_map(|s| &s.racks)
            .map(|r| r.hangers.len())
            .sum();
        assert_eq!(visible, 2);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), visible * 2);
    }

    #[test]
    fn article_projection_resolves_references() {
        let store = sample_store();
        let model = assemble_page(&store, "front");
        let bridge = &model.sections[0].racks[0].hangers[0].article;

        assert_eq!(bridge.author.as_deref(), Some("Grace Hopper"));
        assert!(bridge.summary_html.contains("<strong>bridge-reopens</strong>"));
        assert!(bridge.content_html.contains("<em>bridge-reopens</em>"));
        let image = bridge.featured_image.as_ref().unwrap();
        assert_eq!(image.url, "/media/masthead.jpg");
        assert_eq!(bridge.url(), "/article/bridge-reopens/");
    }

    #[test]
    fn teaser_falls_back_to_content() {
        let store = sample_store();
        let renderer = CmarkRenderer::new();
        let iframe = IframeConfig::default();
        let assembler = Assembler::new(&renderer, &iframe, today());

        let mut art = article(1, "no-summary", "2024-01-01");
        art.summary = String::new();
        let node = load_article_node(&store, &art);
        let view = assembler.project_article(&node);
        assert!(view.teaser_html().contains("Body of"));

        art.if_summary_blank = SummaryFallback::ShowBlank;
        let view = assembler.project_article(&load_article_node(&store, &art));
        assert_eq!(view.teaser_html(), "");
    }

    #[test]
    fn render_model_serializes_to_json() {
        let store = sample_store();
        let model = assemble_page(&store, "front");
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["page"]["slug"], "front");
        assert_eq!(json["special_sections"][0]["placement"], "special");
        assert_eq!(
            json["sections"][0]["racks"][0]["show_article_meta"],
            "author_and_date"
        );
    }
}
