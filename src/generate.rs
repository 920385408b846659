//! HTML site generation.
//!
//! Renders every displayable page, rack and article of a content store into
//! a static site. Each page goes through [`Assembler`] first, so what shows
//! up in the HTML is exactly what the visibility rules keep for `today`.
//!
//! ## Generated Pages
//!
//! - **Home page** (`/index.html`): the first page marked `is_home`
//! - **Pages** (`/{page}/index.html`): regular sections in `main`, special
//!   sections in `aside.special-sections`
//! - **Articles** (`/article/{article}/index.html`): full content, embed,
//!   featured image and approved comments, for every published article
//! - **Racks** (`/rack/{rack}/index.html`): one rack on its own, when it has
//!   something to show
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html                 # Home page
//! ├── front/index.html           # One directory per page slug
//! ├── article/
//! │   └── bridge-reopens/index.html
//! ├── rack/
//! │   └── top-stories/index.html
//! └── media/                     # content/media/, copied verbatim
//! ```
//!
//! ## CSS
//!
//! `static/style.css` is embedded at compile time and prefixed with the
//! color custom properties from `config.toml`.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Markdown arrives already converted in the view model; everything else is
//! escaped by maud.

use crate::assemble::{
    ArticleView, Assembler, RackView, RenderModel, SectionView, load_article_node,
    load_page_tree, load_rack_tree,
};
use crate::config::{self, ConfigError, SiteConfig};
use crate::markdown::{CmarkRenderer, MarkdownRenderer};
use crate::model::{Article, ArticleMeta, Comment, Display, Image, Menu, Page, PageDisplay, Rack};
use crate::store::{ContentRepository, StoreError};
use chrono::NaiveDate;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("No home page: mark one page with is_home = true")]
    NoHomePage,
    #[error("No page with slug '{0}'")]
    PageNotFound(String),
}

const CSS_STATIC: &str = include_str!("../static/style.css");

/// Uploaded documents and images, relative to the content root.
pub const MEDIA_DIR: &str = "media";

/// What a build wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub home: String,
    pub pages: Vec<String>,
    pub articles: Vec<String>,
    pub racks: Vec<String>,
    pub media_files: usize,
}

// ============================================================================
// Entry points
// ============================================================================

/// Assemble one page by slug.
pub fn page_model<R: ContentRepository>(
    repo: &R,
    config: &SiteConfig,
    slug: &str,
    today: NaiveDate,
) -> Result<RenderModel, GenerateError> {
    let page = repo
        .page_by_slug(slug)
        .ok_or_else(|| GenerateError::PageNotFound(slug.to_string()))?;
    let renderer = CmarkRenderer::new();
    let tree = load_page_tree(repo, page);
    Ok(Assembler::new(&renderer, &config.iframe, today).assemble(&tree))
}

/// [`page_model`] as pretty-printed JSON.
pub fn page_model_json<R: ContentRepository>(
    repo: &R,
    config: &SiteConfig,
    slug: &str,
    today: NaiveDate,
) -> Result<String, GenerateError> {
    let model = page_model(repo, config, slug, today)?;
    Ok(serde_json::to_string_pretty(&model)?)
}

/// Render the whole site into `output_dir`.
///
/// Pages, racks and articles are rendered in parallel on the global rayon
/// pool, then written in order. `source_dir/media` is copied if present.
pub fn generate<R: ContentRepository>(
    repo: &R,
    config: &SiteConfig,
    source_dir: &Path,
    output_dir: &Path,
    today: NaiveDate,
) -> Result<BuildSummary, GenerateError> {
    let home = repo.home_page().ok_or(GenerateError::NoHomePage)?;
    let renderer = CmarkRenderer::new();
    let site = SiteRenderer::new(repo, config, &renderer, today);

    let pages: Vec<&Page> = repo
        .pages()
        .into_iter()
        .filter(|p| p.display != PageDisplay::DoNotDisplay)
        .collect();
    let racks: Vec<&Rack> = repo
        .racks()
        .into_iter()
        .filter(|r| r.display != Display::DoNotDisplay)
        .collect();
    let articles: Vec<&Article> = repo
        .articles()
        .into_iter()
        .filter(|a| a.display != Display::DoNotDisplay && a.publish_date <= today)
        .collect();

    let home_html = site.page(home);
    let page_files: Vec<(String, Markup)> = pages
        .par_iter()
        .map(|page| (page.slug.clone(), site.page(page)))
        .collect();
    let rack_files: Vec<(String, Markup)> = racks
        .par_iter()
        .filter_map(|rack| site.rack_page(rack).map(|html| (rack.slug.clone(), html)))
        .collect();
    let article_files: Vec<(String, Markup)> = articles
        .par_iter()
        .map(|article| (article.slug.clone(), site.article_page(article)))
        .collect();

    fs::create_dir_all(output_dir)?;
    write_html(output_dir, "index.html", home_html)?;

    let mut summary = BuildSummary {
        home: home.slug.clone(),
        ..BuildSummary::default()
    };
    for (slug, html) in page_files {
        write_html(output_dir, &format!("{slug}/index.html"), html)?;
        summary.pages.push(slug);
    }
    for (slug, html) in article_files {
        write_html(output_dir, &format!("article/{slug}/index.html"), html)?;
        summary.articles.push(slug);
    }
    for (slug, html) in rack_files {
        write_html(output_dir, &format!("rack/{slug}/index.html"), html)?;
        summary.racks.push(slug);
    }

    summary.media_files = copy_media(source_dir, output_dir)?;
    tracing::info!(output = %output_dir.display(), "site generated");
    Ok(summary)
}

fn write_html(output_dir: &Path, rel_path: &str, html: Markup) -> Result<(), GenerateError> {
    let path = output_dir.join(rel_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, html.into_string())?;
    tracing::info!(path = rel_path, "generated");
    Ok(())
}

/// Copy `source_dir/media/` to `output_dir/media/`, returning the file count.
fn copy_media(source_dir: &Path, output_dir: &Path) -> Result<usize, GenerateError> {
    let media = source_dir.join(MEDIA_DIR);
    if !media.is_dir() {
        return Ok(0);
    }
    let target = output_dir.join(MEDIA_DIR);
    let mut copied = 0;
    for entry in WalkDir::new(&media) {
        let entry = entry.map_err(std::io::Error::from)?;
        let Ok(rel) = entry.path().strip_prefix(&media) else {
            continue;
        };
        let dst = target.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dst)?;
        } else {
            fs::copy(entry.path(), &dst)?;
            copied += 1;
        }
    }
    Ok(copied)
}

// ============================================================================
// Menus
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLink {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuView {
    pub name: String,
    pub links: Vec<MenuLink>,
}

/// Resolve menus to their ordered links.
pub fn menu_views<R: ContentRepository>(repo: &R, menus: &[&Menu]) -> Vec<MenuView> {
    menus
        .iter()
        .map(|menu| MenuView {
            name: menu.name.clone(),
            links: repo
                .menu_items(menu.id)
                .into_iter()
                .map(|item| MenuLink {
                    label: item.label.clone(),
                    href: item.href.clone(),
                })
                .collect(),
        })
        .collect()
}

// ============================================================================
// Site renderer
// ============================================================================

/// Renders complete documents for one site on one day.
pub struct SiteRenderer<'a, R: ContentRepository> {
    repo: &'a R,
    config: &'a SiteConfig,
    renderer: &'a dyn MarkdownRenderer,
    assembler: Assembler<'a>,
    css: String,
    banner: Option<&'a Image>,
    main_menus: Vec<MenuView>,
}

impl<'a, R: ContentRepository> SiteRenderer<'a, R> {
    pub fn new(
        repo: &'a R,
        config: &'a SiteConfig,
        renderer: &'a dyn MarkdownRenderer,
        today: NaiveDate,
    ) -> Self {
        let banner = config.banner.image.as_deref().and_then(|name| {
            let image = repo.image_by_name(name);
            if image.is_none() {
                tracing::warn!(name, "banner image not found in store");
            }
            image
        });
        Self {
            repo,
            config,
            renderer,
            assembler: Assembler::new(renderer, &config.iframe, today),
            css: format!(
                "{}\n\n{}",
                config::generate_color_css(&config.colors),
                CSS_STATIC
            ),
            banner,
            main_menus: menu_views(repo, &repo.main_menus(config.menus.main_level)),
        }
    }

    pub fn page(&self, page: &Page) -> Markup {
        let model = self.assembler.assemble(&load_page_tree(self.repo, page));
        let page_menus = menu_views(self.repo, &self.repo.menus_for_page(page.id));
        let current = self.config.url(&format!("{}/", page.slug));
        let body = render_page_body(&model, self.renderer, self.config);
        self.document(&page.title, "page-view", &current, &page_menus, body)
    }

    /// `None` when the rack has nothing visible.
    pub fn rack_page(&self, rack: &Rack) -> Option<Markup> {
        let view = self.assembler.assemble_rack(&load_rack_tree(self.repo, rack))?;
        let current = self.config.url(&format!("rack/{}/", rack.slug));
        let body = html! {
            main.rack-page {
                (render_rack(&view, self.renderer, self.config))
            }
        };
        Some(self.document(&rack.title, "rack-view", &current, &[], body))
    }

    pub fn article_page(&self, article: &Article) -> Markup {
        let view = self
            .assembler
            .project_article(&load_article_node(self.repo, article));
        let comments = self.repo.active_comments(article.id);
        let current = self.config.url(&view.url());

        let body = html! {
            main.article-page {
                article class=(class_list("article-full", &view.content_classes)) {
                    @if view.show_title {
                        h1.article-title { (view.title) }
                    }
                    (render_article_meta(&view, ArticleMeta::AuthorAndDate))
                    @if let Some(image) = &view.featured_image {
                        figure.featured-image {
                            img src=(self.config.url(&image.url)) alt=(image.alt_text);
                            @if !image.title.is_empty() {
                                figcaption { (image.title) }
                            }
                        }
                    }
                    @if let Some(embed) = &view.iframe {
                        iframe.article-embed src=(embed.href(self.config))
                            style={ "height: " (embed.height) ";" } loading="lazy" {}
                    }
                    div.article-content {
                        (PreEscaped(view.content_html.as_str()))
                    }
                }
                (render_comments(&comments))
            }
        };

        self.document(&view.title, "article-view", &current, &[], body)
    }

    fn document(
        &self,
        title: &str,
        body_class: &str,
        current: &str,
        page_menus: &[MenuView],
        content: Markup,
    ) -> Markup {
        let full_title = if title.is_empty() {
            self.config.site_name.clone()
        } else {
            format!("{title} | {}", self.config.site_name)
        };
        let banner = self
            .banner
            .map(|image| (self.config.url(&image.url()), image.alt_text.as_str()));
        let content = html! {
            (site_header(
                &self.config.site_name,
                &self.config.url(""),
                banner,
                &self.main_menus,
                page_menus,
                current,
            ))
            (content)
        };
        base_document(&full_title, &self.css, Some(body_class), content)
    }
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, css: &str, body_class: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(css)) }
            }
            body class=[body_class] {
                (content)
            }
        }
    }
}

/// Renders the site header: banner, site name, main menus, then page menus
fn site_header(
    site_name: &str,
    home_href: &str,
    banner: Option<(String, &str)>,
    main_menus: &[MenuView],
    page_menus: &[MenuView],
    current: &str,
) -> Markup {
    html! {
        header.site-header {
            @if let Some((src, alt)) = banner {
                a.banner href=(home_href) {
                    img src=(src) alt=(alt);
                }
            }
            a.site-name href=(home_href) { (site_name) }
            @if !main_menus.is_empty() {
                nav.main-menus {
                    (render_menus(main_menus, current))
                }
            }
            @if !page_menus.is_empty() {
                nav.page-menus {
                    (render_menus(page_menus, current))
                }
            }
        }
    }
}

pub fn render_menus(menus: &[MenuView], current: &str) -> Markup {
    html! {
        @for menu in menus {
            ul.menu data-menu=(menu.name) {
                @for link in &menu.links {
                    li class=[(link.href == current).then_some("current")] {
                        a href=(link.href) { (link.label) }
                    }
                }
            }
        }
    }
}

/// Page content: regular sections in `main`, special ones in an `aside`
pub fn render_page_body(
    model: &RenderModel,
    renderer: &dyn MarkdownRenderer,
    config: &SiteConfig,
) -> Markup {
    html! {
        main.page-content {
            @if model.page.show_title {
                h1.page-title { (model.page.title) }
            }
            @for section in &model.sections {
                (render_section(section, renderer, config))
            }
        }
        @if !model.special_sections.is_empty() {
            aside.special-sections {
                @for section in &model.special_sections {
                    (render_section(section, renderer, config))
                }
            }
        }
    }
}

fn render_section(
    section: &SectionView,
    renderer: &dyn MarkdownRenderer,
    config: &SiteConfig,
) -> Markup {
    html! {
        section.section id=(section.slug) {
            @if section.show_title && !section.title.is_empty() {
                h2.section-title { (section.title) }
            }
            (markdown_block(renderer, &section.content_before_racks, "section-before"))
            @for rack in &section.racks {
                (render_rack(rack, renderer, config))
            }
            (markdown_block(renderer, &section.content_after_racks, "section-after"))
        }
    }
}

fn render_rack(rack: &RackView, renderer: &dyn MarkdownRenderer, config: &SiteConfig) -> Markup {
    html! {
        div.rack id=(rack.slug) style={ "--rack-width: " (rack.width) ";" } {
            @if rack.show_title && !rack.title.is_empty() {
                h2.rack-title { (rack.title) }
            }
            (markdown_block(renderer, &rack.content_before_articles, "rack-before"))
            div.rack-articles {
                @for hanger in &rack.hangers {
                    (render_teaser(&hanger.article, rack.show_article_meta, config))
                }
            }
            (markdown_block(renderer, &rack.content_after_articles, "rack-after"))
        }
    }
}

/// An article as it appears inside a rack
fn render_teaser(article: &ArticleView, meta: ArticleMeta, config: &SiteConfig) -> Markup {
    let href = config.url(&article.url());
    html! {
        article class=(class_list("teaser", &article.content_classes)) {
            @if let Some(image) = &article.featured_image {
                a.featured-image href=(href) {
                    img src=(config.url(&image.url)) alt=(image.alt_text) loading="lazy";
                }
            }
            @if article.show_title {
                h3.article-title {
                    a href=(href) { (article.title) }
                }
            }
            (render_article_meta(article, meta))
            div.article-summary {
                (PreEscaped(article.teaser_html()))
            }
            @if !article.summary_html.is_empty() && !article.read_more.is_empty() {
                a.read-more href=(href) { (article.read_more) }
            }
        }
    }
}

fn render_article_meta(article: &ArticleView, meta: ArticleMeta) -> Markup {
    let author = article.author.as_deref().filter(|_| meta.shows_author());
    let date = meta.shows_date().then_some(article.publish_date);
    html! {
        @if author.is_some() || date.is_some() {
            p.article-meta {
                @if let Some(name) = author {
                    span.article-author { (name) }
                }
                @if let Some(date) = date {
                    time datetime=(date.format("%Y-%m-%d").to_string()) {
                        (date.format("%B %-d, %Y").to_string())
                    }
                }
            }
        }
    }
}

/// Approved comments, already in time order
fn render_comments(comments: &[&Comment]) -> Markup {
    html! {
        @if !comments.is_empty() {
            section.comments {
                h2 { "Comments" }
                @for comment in comments {
                    article.comment {
                        p.comment-meta {
                            span.comment-author { (comment.name) }
                            " "
                            time datetime=(comment.when.format("%Y-%m-%dT%H:%M").to_string()) {
                                (comment.when.format("%B %-d, %Y %H:%M").to_string())
                            }
                        }
                        p.comment-body { (comment.content) }
                    }
                }
            }
        }
    }
}

/// Markdown rendered into a wrapper div, or nothing when blank
fn markdown_block(renderer: &dyn MarkdownRenderer, text: &str, class: &str) -> Markup {
    let body = renderer.convert(text);
    html! {
        @if !body.is_empty() {
            div class=(class) { (PreEscaped(body)) }
        }
    }
}

fn class_list(base: &str, extra: &str) -> String {
    if extra.trim().is_empty() {
        base.to_string()
    } else {
        format!("{base} {}", extra.trim())
    }
}

// ============================================================================
// Tests
// ============================================================================
