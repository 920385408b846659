//! Shared test utilities for the rackpress test suite.
//!
//! Record builders with sensible defaults, a small but complete sample
//! store, and fixture setup for filesystem tests.
//!
//! # The sample store
//!
//! ```text
//! page 1 "front" (home)                  menus: Sections (10) attached, Main (1000)
//! ├── section 1 "news"           order 1
//! │   ├── rack 1 "top-stories"   hangers: 1 → article 1 (published)
//! │   │                                   2 → article 2 (2099, future)
//! │   └── rack 2 "briefs"        hangers: 3 → article 3 (expired 2024-02-01)
//! ├── section 2 "notices"        order 2, special
//! │   └── rack 3 "notice-board"  hangers: 4 → article 4 (do_not_display)
//! │                                       6 → article 6 (published)
//! └── section 3 "coming-soon"    order 3, collapse = false, no racks
//! page 2 "about"
//! └── section 4 "about-body"
//!     └── rack 4 "about-rack"    hangers: 5 → article 5
//! ```
//!
//! Use [`today`] (2024-06-15) as the reference date.

use chrono::NaiveDate;
use std::path::Path;
use tempfile::TempDir;

use crate::model::*;
use crate::store::MemoryStore;

// =========================================================================
// Dates
// =========================================================================

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_else(|e| panic!("bad date {s}: {e}"))
}

/// Reference "today" for every test against [`sample_store`].
pub fn today() -> NaiveDate {
    date("2024-06-15")
}

// =========================================================================
// Record builders
// =========================================================================

pub fn page(id: Id, slug: &str) -> Page {
    Page {
        id,
        title: slug.replace('-', " "),
        show_title: true,
        slug: slug.to_string(),
        is_home: false,
        order: 0,
        display: PageDisplay::Normal,
    }
}

pub fn section(id: Id, page: Option<Id>, slug: &str) -> Section {
    Section {
        id,
        page,
        title: String::new(),
        show_title: true,
        slug: slug.to_string(),
        order: 0,
        content_before_racks: String::new(),
        content_after_racks: String::new(),
        display: Display::Normal,
        collapse: true,
        placement: Placement::Regular,
    }
}

pub fn rack(id: Id, section: Option<Id>, slug: &str) -> Rack {
    Rack {
        id,
        section,
        title: String::new(),
        show_title: false,
        slug: slug.to_string(),
        width: 1,
        show_article_meta: ArticleMeta::None,
        content_before_articles: String::new(),
        content_after_articles: String::new(),
        order: 0,
        display: Display::Normal,
        collapse: true,
    }
}

pub fn hanger(id: Id, rack: Option<Id>, article: Option<Id>, order: i32) -> Hanger {
    Hanger {
        id,
        rack,
        article,
        order,
        expiration_date: None,
    }
}

pub fn article(id: Id, slug: &str, publish_date: &str) -> Article {
    Article {
        id,
        title: slug.replace('-', " "),
        show_title: true,
        author: None,
        slug: slug.to_string(),
        iframe_document: None,
        iframe_src: String::new(),
        iframe_height: String::new(),
        content: format!("Body of *{slug}*."),
        content_classes: String::new(),
        summary: format!("Summary of **{slug}**."),
        if_summary_blank: SummaryFallback::ShowContent,
        read_more: "Read More".to_string(),
        created: None,
        updated: None,
        publish_date: date(publish_date),
        display: Display::Normal,
        featured_image: None,
    }
}

pub fn image(id: Id, name: &str) -> Image {
    Image {
        id,
        file: format!("{name}.jpg"),
        name: name.to_string(),
        alt_text: format!("{name} alt"),
        title: String::new(),
    }
}

fn comment(id: Id, article: Id, name: &str, when: &str, active: bool) -> Comment {
    Comment {
        id,
        article,
        name: name.to_string(),
        email: format!("{}@example.org", name.to_lowercase()),
        content: format!("{name} says hello"),
        when: chrono::NaiveDateTime::parse_from_str(when, "%Y-%m-%d %H:%M")
            .unwrap_or_else(|e| panic!("bad timestamp {when}: {e}")),
        active,
    }
}

fn menuitem(id: Id, menu: Id, label: &str, href: &str, order: i32) -> Menuitem {
    Menuitem {
        id,
        menu: Some(menu),
        href: href.to_string(),
        label: label.to_string(),
        order,
    }
}

// =========================================================================
// Sample store
// =========================================================================

/// The store drawn in the module docs.
pub fn sample_store() -> MemoryStore {
    let mut front = page(1, "front");
    front.title = "Front Page".to_string();
    front.is_home = true;
    let mut about = page(2, "about");
    about.order = 10;

    let mut news = section(1, Some(1), "news");
    news.title = "News".to_string();
    news.order = 1;
    let mut notices = section(2, Some(1), "notices");
    notices.order = 2;
    notices.placement = Placement::Special;
    let mut coming = section(3, Some(1), "coming-soon");
    coming.order = 3;
    coming.collapse = false;
    coming.content_before_racks = "Stay tuned.".to_string();
    let about_body = section(4, Some(2), "about-body");

    let mut top = rack(1, Some(1), "top-stories");
    top.title = "Top Stories".to_string();
    top.show_title = true;
    top.width = 2;
    top.show_article_meta = ArticleMeta::AuthorAndDate;
    let mut briefs = rack(2, Some(1), "briefs");
    briefs.order = 2;
    let board = rack(3, Some(2), "notice-board");
    let about_rack = rack(4, Some(4), "about-rack");

    let mut bridge = article(1, "bridge-reopens", "2024-05-01");
    bridge.title = "Bridge reopens".to_string();
    bridge.author = Some(1);
    bridge.featured_image = Some(1);
    let festival = article(2, "festival-next-week", "2099-01-01");
    let old_notice = article(3, "old-notice", "2024-01-01");
    let mut draft = article(4, "draft", "2024-01-01");
    draft.display = Display::DoNotDisplay;
    let about_us = article(5, "about-us", "2023-01-01");
    let road = article(6, "road-closures", "2024-06-01");

    let mut expired = hanger(3, Some(2), Some(3), 0);
    expired.expiration_date = Some(date("2024-02-01"));

    MemoryStore {
        pages: vec![front, about],
        sections: vec![news, notices, coming, about_body],
        racks: vec![top, briefs, board, about_rack],
        hangers: vec![
            hanger(1, Some(1), Some(1), 0),
            hanger(2, Some(1), Some(2), 1),
            expired,
            hanger(4, Some(3), Some(4), 0),
            hanger(5, Some(4), Some(5), 0),
            hanger(6, Some(3), Some(6), 1),
        ],
        articles: vec![bridge, festival, old_notice, draft, about_us, road],
        authors: vec![Author {
            id: 1,
            name: "Grace Hopper".to_string(),
        }],
        documents: vec![],
        images: vec![image(1, "masthead")],
        menus: vec![
            Menu {
                id: 1,
                name: "Main".to_string(),
                level: 1000,
            },
            Menu {
                id: 2,
                name: "Sections".to_string(),
                level: 10,
            },
        ],
        menuitems: vec![
            menuitem(2, 1, "About", "/about/", 2),
            menuitem(1, 1, "Home", "/", 1),
            menuitem(3, 2, "News", "/front/#news", 1),
        ],
        menu_pages: vec![MenuPage {
            id: 1,
            menu: 2,
            page: 1,
        }],
        comments: vec![
            comment(1, 1, "Ada", "2024-05-02 09:00", true),
            comment(2, 1, "Bob", "2024-05-03 10:30", false),
        ],
    }
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}
