//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **content-centric**. Every entity leads with its positional
//! index and title; slugs, visibility and counts follow as secondary detail.
//! The `check` inventory mirrors the page tree so an editor can see at a
//! glance why an article is or isn't on a page today.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Pages
//! 001 Front Page [home]
//!     001 News
//!         001 Top Stories (2 hangers)
//!             001 Bridge reopens
//!             002 festival next week (not yet published)
//!         002 briefs (1 hanger)
//!             001 old notice (expired)
//!     002 notices [special]
//!     003 coming-soon [always shown]
//!
//! Menus
//!     Main (level 1000): Home, About
//!
//! Images
//!     masthead → ![masthead alt](/media/masthead.jpg)
//!
//! 1 comment awaiting approval
//! ```
//!
//! ## Build
//!
//! ```text
//! Home (front) → index.html
//! Pages
//!     001 front → front/index.html
//! Articles
//!     001 bridge-reopens → article/bridge-reopens/index.html
//! Generated 2 pages, 4 articles, 3 racks, 0 media files
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::assemble::{exclusion_reason, load_page_tree};
use crate::generate::BuildSummary;
use crate::model::{Comment, Id, PageDisplay, Placement};
use crate::store::detach::DeleteReport;
use crate::store::{ContentRepository, EntityKind, MemoryStore, menu_order};
use chrono::NaiveDate;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Title when there is one, slug otherwise.
fn label<'a>(title: &'a str, slug: &'a str) -> &'a str {
    if title.trim().is_empty() { slug } else { title }
}

/// Format an entity header: positional index + label, with optional detail.
///
/// ```text
/// 001 Top Stories (2 hangers)
/// 002 notices [special]
/// ```
fn entity_header(index: usize, label: &str, detail: Option<&str>) -> String {
    match detail {
        Some(d) => format!("{} {} {}", format_index(index), label, d),
        None => format!("{} {}", format_index(index), label),
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max).collect::<String>())
    }
}

// ============================================================================
// check
// ============================================================================

/// Format the content inventory shown by `check`.
///
/// Hangers that would not render on `today` carry the reason in parens.
pub fn format_check_output(store: &MemoryStore, today: NaiveDate) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];

    for (pi, page) in store.pages().into_iter().enumerate() {
        let mut flags = Vec::new();
        if page.is_home {
            flags.push("home");
        }
        match page.display {
            PageDisplay::Normal => {}
            PageDisplay::HiddenFromMenus => flags.push("hidden from menus"),
            PageDisplay::DoNotDisplay => flags.push("not displayed"),
        }
        let detail = (!flags.is_empty()).then(|| format!("[{}]", flags.join(", ")));
        lines.push(entity_header(
            pi + 1,
            label(&page.title, &page.slug),
            detail.as_deref(),
        ));

        let tree = load_page_tree(store, page);
        for (si, section_tree) in tree.sections.iter().enumerate() {
            let section = section_tree.section;
            let mut flags = Vec::new();
            if section.placement == Placement::Special {
                flags.push("special");
            }
            if !section.collapse {
                flags.push("always shown");
            }
            let detail = (!flags.is_empty()).then(|| format!("[{}]", flags.join(", ")));
            lines.push(format!(
                "{}{}",
                indent(1),
                entity_header(
                    si + 1,
                    label(&section.title, &section.slug),
                    detail.as_deref()
                )
            ));

            for (ri, rack_tree) in section_tree.racks.iter().enumerate() {
                let rack = rack_tree.rack;
                let count = format!("({})", plural(rack_tree.hangers.len(), "hanger", "hangers"));
                lines.push(format!(
                    "{}{}",
                    indent(2),
                    entity_header(ri + 1, label(&rack.title, &rack.slug), Some(&count))
                ));

                for (hi, node) in rack_tree.hangers.iter().enumerate() {
                    let name = node
                        .article
                        .map(|a| label(&a.article.title, &a.article.slug))
                        .unwrap_or("(no article)");
                    let reason = exclusion_reason(node, today).map(|r| format!("({r})"));
                    lines.push(format!(
                        "{}{}",
                        indent(3),
                        entity_header(hi + 1, name, reason.as_deref())
                    ));
                }
            }
        }
    }

    let unplaced = [
        (
            "sections without a page",
            store.sections.iter().filter(|s| s.page.is_none()).count(),
        ),
        (
            "racks without a section",
            store.racks.iter().filter(|r| r.section.is_none()).count(),
        ),
        (
            "hangers without a rack",
            store.hangers.iter().filter(|h| h.rack.is_none()).count(),
        ),
    ];
    if unplaced.iter().any(|(_, n)| *n > 0) {
        lines.push(String::new());
        lines.push("Unplaced".to_string());
        for (what, n) in unplaced.iter().filter(|(_, n)| *n > 0) {
            lines.push(format!("{}{} {}", indent(1), n, what));
        }
    }

    let mut menus: Vec<_> = store.menus.iter().collect();
    menus.sort_by(|a, b| menu_order(a, b));
    if !menus.is_empty() {
        lines.push(String::new());
        lines.push("Menus".to_string());
        for menu in menus {
            let items: Vec<&str> = store
                .menu_items(menu.id)
                .into_iter()
                .map(|item| item.label.as_str())
                .collect();
            lines.push(format!(
                "{}{} (level {}): {}",
                indent(1),
                menu.name,
                menu.level,
                items.join(", ")
            ));
        }
    }

    let mut images: Vec<_> = store.images.iter().collect();
    images.sort_by(|a, b| a.name.cmp(&b.name));
    if !images.is_empty() {
        lines.push(String::new());
        lines.push("Images".to_string());
        for image in images {
            lines.push(format!(
                "{}{} → {}",
                indent(1),
                image.name,
                image.markdown_code()
            ));
        }
    }

    lines.push(String::new());
    let pending = store.pending_comments().len();
    lines.push(format!(
        "{} awaiting approval",
        plural(pending, "comment", "comments")
    ));

    lines
}

/// Print the content inventory to stdout.
pub fn print_check_output(store: &MemoryStore, today: NaiveDate) {
    for line in format_check_output(store, today) {
        println!("{}", line);
    }
}

// ============================================================================
// build
// ============================================================================

/// Format what a build wrote, with output paths.
pub fn format_build_output(summary: &BuildSummary) -> Vec<String> {
    let mut lines = vec![format!("Home ({}) \u{2192} index.html", summary.home)];

    let groups: [(&str, &[String], &str); 3] = [
        ("Pages", summary.pages.as_slice(), ""),
        ("Articles", summary.articles.as_slice(), "article/"),
        ("Racks", summary.racks.as_slice(), "rack/"),
    ];
    for (heading, slugs, prefix) in groups {
        if slugs.is_empty() {
            continue;
        }
        lines.push(heading.to_string());
        for (i, slug) in slugs.iter().enumerate() {
            lines.push(format!(
                "{}{} {} \u{2192} {}{}/index.html",
                indent(1),
                format_index(i + 1),
                slug,
                prefix,
                slug
            ));
        }
    }

    lines.push(format!(
        "Generated {}, {}, {}, {}",
        plural(summary.pages.len(), "page", "pages"),
        plural(summary.articles.len(), "article", "articles"),
        plural(summary.racks.len(), "rack", "racks"),
        plural(summary.media_files, "media file", "media files"),
    ));
    lines
}

/// Print build output to stdout.
pub fn print_build_output(summary: &BuildSummary) {
    for line in format_build_output(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// delete
// ============================================================================

pub fn format_delete_report(kind: EntityKind, id: Id, report: &DeleteReport) -> Vec<String> {
    let mut lines = vec![format!("Deleted {} {}", kind, id)];
    if report.detached > 0 {
        lines.push(format!(
            "{}{} detached",
            indent(1),
            plural(report.detached, "reference", "references")
        ));
    }
    if report.removed > 0 {
        lines.push(format!(
            "{}{} removed",
            indent(1),
            plural(report.removed, "dependent record", "dependent records")
        ));
    }
    lines
}

pub fn print_delete_report(kind: EntityKind, id: Id, report: &DeleteReport) {
    for line in format_delete_report(kind, id, report) {
        println!("{}", line);
    }
}

// ============================================================================
// comments
// ============================================================================

/// Pending comments, one header line plus a preview each.
///
/// ```text
/// #2 Bob <bob@example.org> on bridge-reopens, 2024-05-03 10:30
///     Bob says hello
/// ```
pub fn format_pending_comments(store: &MemoryStore) -> Vec<String> {
    let pending: Vec<&Comment> = store.pending_comments();
    if pending.is_empty() {
        return vec!["No comments awaiting approval".to_string()];
    }
    let mut lines = Vec::new();
    for comment in pending {
        let article = store
            .article(comment.article)
            .map(|a| a.slug.as_str())
            .unwrap_or("?");
        lines.push(format!(
            "#{} {} <{}> on {}, {}",
            comment.id,
            comment.name,
            comment.email,
            article,
            comment.when.format("%Y-%m-%d %H:%M")
        ));
        let preview = truncate_desc(comment.content.trim(), 60);
        if !preview.is_empty() {
            lines.push(format!("{}{}", indent(1), preview));
        }
    }
    lines
}

pub fn print_pending_comments(store: &MemoryStore) {
    for line in format_pending_comments(store) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
