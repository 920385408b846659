//! Deletion and moderation on the memory store.
//!
//! Deleting a record never deletes the records that point at it. Their
//! reference is set to `None` instead:
//!
//! | Deleted | Detached | Removed with it |
//! |---------|----------|-----------------|
//! | page | sections (`page`) | menu pages |
//! | section | racks (`section`) | |
//! | rack | hangers (`rack`) | |
//! | article | hangers (`article`) | comments |
//! | author | articles (`author`) | |
//! | document | articles (`iframe_document`) | |
//! | image | articles (`featured_image`) | |
//! | menu | menu items (`menu`) | menu pages |
//!
//! A detached hanger stays in the store and simply stops rendering.

use super::{EntityKind, MemoryStore, StoreError};
use crate::model::{Comment, Id};

/// What a delete touched besides the record itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// References set to `None`.
    pub detached: usize,
    /// Dependent records removed together with the target.
    pub removed: usize,
}

/// Remove the record with `id` from `items`, or report it missing.
fn take<T>(
    items: &mut Vec<T>,
    kind: EntityKind,
    id: Id,
    id_of: impl Fn(&T) -> Id,
) -> Result<T, StoreError> {
    let pos = items
        .iter()
        .position(|item| id_of(item) == id)
        .ok_or(StoreError::NotFound(kind, id))?;
    Ok(items.remove(pos))
}

/// Set every matching reference to `None`, returning how many changed.
fn nullify<'a>(refs: impl Iterator<Item = &'a mut Option<Id>>, id: Id) -> usize {
    let mut count = 0;
    for reference in refs {
        if *reference == Some(id) {
            *reference = None;
            count += 1;
        }
    }
    count
}

/// Drop every item matching `doomed`, returning how many went.
fn remove_where<T>(items: &mut Vec<T>, doomed: impl Fn(&T) -> bool) -> usize {
    let before = items.len();
    items.retain(|item| !doomed(item));
    before - items.len()
}

impl MemoryStore {
    /// Delete one record of `kind`, detaching or removing its dependents.
    pub fn delete(&mut self, kind: EntityKind, id: Id) -> Result<DeleteReport, StoreError> {
        let report = match kind {
            EntityKind::Page => {
                take(&mut self.pages, kind, id, |p| p.id)?;
                DeleteReport {
                    detached: nullify(self.sections.iter_mut().map(|s| &mut s.page), id),
                    removed: remove_where(&mut self.menu_pages, |mp| mp.page == id),
                }
            }
            EntityKind::Section => {
                take(&mut self.sections, kind, id, |s| s.id)?;
                DeleteReport {
                    detached: nullify(self.racks.iter_mut().map(|r| &mut r.section), id),
                    removed: 0,
                }
            }
            EntityKind::Rack => {
                take(&mut self.racks, kind, id, |r| r.id)?;
                DeleteReport {
                    detached: nullify(self.hangers.iter_mut().map(|h| &mut h.rack), id),
                    removed: 0,
                }
            }
            EntityKind::Article => {
                take(&mut self.articles, kind, id, |a| a.id)?;
                DeleteReport {
                    detached: nullify(self.hangers.iter_mut().map(|h| &mut h.article), id),
                    removed: remove_where(&mut self.comments, |c| c.article == id),
                }
            }
            EntityKind::Author => {
                take(&mut self.authors, kind, id, |a| a.id)?;
                DeleteReport {
                    detached: nullify(self.articles.iter_mut().map(|a| &mut a.author), id),
                    removed: 0,
                }
            }
            EntityKind::Document => {
                take(&mut self.documents, kind, id, |d| d.id)?;
                DeleteReport {
                    detached: nullify(
                        self.articles.iter_mut().map(|a| &mut a.iframe_document),
                        id,
                    ),
                    removed: 0,
                }
            }
            EntityKind::Image => {
                take(&mut self.images, kind, id, |i| i.id)?;
                DeleteReport {
                    detached: nullify(
                        self.articles.iter_mut().map(|a| &mut a.featured_image),
                        id,
                    ),
                    removed: 0,
                }
            }
            EntityKind::Menu => {
                take(&mut self.menus, kind, id, |m| m.id)?;
                DeleteReport {
                    detached: nullify(self.menuitems.iter_mut().map(|m| &mut m.menu), id),
                    removed: remove_where(&mut self.menu_pages, |mp| mp.menu == id),
                }
            }
            EntityKind::Hanger => {
                take(&mut self.hangers, kind, id, |h| h.id)?;
                DeleteReport::default()
            }
            EntityKind::Menuitem => {
                take(&mut self.menuitems, kind, id, |m| m.id)?;
                DeleteReport::default()
            }
            EntityKind::MenuPage => {
                take(&mut self.menu_pages, kind, id, |m| m.id)?;
                DeleteReport::default()
            }
            EntityKind::Comment => {
                take(&mut self.comments, kind, id, |c| c.id)?;
                DeleteReport::default()
            }
        };
        tracing::info!(
            %kind,
            id,
            detached = report.detached,
            removed = report.removed,
            "deleted record"
        );
        Ok(report)
    }

    /// Comments waiting for approval, oldest first.
    pub fn pending_comments(&self) -> Vec<&Comment> {
        let mut pending: Vec<&Comment> = self.comments.iter().filter(|c| !c.active).collect();
        pending.sort_by_key(|c| (c.when, c.id));
        pending
    }

    /// Mark comments active. Unknown ids fail before anything changes.
    ///
    /// Returns how many comments changed state.
    pub fn approve_comments(&mut self, ids: &[Id]) -> Result<usize, StoreError> {
        if let Some(&missing) = ids
            .iter()
            .find(|id| !self.comments.iter().any(|c| c.id == **id))
        {
            return Err(StoreError::NotFound(EntityKind::Comment, missing));
        }
        let mut approved = 0;
        for comment in self.comments.iter_mut().filter(|c| ids.contains(&c.id)) {
            if !comment.active {
                comment.active = true;
                approved += 1;
            }
        }
        tracing::info!(approved, "approved comments");
        Ok(approved)
    }
}
