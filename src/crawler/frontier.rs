//! Depth-first crawl frontier
//!
//! This module holds the per-job traversal state:
//! - A stack of internal pages waiting to have their links enumerated
//! - The visited set, keyed by normalized URL
//! - The page limit that bounds the visited set

use std::collections::HashSet;

/// An internal page waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedPage {
    /// Absolute URL to fetch (original scheme and query kept)
    pub url: String,

    /// Normalized URL used for visited checks and edge sources
    pub key: String,
}

impl QueuedPage {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
        }
    }
}

/// What the frontier hands out next
#[derive(Debug, PartialEq, Eq)]
pub enum NextPage {
    /// A page not visited before; it is already marked visited
    Page(QueuedPage),

    /// An unvisited page is pending but the visited set is full
    LimitReached,

    /// Nothing left to visit
    Exhausted,
}

/// Frontier manages traversal order and cycle avoidance
///
/// Pages are popped from a stack, so the subtree of the first link on a page
/// is finished before its siblings are visited. A page is marked visited when
/// it is handed out, before any of its links are seen.
#[derive(Debug)]
pub struct Frontier {
    stack: Vec<QueuedPage>,
    visited: HashSet<String>,
    page_limit: usize,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `page_limit` - Maximum size of the visited set
    pub fn new(page_limit: usize) -> Self {
        Self {
            stack: Vec::new(),
            visited: HashSet::new(),
            page_limit,
        }
    }

    /// Queues a single page
    pub fn push(&mut self, page: QueuedPage) {
        if !self.visited.contains(&page.key) {
            self.stack.push(page);
        }
    }

    /// Queues the followable links of one page, in discovery order
    ///
    /// The first link in `pages` is the next one handed out.
    pub fn push_children(&mut self, pages: Vec<QueuedPage>) {
        for page in pages.into_iter().rev() {
            self.push(page);
        }
    }

    /// Hands out the next unvisited page and marks it visited
    pub fn next_page(&mut self) -> NextPage {
        while let Some(page) = self.stack.pop() {
            if self.visited.contains(&page.key) {
                continue;
            }

            if self.visited.len() >= self.page_limit {
                self.stack.push(page);
                return NextPage::LimitReached;
            }

            self.visited.insert(page.key.clone());
            return NextPage::Page(page);
        }

        NextPage::Exhausted
    }

    /// Checks if a normalized URL has been visited
    pub fn is_visited(&self, key: &str) -> bool {
        self.visited.contains(key)
    }

    /// Returns the number of visited pages
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Returns the number of queued entries (may include duplicates)
    pub fn pending(&self) -> usize {
        self.stack.len()
    }

    /// Drops all queued pages; the visited set is kept
    pub fn clear(&mut self) {
        self.stack.clear();
    }
}
