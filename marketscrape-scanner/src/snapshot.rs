//! An offline stand-in for the live document.
//!
//! A [`SnapshotSite`] holds saved HTML documents keyed by URL and behaves
//! like a minimal browser: anchor clicks and `goto` push history, `back`
//! pops it, and registered transitions swap the document in place when an
//! element with matching text is clicked (how "see more" toggles expand a
//! description without navigating).

use crate::error::{Result, ScanError};
use crate::page::{Page, resolve_href};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Node, Selector};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const BLANK_PAGE: &str = "<html><head></head><body></body></html>";

pub const MANIFEST_FILE: &str = "site.json";

/// Handle to an element of one snapshot document.
///
/// The handle stores the element-child path from the root element and the
/// document generation it was taken from; any navigation invalidates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotNode {
    generation: u64,
    path: Vec<usize>,
}

#[derive(Debug, Clone)]
struct Transition {
    from: String,
    trigger: String,
    to: String,
}

#[derive(Debug)]
struct SiteState {
    current_url: String,
    document_key: String,
    history: Vec<String>,
    generation: u64,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    start: String,
    pages: HashMap<String, String>,
    #[serde(default)]
    transitions: Vec<ManifestTransition>,
}

#[derive(Debug, Deserialize)]
struct ManifestTransition {
    from: String,
    trigger: String,
    to: String,
}

pub struct SnapshotSite {
    pages: HashMap<String, String>,
    transitions: Vec<Transition>,
    state: Mutex<SiteState>,
}

impl SnapshotSite {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            transitions: Vec::new(),
            state: Mutex::new(SiteState {
                current_url: "about:blank".to_string(),
                document_key: "about:blank".to_string(),
                history: Vec::new(),
                generation: 0,
            }),
        }
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// Clicking an element whose trimmed text equals `trigger` (ignoring
    /// case) while document `from` is shown replaces it with document `to`.
    pub fn with_transition(
        mut self,
        from: impl Into<String>,
        trigger: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.transitions.push(Transition {
            from: from.into(),
            trigger: trigger.into().trim().to_lowercase(),
            to: to.into(),
        });
        self
    }

    /// Show `url` without creating a history entry
    pub fn starting_at(self, url: impl Into<String>) -> Self {
        {
            let url = url.into();
            let mut state = self.lock_state();
            state.document_key = url.clone();
            state.current_url = url;
            state.history.clear();
            state.generation += 1;
        }
        self
    }

    /// Load a site from a directory containing a `site.json` manifest:
    ///
    /// ```json
    /// {
    ///   "start": "https://market.test/feed",
    ///   "pages": { "https://market.test/feed": "feed.html" },
    ///   "transitions": [{ "from": "...", "trigger": "See more", "to": "..." }]
    /// }
    /// ```
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let content = fs::read_to_string(&manifest_path).map_err(|e| {
            ScanError::ParseError(format!("Failed to read {}: {}", manifest_path.display(), e))
        })?;
        let manifest: Manifest = serde_json::from_str(&content)?;

        let mut site = SnapshotSite::new();
        for (url, file) in manifest.pages {
            let html = fs::read_to_string(dir.join(&file))?;
            site = site.with_page(url, html);
        }
        for transition in manifest.transitions {
            site = site.with_transition(transition.from, transition.trigger, transition.to);
        }

        debug!("Loaded snapshot site with {} pages", site.pages.len());
        Ok(site.starting_at(manifest.start))
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn lock_state(&self) -> MutexGuard<'_, SiteState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn html_for(&self, key: &str) -> &str {
        self.pages.get(key).map(String::as_str).unwrap_or(BLANK_PAGE)
    }

    /// Parse the shown document and run `f` against it
    fn with_document<R>(&self, f: impl FnOnce(&Html, &SiteState) -> Result<R>) -> Result<R> {
        let state = self.lock_state();
        let document = Html::parse_document(self.html_for(&state.document_key));
        f(&document, &state)
    }

    fn navigate(state: &mut SiteState, url: String) {
        let previous = std::mem::replace(&mut state.current_url, url.clone());
        state.history.push(previous);
        state.document_key = url;
        state.generation += 1;
    }
}

impl Default for SnapshotSite {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScanError::InvalidSelector(format!("{}: {:?}", css, e)))
}

fn path_of(element: ElementRef<'_>) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = element;
    while let Some(parent) = current.parent().and_then(ElementRef::wrap) {
        let index = parent
            .children()
            .filter_map(ElementRef::wrap)
            .position(|child| child.id() == current.id())
            .unwrap_or(0);
        path.push(index);
        current = parent;
    }
    path.reverse();
    path
}

fn node_for(element: ElementRef<'_>, generation: u64) -> SnapshotNode {
    SnapshotNode {
        generation,
        path: path_of(element),
    }
}

fn resolve<'a>(document: &'a Html, state: &SiteState, node: &SnapshotNode) -> Result<ElementRef<'a>> {
    if node.generation != state.generation {
        return Err(ScanError::StaleElement(format!(
            "element from an earlier document of {}",
            state.current_url
        )));
    }

    let mut current = document.root_element();
    for &index in &node.path {
        current = current
            .children()
            .filter_map(ElementRef::wrap)
            .nth(index)
            .ok_or_else(|| ScanError::StaleElement(format!("no element at {:?}", node.path)))?;
    }
    Ok(current)
}

#[async_trait]
impl Page for SnapshotSite {
    type Element = SnapshotNode;

    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.lock_state();
        Self::navigate(&mut state, url.to_string());
        Ok(())
    }

    async fn query_all(&self, css: &str) -> Result<Vec<SnapshotNode>> {
        let selector = parse_selector(css)?;
        self.with_document(|document, state| {
            Ok(document
                .select(&selector)
                .map(|element| node_for(element, state.generation))
                .collect())
        })
    }

    async fn query_within(&self, scope: &SnapshotNode, css: &str) -> Result<Vec<SnapshotNode>> {
        let selector = parse_selector(css)?;
        self.with_document(|document, state| {
            let scope = resolve(document, state, scope)?;
            Ok(scope
                .select(&selector)
                .filter(|element| element.id() != scope.id())
                .map(|element| node_for(element, state.generation))
                .collect())
        })
    }

    async fn children(&self, element: &SnapshotNode) -> Result<Vec<SnapshotNode>> {
        self.with_document(|document, state| {
            let element = resolve(document, state, element)?;
            Ok(element
                .children()
                .filter_map(ElementRef::wrap)
                .map(|child| node_for(child, state.generation))
                .collect())
        })
    }

    async fn child_texts(&self, element: &SnapshotNode) -> Result<Vec<String>> {
        self.with_document(|document, state| {
            let element = resolve(document, state, element)?;
            Ok(element
                .children()
                .filter_map(|child| match child.value() {
                    Node::Text(text) => Some(text.trim().to_string()),
                    Node::Element(_) => ElementRef::wrap(child)
                        .map(|el| el.text().collect::<String>().trim().to_string()),
                    _ => None,
                })
                .filter(|text| !text.is_empty())
                .collect())
        })
    }

    async fn text(&self, element: &SnapshotNode) -> Result<String> {
        self.with_document(|document, state| {
            let element = resolve(document, state, element)?;
            Ok(element.text().collect())
        })
    }

    async fn attr(&self, element: &SnapshotNode, name: &str) -> Result<Option<String>> {
        self.with_document(|document, state| {
            let element = resolve(document, state, element)?;
            Ok(element.value().attr(name).map(str::to_string))
        })
    }

    async fn click(&self, element: &SnapshotNode) -> Result<()> {
        let mut state = self.lock_state();
        let document = Html::parse_document(self.html_for(&state.document_key));
        let target = resolve(&document, &state, element)?;

        let href = std::iter::successors(Some(target), |el| el.parent().and_then(ElementRef::wrap))
            .find(|el| el.value().name() == "a" && el.value().attr("href").is_some())
            .and_then(|anchor| anchor.value().attr("href"))
            .and_then(|href| resolve_href(&state.current_url, href));

        if let Some(url) = href {
            debug!("Snapshot navigation to {}", url);
            Self::navigate(&mut state, url);
            return Ok(());
        }

        let label = target.text().collect::<String>().trim().to_lowercase();
        let transition = self
            .transitions
            .iter()
            .find(|t| t.from == state.document_key && t.trigger == label)
            .cloned();

        match transition {
            Some(transition) => {
                debug!("Snapshot transition {} -> {}", transition.from, transition.to);
                state.document_key = transition.to;
                state.generation += 1;
            }
            None => debug!("Click on '{}' had no effect", label),
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.lock_state().current_url.clone())
    }

    async fn back(&self) -> Result<()> {
        let mut state = self.lock_state();
        match state.history.pop() {
            Some(previous) => {
                state.document_key = previous.clone();
                state.current_url = previous;
                state.generation += 1;
            }
            None => debug!("Back requested with empty history"),
        }
        Ok(())
    }
}
