//! Search and filter over an already-rendered card set.
//!
//! Mirrors the page behaviour: cards are rendered once, then narrowing is a
//! visibility toggle over the rendered set, O(cards) per query, with a single
//! "no results" placeholder that exists exactly while nothing is visible.

use crate::models::{Item, ItemType};
use crate::render::create_item_card;
use uuid::Uuid;

/// The filter inputs as they arrive from the search box and the two selects.
/// Empty strings mean "no restriction".
#[derive(Debug, Default, Clone)]
pub struct FilterQuery {
    pub search: String,
    pub category: String,
    pub item_type: String,
}

impl FilterQuery {
    pub fn new(search: Option<String>, category: Option<String>, item_type: Option<String>) -> Self {
        Self {
            search: search.unwrap_or_default().to_lowercase(),
            category: category.unwrap_or_default().to_lowercase(),
            item_type: item_type.unwrap_or_default(),
        }
    }
}

/// One rendered card plus the searchable fields it was rendered from.
#[derive(Debug, Clone)]
pub struct GridCard {
    pub id: Uuid,
    title: String,
    desc: String,
    category: String,
    item_type: String,
    pub visible: bool,
    pub html: String,
}

impl GridCard {
    fn matches(&self, query: &FilterQuery) -> bool {
        let text_ok = query.search.is_empty()
            || self.title.contains(&query.search)
            || self.desc.contains(&query.search);
        let category_ok = query.category.is_empty() || self.category == query.category;
        let type_ok = query.item_type.is_empty() || self.item_type == query.item_type;
        text_ok && category_ok && type_ok
    }
}

/// A rendered grid of cards with an optional "no results" placeholder.
#[derive(Debug, Clone, Default)]
pub struct CardGrid {
    cards: Vec<GridCard>,
    no_results: bool,
    type_filter: Option<ItemType>,
}

impl CardGrid {
    /// Render every listing once. `current_user_id` controls owner-only
    /// affordances on each card.
    pub fn build(items: &[Item], current_user_id: Option<Uuid>, type_filter: Option<ItemType>) -> Self {
        let cards = items
            .iter()
            .map(|item| GridCard {
                id: item.id,
                title: item.title.to_lowercase(),
                desc: item.description.to_lowercase(),
                category: item.category.as_str().to_lowercase(),
                item_type: item.item_type.as_str().to_string(),
                visible: true,
                html: create_item_card(item, current_user_id),
            })
            .collect();
        Self {
            cards,
            no_results: false,
            type_filter,
        }
    }

    /// Toggle card visibility against `query` and maintain the placeholder.
    /// Safe to call repeatedly with any sequence of queries; each call
    /// recomputes visibility from scratch. Returns the visible count.
    pub fn apply(&mut self, query: &FilterQuery) -> usize {
        let mut visible = 0;
        for card in &mut self.cards {
            card.visible = card.matches(query);
            if card.visible {
                visible += 1;
            }
        }
        // Placeholder only makes sense when there were cards to hide.
        self.no_results = visible == 0 && !self.cards.is_empty();
        visible
    }

    pub fn visible_count(&self) -> usize {
        self.cards.iter().filter(|c| c.visible).count()
    }

    pub fn has_no_results_placeholder(&self) -> bool {
        self.no_results
    }

    /// Project the grid to its HTML form: visible cards in original order,
    /// then the placeholder when nothing is visible, or the empty state when
    /// there was nothing to render at all.
    pub fn to_html(&self) -> String {
        if self.cards.is_empty() {
            return crate::render::empty_state(self.type_filter);
        }
        let mut html: String = self
            .cards
            .iter()
            .filter(|c| c.visible)
            .map(|c| c.html.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if self.no_results {
            html.push_str(NO_RESULTS_HTML);
        }
        html
    }
}

const NO_RESULTS_HTML: &str = r#"<div class="empty-state no-results" style="grid-column:1/-1">
  <span class="empty-icon">🔍</span>
  <h3>No results found</h3>
  <p>Try adjusting your search or filters</p>
</div>"#;
