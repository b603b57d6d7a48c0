//! The search, sort and paging state of a list and the derived views computed from it.
//!
//! The views are pure functions of the entities and the list state, so they
//! are recomputed on every read instead of being cached.

use std::{cmp::Ordering, fmt::Display, num::NonZeroUsize, str::FromStr};

use crate::{
    entity::Entity,
    pagination::{paginate, total_pages},
};

/// The order to sort a column in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Sort in order of increasing value.
    #[default]
    Asc,
    /// Sort in order of decreasing value.
    Desc,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction \"{other}\", expected asc or desc")),
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// The column a list is sorted by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// The wire name of the field, e.g. "officeName".
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// The UI state of a list: what the user searched for, how it is sorted and
/// which page is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    /// The text to search for. Empty shows everything.
    pub search_query: String,
    /// The page being shown, starting from 1.
    pub current_page: usize,
    /// The number of items per page.
    pub page_size: NonZeroUsize,
    /// The column to sort by. `None` keeps the stored order.
    pub sort: Option<Sort>,
}

impl ListState {
    /// Create the state for an unfiltered, unsorted list on page 1.
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self {
            search_query: String::new(),
            current_page: 1,
            page_size,
            sort: None,
        }
    }

    /// The entities that match the search query, in sorted order.
    pub fn filtered<'a, E: Entity>(&self, entities: &'a [E]) -> Vec<&'a E> {
        let mut matches = filter(entities, &self.search_query);
        sort(&mut matches, self.sort.as_ref());

        matches
    }

    /// The entities on the current page of [ListState::filtered].
    pub fn paginated<'a, E: Entity>(&self, entities: &'a [E]) -> Vec<&'a E> {
        let filtered = self.filtered(entities);

        paginate(&filtered, self.current_page, self.page_size).to_vec()
    }

    /// The number of pages in [ListState::filtered], or 0 if nothing matches.
    pub fn total_pages<E: Entity>(&self, entities: &[E]) -> usize {
        total_pages(filter(entities, &self.search_query).len(), self.page_size)
    }

    /// Move the current page into `1..=max(total_pages, 1)`.
    pub(crate) fn clamp_page(&mut self, total_pages: usize) {
        self.current_page = self.current_page.clamp(1, total_pages.max(1));
    }
}

/// The entities with a text field that contains `query`, ignoring case and
/// surrounding whitespace. An empty query matches everything.
pub fn filter<'a, E: Entity>(entities: &'a [E], query: &str) -> Vec<&'a E> {
    let needle = query.trim().to_lowercase();

    entities
        .iter()
        .filter(|entity| entity.matches(&needle))
        .collect()
}

/// Sort `items` by `sort`, keeping the relative order of equal items.
///
/// Items without a value for the field come first in ascending order and
/// last in descending order. Unknown fields leave the order unchanged.
pub fn sort<E: Entity>(items: &mut [&E], sort: Option<&Sort>) {
    let Some(sort) = sort else {
        return;
    };

    items.sort_by(|left, right| {
        let ordering = match (left.field_value(&sort.field), right.field_value(&sort.field)) {
            (Some(left), Some(right)) => left.compare(&right),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };

        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::{ListState, Sort, SortDirection, filter, sort};
    use crate::{models::Pincode, test_utils::pincode};

    fn offices() -> Vec<Pincode> {
        vec![
            pincode(1, "Office1", "123456"),
            pincode(2, "Office2", "654321"),
            pincode(3, "Andheri", "400053"),
        ]
    }

    fn by(field: &str, direction: SortDirection) -> Sort {
        Sort {
            field: field.to_owned(),
            direction,
        }
    }

    #[test]
    fn empty_query_matches_everything() {
        let entities = offices();

        let got: Vec<Pincode> = filter(&entities, "").into_iter().cloned().collect();

        assert_eq!(got, entities);
    }

    #[test]
    fn query_ignores_case_and_whitespace() {
        let entities = offices();

        let got = filter(&entities, "  ANDHERI ");

        assert_eq!(got, vec![&entities[2]]);
    }

    #[test]
    fn query_matches_any_text_field() {
        let entities = offices();

        let got = filter(&entities, "6543");

        assert_eq!(got, vec![&entities[1]]);
    }

    #[test]
    fn no_sort_keeps_stored_order() {
        let entities = offices();
        let mut items: Vec<&Pincode> = entities.iter().collect();

        sort(&mut items, None);

        assert_eq!(items, entities.iter().collect::<Vec<_>>());
    }

    #[test]
    fn sorts_descending() {
        let entities = vec![pincode(1, "Office1", "123456"), pincode(2, "Office2", "654321")];
        let mut items: Vec<&Pincode> = entities.iter().collect();

        sort(&mut items, Some(&by("pincode", SortDirection::Desc)));

        assert_eq!(items, vec![&entities[1], &entities[0]]);
    }

    #[test]
    fn sort_is_stable() {
        let mut first = pincode(1, "Office1", "123456");
        let mut second = pincode(2, "Office2", "654321");
        first.state_name = "Delhi".to_owned();
        second.state_name = "Delhi".to_owned();
        let entities = vec![first, second];
        let mut items: Vec<&Pincode> = entities.iter().collect();

        sort(&mut items, Some(&by("stateName", SortDirection::Desc)));

        assert_eq!(items, vec![&entities[0], &entities[1]]);
    }

    #[test]
    fn unknown_field_keeps_order() {
        let entities = offices();
        let mut items: Vec<&Pincode> = entities.iter().collect();

        sort(&mut items, Some(&by("doesNotExist", SortDirection::Asc)));

        assert_eq!(items, entities.iter().collect::<Vec<_>>());
    }

    #[test]
    fn pages_reconstruct_filtered_view() {
        let entities: Vec<Pincode> = (1..=11)
            .map(|i| pincode(i, &format!("Office{i}"), "110001"))
            .collect();
        let mut state = ListState::new(NonZeroUsize::new(3).unwrap());
        state.sort = Some(by("officeName", SortDirection::Desc));
        let want: Vec<&Pincode> = state.filtered(&entities);

        let mut joined = Vec::new();
        for page in 1..=state.total_pages(&entities) {
            state.current_page = page;
            let items = state.paginated(&entities);
            assert!(items.len() <= 3);
            joined.extend(items);
        }

        assert_eq!(state.total_pages(&entities), 4);
        assert_eq!(joined, want);
    }

    #[test]
    fn clamp_page_stays_in_range() {
        let mut state = ListState::new(NonZeroUsize::new(3).unwrap());

        state.current_page = 9;
        state.clamp_page(4);
        assert_eq!(state.current_page, 4);

        state.current_page = 0;
        state.clamp_page(4);
        assert_eq!(state.current_page, 1);

        state.current_page = 3;
        state.clamp_page(0);
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn sort_direction_parses() {
        assert_eq!("DESC".parse::<SortDirection>(), Ok(SortDirection::Desc));
        assert!("up".parse::<SortDirection>().is_err());
    }
}
