use chromiumoxide::page::Page;

/// The browser's open tabs, in the order they were first seen. Index 0 stays
/// the primary tab for as long as it is open.
pub struct TabPool {
    pages: Vec<Page>,
    active_index: usize,
}

impl TabPool {
    pub fn new(initial_page: Page) -> Self {
        Self {
            pages: vec![initial_page],
            active_index: 0,
        }
    }

    pub fn active_page(&self) -> &Page {
        &self.pages[self.active_index]
    }

    pub fn active_target_id(&self) -> String {
        target_id(self.active_page())
    }

    /// Merge a fresh listing into the known tabs, keeping the active tab
    /// selected when it is still open. The browser lists targets in no
    /// particular order, so known tabs keep their positions and new ones are
    /// appended. An empty listing is ignored.
    pub fn sync(&mut self, pages: Vec<Page>) {
        if pages.is_empty() {
            return;
        }
        let active = self.active_target_id();
        let known = std::mem::take(&mut self.pages);
        self.pages = merge_in_order(known, pages, target_id);
        self.active_index = self
            .pages
            .iter()
            .position(|p| target_id(p) == active)
            .unwrap_or(0);
    }

    /// Add a tab opened by the harness and make it the active one.
    pub fn push_active(&mut self, page: Page) {
        let id = target_id(&page);
        self.pages.retain(|p| target_id(p) != id);
        self.pages.push(page);
        self.active_index = self.pages.len() - 1;
    }

    pub fn select_by_target_id(&mut self, target_id: &str) -> Option<&Page> {
        for (i, page) in self.pages.iter().enumerate() {
            if page.target_id().as_ref() == target_id {
                self.active_index = i;
                return Some(page);
            }
        }
        None
    }

    pub fn target_ids(&self) -> Vec<String> {
        self.pages.iter().map(target_id).collect()
    }
}

fn target_id(page: &Page) -> String {
    page.target_id().as_ref().to_string()
}

/// Items of `known` still present in `listed` keep their order, followed by
/// the items of `listed` not seen before, in listing order.
fn merge_in_order<T>(known: Vec<T>, listed: Vec<T>, id: impl Fn(&T) -> String) -> Vec<T> {
    let listed_ids: Vec<String> = listed.iter().map(&id).collect();
    let mut merged: Vec<T> = known
        .into_iter()
        .filter(|item| listed_ids.contains(&id(item)))
        .collect();
    let merged_ids: Vec<String> = merged.iter().map(&id).collect();
    merged.extend(
        listed
            .into_iter()
            .filter(|item| !merged_ids.contains(&id(item))),
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn merge(known: &[&str], listed: &[&str]) -> Vec<String> {
        merge_in_order(ids(known), ids(listed), String::clone)
    }

    #[test]
    fn test_primary_tab_stays_first_whatever_the_listing_order() {
        assert_eq!(merge(&["main"], &["popup", "main"]), ids(&["main", "popup"]));
        assert_eq!(
            merge(&["main", "popup"], &["third", "popup", "main"]),
            ids(&["main", "popup", "third"])
        );
    }

    #[test]
    fn test_closed_tabs_are_dropped() {
        assert_eq!(merge(&["main", "popup", "third"], &["third", "main"]), ids(&["main", "third"]));
    }

    #[test]
    fn test_unchanged_listing_is_stable() {
        assert_eq!(merge(&["a", "b"], &["b", "a"]), ids(&["a", "b"]));
        assert_eq!(merge(&["a", "b"], &["a", "b"]), ids(&["a", "b"]));
    }
}
