use std::collections::BTreeSet;

/// Request identifiers the operator has checked on the visible page.
///
/// The set itself does not know about pages; the console clears it on
/// every page or page-size change and after every bulk action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    selected: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` if absent, removes it otherwise. Returns whether it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.to_string());
            true
        }
    }

    /// `true` selects exactly the visible identifiers, `false` clears.
    pub fn select_all<'a, I>(&mut self, select: bool, visible: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.selected.clear();
        if select {
            self.selected.extend(visible.into_iter().map(str::to_string));
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }
}
