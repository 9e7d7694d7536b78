//! Single-select tag filter used by the public post listing.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagFilter {
    selected: Option<Uuid>,
}

impl TagFilter {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn tag(id: Uuid) -> Self {
        Self { selected: Some(id) }
    }

    pub fn selected(&self) -> Option<Uuid> {
        self.selected
    }

    /// Select `tag`, or clear the filter when `tag` is already selected.
    #[must_use]
    pub fn toggle(self, tag: Uuid) -> Self {
        if self.selected == Some(tag) {
            Self::none()
        } else {
            Self::tag(tag)
        }
    }
}
