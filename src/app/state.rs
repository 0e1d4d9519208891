use time::Date;

use crate::catalog::LicenseCatalog;
use crate::license::LicenseRecord;
use crate::view::{process, FilterMode, RenderPass, SortDirection, SortKey, ViewState};

const MAX_SEARCH_LEN: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailsOverlay {
    pub license_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayState {
    Details(DetailsOverlay),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub catalog: LicenseCatalog,
    pub view: ViewState,
    pub today: Date,
    pub selected: usize,
    pub search_active: bool,
    pub status_message: Option<String>,
    pub overlay: Option<OverlayState>,
}

impl AppState {
    pub fn new(catalog: LicenseCatalog, view: ViewState, today: Date) -> Self {
        Self {
            catalog,
            view,
            today,
            selected: 0,
            search_active: false,
            status_message: None,
            overlay: None,
        }
    }

    pub fn render_pass(&self) -> RenderPass<'_> {
        RenderPass::compute(self.catalog.records(), &self.view, self.today)
    }

    fn visible(&self) -> Vec<&LicenseRecord> {
        process(self.catalog.records(), &self.view, self.today)
    }

    pub fn len(&self) -> usize {
        self.visible().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn selected_record(&self) -> Option<&LicenseRecord> {
        self.visible().get(self.selected).copied()
    }

    fn selected_id(&self) -> Option<String> {
        self.selected_record().map(|record| record.id.clone())
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.len();
        if len == 0 {
            return;
        }
        let len = len as isize;
        let next = (self.selected as isize + delta).clamp(0, len - 1);
        self.selected = next as usize;
    }

    /// Advances the reference date; returns whether it changed.
    pub fn set_today(&mut self, today: Date) -> bool {
        if self.today == today {
            return false;
        }
        self.update_view(|state| state.today = today);
        true
    }

    pub fn begin_search(&mut self) {
        self.search_active = true;
    }

    pub fn cancel_search(&mut self) {
        self.search_active = false;
        self.update_view(|state| state.view.search.clear());
    }

    pub fn finish_search(&mut self) {
        self.search_active = false;
    }

    pub fn is_search_active(&self) -> bool {
        self.search_active
    }

    pub fn search_term(&self) -> &str {
        &self.view.search
    }

    pub fn push_search_char(&mut self, ch: char) {
        if self.view.search.chars().count() >= MAX_SEARCH_LEN {
            return;
        }
        self.update_view(|state| state.view.search.push(ch));
    }

    pub fn pop_search_char(&mut self) {
        self.update_view(|state| {
            state.view.search.pop();
        });
    }

    pub fn cycle_filter(&mut self) -> FilterMode {
        self.update_view(|state| state.view.filter = state.view.filter.next());
        self.view.filter
    }

    pub fn cycle_sort_key(&mut self) -> SortKey {
        self.update_view(|state| state.view.sort_key = state.view.sort_key.next());
        self.view.sort_key
    }

    pub fn toggle_direction(&mut self) -> SortDirection {
        self.update_view(|state| state.view.direction = state.view.direction.toggle());
        self.view.direction
    }

    pub fn toggle_keys(&mut self) -> bool {
        self.view.show_keys = !self.view.show_keys;
        self.view.show_keys
    }

    pub fn replace_catalog(&mut self, catalog: LicenseCatalog) {
        self.update_view(|state| state.catalog = catalog);
        if let Some(OverlayState::Details(details)) = &self.overlay {
            if self.catalog.get(&details.license_id).is_none() {
                self.overlay = None;
            }
        }
    }

    pub fn open_details(&mut self) -> bool {
        let Some(license_id) = self.selected_id() else {
            return false;
        };
        self.overlay = Some(OverlayState::Details(DetailsOverlay { license_id }));
        true
    }

    pub fn details_record(&self) -> Option<&LicenseRecord> {
        match &self.overlay {
            Some(OverlayState::Details(details)) => self.catalog.get(&details.license_id),
            None => None,
        }
    }

    pub fn overlay(&self) -> Option<&OverlayState> {
        self.overlay.as_ref()
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
    }

    fn update_view<F>(&mut self, change: F)
    where
        F: FnOnce(&mut Self),
    {
        let previous = self.selected_id();
        change(self);
        self.reselect(previous);
    }

    fn reselect(&mut self, previous: Option<String>) {
        let visible = self.visible();
        let position = previous.and_then(|id| visible.iter().position(|record| record.id == id));
        let len = visible.len();
        self.selected = match position {
            Some(idx) => idx,
            None if len == 0 => 0,
            None => self.selected.min(len - 1),
        };
    }
}
