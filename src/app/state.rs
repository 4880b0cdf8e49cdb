use strum::{Display, EnumIter, EnumString};

use crate::roster::{ChildId, StatusFilter};
use crate::search::{Category, FilterState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum View {
    #[default]
    Dashboard,
    Messages,
    Settings,
}

/// Ephemeral UI selections. Nothing here outlives the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub view: View,
    pub child_search: String,
    pub status_filter: StatusFilter,
    pub message_filter: FilterState,
    pub selected_child: Option<ChildId>,
    pub assistant_open: bool,
}

impl ViewState {
    pub fn set_view(&mut self, view: View) {
        if self.view == View::Messages && view != View::Messages {
            self.selected_child = None;
        }
        self.view = view;
    }

    pub fn set_category(&mut self, category: Category) {
        self.message_filter.category = category;
    }

    pub fn set_message_search<S: Into<String>>(&mut self, search: S) {
        self.message_filter.search = search.into();
    }
}
