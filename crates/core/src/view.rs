//! View state reducer.
//!
//! The storefront shows one of four views. All navigation goes through
//! [`ViewState::apply`]; renderers only read the state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::storage::{Storage, StorageError, keys};

/// The visible view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Browse,
    Product,
    Details,
    Cart,
}

/// A navigation or selection request from the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum Action {
    Browse,
    SelectProduct { handle: String },
    ShowDetails,
    SelectSize { size: String },
    OpenCart,
    CloseCart,
    ToggleSection { name: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub view: View,
    pub selected_product: Option<String>,
    pub selected_size: Option<String>,
    /// Expanded accordion sections on the details view.
    pub open_sections: BTreeSet<String>,
    /// View to return to when the cart closes.
    pub return_to: Option<View>,
}

impl ViewState {
    /// Apply `action`, returning the next state.
    #[must_use]
    pub fn apply(mut self, action: Action) -> Self {
        match action {
            Action::Browse => {
                self = Self::default();
            }
            Action::SelectProduct { handle } => {
                if self.selected_product.as_deref() != Some(handle.as_str()) {
                    self.open_sections.clear();
                }
                self.view = View::Product;
                self.selected_product = Some(handle);
                self.selected_size = None;
                self.return_to = None;
            }
            Action::ShowDetails => {
                if self.selected_product.is_some() {
                    self.view = View::Details;
                }
            }
            Action::SelectSize { size } => {
                if self.selected_product.is_some() {
                    self.selected_size = Some(size);
                }
            }
            Action::OpenCart => {
                if self.view != View::Cart {
                    self.return_to = Some(self.view);
                    self.view = View::Cart;
                }
            }
            Action::CloseCart => {
                if self.view == View::Cart {
                    self.view = self.return_to.take().unwrap_or_default();
                }
            }
            Action::ToggleSection { name } => {
                if !self.open_sections.remove(&name) {
                    self.open_sections.insert(name);
                }
            }
        }
        self
    }

    /// Load the persisted view state; anything unreadable is the default.
    #[must_use]
    pub fn load<S: Storage>(session: &S) -> Self {
        session
            .get(keys::VIEW_STATE)
            .ok()
            .flatten()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Persist the view state.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn save<S: Storage>(&self, session: &mut S) -> Result<(), StorageError> {
        session.set(keys::VIEW_STATE, serde_json::to_string(self)?)
    }
}
