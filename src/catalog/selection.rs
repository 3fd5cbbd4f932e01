use crate::models::Product;

/// Category and product selection, mirrored into the `cat` / `pid` query
/// parameters.
///
/// Invariant: changing the category always clears the selected product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub category: Option<String>,
    pub selected_product_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionChange {
    /// A new product became selected; the preview panel should start.
    Selected {
        product_id: String,
        image_url: String,
        product_name: String,
    },
    Deselected {
        product_id: String,
    },
}

impl SelectionState {
    pub fn new(category: Option<String>, selected_product_id: Option<String>) -> Self {
        Self {
            category,
            selected_product_id,
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected_product_id.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.selected_product_id.is_none()
    }

    /// Switch category. The selection is cleared first, even when the same
    /// category is picked again. Returns whether the category value changed.
    pub fn set_category(&mut self, category: Option<String>) -> bool {
        self.selected_product_id = None;
        if self.category == category {
            return false;
        }
        self.category = category;
        true
    }

    /// Toggle semantics: clicking the selected product deselects it, clicking
    /// any other product replaces the selection.
    pub fn toggle(&mut self, product: &Product) -> SelectionChange {
        if self.selected() == Some(product.product_id.as_str()) {
            self.selected_product_id = None;
            return SelectionChange::Deselected {
                product_id: product.product_id.clone(),
            };
        }
        self.selected_product_id = Some(product.product_id.clone());
        SelectionChange::Selected {
            product_id: product.product_id.clone(),
            image_url: product.image_url.clone(),
            product_name: product.product_name.clone(),
        }
    }

    pub fn clear(&mut self) {
        self.category = None;
        self.selected_product_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::filter::tests::product;

    #[test]
    fn selecting_twice_returns_to_no_selection() {
        let x = product("X", "Denim");
        let mut state = SelectionState::new(Some("Denim".into()), None);

        assert!(matches!(state.toggle(&x), SelectionChange::Selected { .. }));
        assert_eq!(state.selected(), Some("X"));
        assert_eq!(
            state.toggle(&x),
            SelectionChange::Deselected {
                product_id: "X".into()
            }
        );
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn selecting_another_product_replaces_selection() {
        let x = product("X", "Denim");
        let y = product("Y", "Denim");
        let mut state = SelectionState::default();
        state.toggle(&x);
        match state.toggle(&y) {
            SelectionChange::Selected {
                product_id,
                image_url,
                product_name,
            } => {
                assert_eq!(product_id, "Y");
                assert_eq!(image_url, y.image_url);
                assert_eq!(product_name, y.product_name);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(state.selected(), Some("Y"));
    }

    #[test]
    fn category_change_always_clears_selection() {
        let mut state = SelectionState::new(Some("블라우스".into()), Some("AKA3CA001".into()));
        assert!(state.set_category(Some("코트".into())));
        assert_eq!(state, SelectionState::new(Some("코트".into()), None));

        state.selected_product_id = Some("AKA3CA002".into());
        assert!(!state.set_category(Some("코트".into())));
        assert_eq!(state.selected(), None);
    }
}
