// Pure mapping between selection state and the URL query string

use url::form_urlencoded;

use super::selection::SelectionState;

pub const CATEGORY_PARAM: &str = "cat";
pub const PRODUCT_PARAM: &str = "pid";

/// Encode selection as `cat=..&pid=..`. Absent values are omitted, so an empty
/// selection yields an empty string.
pub fn state_to_query(state: &SelectionState) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());
    if let Some(cat) = state.category() {
        out.append_pair(CATEGORY_PARAM, cat);
    }
    if let Some(pid) = state.selected() {
        out.append_pair(PRODUCT_PARAM, pid);
    }
    out.finish()
}

/// Decode selection from a query string (leading `?` allowed). Unknown
/// parameters are ignored, empty values read as absent, first occurrence wins.
pub fn query_to_state(query: &str) -> SelectionState {
    let mut state = SelectionState::default();
    for (key, value) in form_urlencoded::parse(strip_question_mark(query).as_bytes()) {
        if value.is_empty() {
            continue;
        }
        match &*key {
            CATEGORY_PARAM if state.category.is_none() => {
                state.category = Some(value.into_owned());
            }
            PRODUCT_PARAM if state.selected_product_id.is_none() => {
                state.selected_product_id = Some(value.into_owned());
            }
            _ => {}
        }
    }
    state
}

fn strip_question_mark(query: &str) -> &str {
    query.strip_prefix('?').unwrap_or(query)
}
