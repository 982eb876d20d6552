use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AutocompleteQuery {
    pub term: Option<String>,
}
