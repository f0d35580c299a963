use indexmap::IndexMap;

use crate::transport::Transport;
use crate::value::Payload;

/**
Accumulates everything needed to build one HTTP request: the request target
under construction, the bound path template values, the multi-valued query,
matrix, header, cookie and form maps, and the optional entity.

A proxy carries one state as the shared prefix of its chain; every dispatch
clones it and extends the clone, so sibling calls never observe each other.
All multi-valued maps are append only and preserve insertion order.
*/
#[derive(Debug, Clone)]
pub struct InvocationState<Tgt> {
    pub(crate) target: Tgt,
    pub(crate) paths: IndexMap<String, String>,
    pub(crate) queries: IndexMap<String, Vec<String>>,
    pub(crate) matrices: IndexMap<String, Vec<String>>,
    pub(crate) headers: IndexMap<String, Vec<String>>,
    pub(crate) cookies: IndexMap<String, Vec<String>>,
    pub(crate) forms: IndexMap<String, Vec<String>>,
    pub(crate) entity: Option<Payload>,
}

impl<Tgt: Clone> InvocationState<Tgt> {
    pub(crate) fn new(target: Tgt) -> Self {
        InvocationState {
            target,
            paths: IndexMap::new(),
            queries: IndexMap::new(),
            matrices: IndexMap::new(),
            headers: IndexMap::new(),
            cookies: IndexMap::new(),
            forms: IndexMap::new(),
            entity: None,
        }
    }

    /// Appends a path template segment to the request target.
    pub(crate) fn append_path<T>(&mut self, transport: &T, segment: &str)
    where
        T: Transport<Target = Tgt>,
    {
        transport.append_path(&mut self.target, segment);
    }

    /// Binds a path template variable. Rebinding an already bound name is
    /// not fatal: the new value wins, a warning is logged and the displaced
    /// value is returned.
    pub(crate) fn apply_path(&mut self, name: &str, value: String) -> Option<String> {
        let displaced = self.paths.insert(name.to_string(), value);
        if let Some(old) = &displaced {
            let new = &self.paths[name];
            log::warn!(
                "conflicting values for path parameter '{name}': '{old}' replaced by '{new}'"
            );
        }
        displaced
    }

    pub(crate) fn apply_query(&mut self, name: &str, value: String) {
        self.queries.entry(name.to_string()).or_default().push(value);
    }

    pub(crate) fn apply_matrix(&mut self, name: &str, value: String) {
        self.matrices.entry(name.to_string()).or_default().push(value);
    }

    pub(crate) fn apply_header(&mut self, name: &str, value: String) {
        self.headers.entry(name.to_string()).or_default().push(value);
    }

    pub(crate) fn apply_cookie(&mut self, name: &str, value: String) {
        self.cookies.entry(name.to_string()).or_default().push(value);
    }

    pub(crate) fn apply_form(&mut self, name: &str, value: String) {
        self.forms.entry(name.to_string()).or_default().push(value);
    }

    pub(crate) fn apply_entity(&mut self, payload: Payload) {
        self.entity = Some(payload);
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_query_values_accumulate_in_order() {
        let mut state = InvocationState::new(());
        state.apply_query("x", "a".to_string());
        state.apply_query("x", "b".to_string());
        state.apply_query("y", "c".to_string());

        assert_eq!(state.queries["x"], vec!["a", "b"]);
        let keys: Vec<_> = state.queries.keys().collect();
        assert_eq!(keys, vec!["x", "y"]);
    }

    #[test]
    fn test_path_rebinding_displaces_previous_value() {
        let mut state = InvocationState::new(());
        assert_eq!(state.apply_path("id", "1".to_string()), None);
        let displaced = state.apply_path("id", "2".to_string());
        assert_eq!(displaced, Some("1".to_string()));
        assert_eq!(state.paths["id"], "2");
    }

    #[test]
    fn test_clones_are_independent() {
        let mut parent = InvocationState::new(());
        parent.apply_header("X-Tenant", "a".to_string());

        let mut child = parent.clone();
        child.apply_header("X-Tenant", "b".to_string());
        child.apply_entity(Payload::Text("body".to_string()));

        assert_eq!(parent.headers["X-Tenant"], vec!["a"]);
        assert_eq!(child.headers["X-Tenant"], vec!["a", "b"]);
        assert!(parent.entity.is_none());
        assert!(child.entity.is_some());
    }
}
