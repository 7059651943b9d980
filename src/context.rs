//! Labeled context fragments injected into the system instructions.

/// Ordered label -> content map for context fragments.
///
/// Entries render in registration order; re-adding an existing label
/// replaces its content without changing its position.
#[derive(Debug, Clone, Default)]
pub struct ContextMap {
    entries: Vec<(String, String)>,
}

impl ContextMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<L: Into<String>, C: Into<String>>(&mut self, label: L, content: C) {
        let label = label.into();
        let content = content.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = content,
            None => self.entries.push((label, content)),
        }
    }

    pub fn remove(&mut self, label: &str) {
        self.entries.retain(|(l, _)| l != label);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), c.as_str()))
    }
}

/// Merge the base system prompt with all registered context fragments.
///
/// Pure and deterministic: identical inputs always produce byte-identical
/// output. An empty context map returns the base prompt unchanged.
pub fn build_system_prompt(system_prompt: &str, context: &ContextMap) -> String {
    if context.is_empty() {
        return system_prompt.to_string();
    }

    let mut final_prompt = String::from(system_prompt);
    final_prompt.push_str("\n\n---\nContext Data:\n");
    for (label, content) in context.iter() {
        final_prompt.push_str(&format!("\n[{}]:\n{}\n", label, content.trim()));
    }
    final_prompt.push_str("\n---\n");
    final_prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context_returns_prompt_unchanged() {
        let context = ContextMap::new();
        assert_eq!(
            build_system_prompt("You are helpful.", &context),
            "You are helpful."
        );
    }

    #[test]
    fn test_entries_render_in_registration_order() {
        let mut context = ContextMap::new();
        context.insert("A", "x");
        context.insert("B", "y");

        let prompt = build_system_prompt("base", &context);
        let a = prompt.find("[A]:").unwrap();
        let b = prompt.find("[B]:").unwrap();
        assert!(a < b);
        assert!(prompt.starts_with("base\n\n---\nContext Data:\n"));
        assert!(prompt.ends_with("\n---\n"));
    }

    #[test]
    fn test_build_is_stable() {
        let mut context = ContextMap::new();
        context.insert("UserInfo", "  name: Ada  ");

        let first = build_system_prompt("base", &context);
        let second = build_system_prompt("base", &context);
        assert_eq!(first, second);
        assert!(first.contains("[UserInfo]:\nname: Ada\n"));
    }

    #[test]
    fn test_reinsert_keeps_position_and_replaces_content() {
        let mut context = ContextMap::new();
        context.insert("A", "one");
        context.insert("B", "two");
        context.insert("A", "three");

        let entries: Vec<_> = context.iter().collect();
        assert_eq!(entries, vec![("A", "three"), ("B", "two")]);
    }

    #[test]
    fn test_remove() {
        let mut context = ContextMap::new();
        context.insert("A", "one");
        context.remove("A");
        assert!(context.is_empty());
    }
}
