use serde::{Deserialize, Serialize};

/// A saved system instruction that can be reused across translations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub id: String,
    pub name: String,
    pub content: String,
    pub created_at: i64,
}

impl PromptTemplate {
    pub fn new(name: &str, content: &str, created_at: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            content: content.to_string(),
            created_at,
        }
    }
}

/// Find a template by id, falling back to an exact name match.
pub fn find<'a>(templates: &'a [PromptTemplate], id_or_name: &str) -> Option<&'a PromptTemplate> {
    templates
        .iter()
        .find(|t| t.id == id_or_name)
        .or_else(|| templates.iter().find(|t| t.name == id_or_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_id_or_name() {
        let formal = PromptTemplate::new("formal", "Translate formally.", 1);
        let casual = PromptTemplate::new("casual", "Translate casually.", 2);
        let templates = vec![casual.clone(), formal.clone()];

        assert_eq!(find(&templates, &formal.id), Some(&formal));
        assert_eq!(find(&templates, "casual"), Some(&casual));
        assert_eq!(find(&templates, "missing"), None);
    }
}
