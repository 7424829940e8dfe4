//! Suggestion vocabularies: field lists per search type, the method and
//! condition lists, and the host-supplied value map.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::query::{FocusContext, Panel};
use crate::Error;

/// The kind of record a search bar queries. Favorites and history are scoped
/// per search type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Alert,
    Event,
    Incident,
    Action,
}

impl SearchType {
    pub const ALL: [SearchType; 4] = [
        SearchType::Alert,
        SearchType::Event,
        SearchType::Incident,
        SearchType::Action,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Alert => "alert",
            SearchType::Event => "event",
            SearchType::Incident => "incident",
            SearchType::Action => "action",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SearchType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown search type '{}'", s))
    }
}

/// An entry of a suggestion menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
}

impl MenuItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Whether the literal `text` names this item, by id or display name.
    pub fn matches(&self, text: &str) -> bool {
        self.id.trim() == text || self.name.trim() == text
    }
}

/// A searchable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldEntry {
    pub id: String,
    pub name: String,
    /// Tag-style fields are addressed as `id.subkey` rather than `name : value`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub special: bool,
}

impl FieldEntry {
    pub fn matches(&self, text: &str) -> bool {
        self.id.trim() == text || self.name.trim() == text
    }

    /// Text inserted when the field is picked, and the separator that
    /// follows it.
    pub fn insertion(&self) -> (String, &'static str) {
        if self.special {
            (format!("{}.", self.id), "")
        } else {
            (format!("{} : ", self.name), " ")
        }
    }
}

/// Borrowed view of the field list the context resolver matches literals
/// against.
#[derive(Debug, Clone, Copy)]
pub struct Vocabulary<'a> {
    pub fields: &'a [FieldEntry],
}

impl<'a> Vocabulary<'a> {
    /// Resolve a field literal to its id.
    pub fn field_id(&self, text: &str) -> Option<&'a str> {
        self.fields
            .iter()
            .find(|f| f.matches(text))
            .map(|f| f.id.as_str())
    }
}

/// Id of the value entry standing for "field is empty".
pub const EMPTY_VALUE_ID: &str = "\"\"";

const EMPTY_VALUE_LABEL: &str = "- empty -";

/// Fields whose value list offers an explicit empty entry.
const NULLABLE_FIELDS: &[&str] = &["assignee"];

const ALERT_FIELDS: &[(&str, bool)] = &[
    ("id", false),
    ("alert_name", false),
    ("status", false),
    ("description", false),
    ("severity", false),
    ("metric", false),
    ("ip", false),
    ("ipv6", false),
    ("bk_host_id", false),
    ("bk_cloud_id", false),
    ("bk_service_instance_id", false),
    ("appointee", false),
    ("assignee", false),
    ("strategy_name", false),
    ("strategy_id", false),
    ("labels", false),
    ("tags", true),
    ("action_id", false),
    ("plugin_id", false),
];

const INCIDENT_FIELDS: &[(&str, bool)] = &[
    ("id", false),
    ("incident_id", false),
    ("incident_name", false),
    ("incident_reason", false),
    ("bk_biz_id", false),
    ("status", false),
    ("level", false),
    ("assignees", false),
    ("handlers", false),
    ("labels", false),
    ("create_time", false),
    ("update_time", false),
    ("begin_time", false),
    ("end_time", false),
    ("snapshot", false),
];

const ACTION_FIELDS: &[(&str, bool)] = &[
    ("id", false),
    ("action_name", false),
    ("action_config_id", false),
    ("strategy_name", false),
    ("alerts", false),
    ("status", false),
    ("bk_biz_name", false),
    ("bk_biz_id", false),
    ("operate_target_string", false),
    ("action_plugin_type", false),
    ("operator", false),
    ("create_time", false),
    ("end_time", false),
];

const EVENT_FIELDS: &[(&str, bool)] = &[
    ("id", false),
    ("event_id", false),
    ("plugin_id", false),
    ("alert_name", false),
    ("status", false),
    ("description", false),
    ("severity", false),
    ("metric", false),
    ("assignee", false),
    ("strategy_name", false),
    ("strategy_id", false),
    ("target_type", false),
    ("target", false),
    ("category", false),
];

fn builtin_fields(search_type: SearchType) -> &'static [(&'static str, bool)] {
    match search_type {
        SearchType::Alert => ALERT_FIELDS,
        SearchType::Event => EVENT_FIELDS,
        SearchType::Incident => INCIDENT_FIELDS,
        SearchType::Action => ACTION_FIELDS,
    }
}

/// Field, method, condition and value vocabularies for every search type.
#[derive(Debug, Clone)]
pub struct Catalog {
    fields: HashMap<SearchType, Vec<FieldEntry>>,
    methods: Vec<MenuItem>,
    conditions: Vec<MenuItem>,
    values: HashMap<String, Vec<MenuItem>>,
    fill_id: bool,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::with_labels(&HashMap::new())
    }
}

impl Catalog {
    /// Catalog whose field display names are the field ids.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog whose field display names come from `labels`
    /// (`field id -> display name`), falling back to the id.
    pub fn with_labels(labels: &HashMap<String, String>) -> Self {
        let fields = SearchType::ALL
            .into_iter()
            .map(|search_type| {
                let entries = builtin_fields(search_type)
                    .iter()
                    .map(|&(id, special)| FieldEntry {
                        id: id.to_string(),
                        name: labels.get(id).cloned().unwrap_or_else(|| id.to_string()),
                        special,
                    })
                    .collect();
                (search_type, entries)
            })
            .collect();

        Self {
            fields,
            methods: vec![MenuItem::new(":", ":")],
            conditions: vec![MenuItem::new("AND", "AND"), MenuItem::new("OR", "OR")],
            values: HashMap::new(),
            fill_id: false,
        }
    }

    /// Read a `{"field_id": "display name"}` JSON file.
    pub fn load_labels(path: &Path) -> Result<HashMap<String, String>, Error> {
        let bytes = std::fs::read(path)?;
        let labels: HashMap<String, String> = serde_json::from_slice(&bytes)?;
        tracing::info!(path = %path.display(), labels = labels.len(), "field labels loaded");
        Ok(labels)
    }

    /// Insert menu ids instead of display names when a method, condition or
    /// value is picked.
    pub fn with_fill_id(mut self, fill_id: bool) -> Self {
        self.fill_id = fill_id;
        self
    }

    pub fn fill_id(&self) -> bool {
        self.fill_id
    }

    pub fn fields(&self, search_type: SearchType) -> &[FieldEntry] {
        self.fields
            .get(&search_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn field(&self, search_type: SearchType, id: &str) -> Option<&FieldEntry> {
        self.fields(search_type).iter().find(|f| f.id == id)
    }

    pub fn methods(&self) -> &[MenuItem] {
        &self.methods
    }

    pub fn conditions(&self) -> &[MenuItem] {
        &self.conditions
    }

    pub fn values(&self, field_id: &str) -> &[MenuItem] {
        self.values
            .get(field_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Replace the value suggestions for a field. Nullable fields get a
    /// leading "empty" entry.
    pub fn set_values(&mut self, field_id: &str, mut items: Vec<MenuItem>) {
        if NULLABLE_FIELDS.contains(&field_id) && !items.iter().any(|i| i.id == EMPTY_VALUE_ID) {
            items.insert(0, MenuItem::new(EMPTY_VALUE_ID, EMPTY_VALUE_LABEL));
        }
        self.values.insert(field_id.to_string(), items);
    }

    pub fn vocabulary(&self, search_type: SearchType) -> Vocabulary<'_> {
        Vocabulary {
            fields: self.fields(search_type),
        }
    }

    /// Menu entries for a condition, method or value context. Field contexts
    /// use the main panel instead and yield nothing here.
    pub fn menu_items(&self, context: &FocusContext) -> &[MenuItem] {
        match context.show {
            Panel::Condition => &self.conditions,
            Panel::Method => &self.methods,
            Panel::Value => context
                .field_id
                .as_deref()
                .map(|id| self.values(id))
                .unwrap_or_default(),
            Panel::Field | Panel::None => &[],
        }
    }

    /// Ids and display names of nullable fields, for empty-value rewriting.
    pub fn nullable_field_names(&self, search_type: SearchType) -> Vec<&str> {
        self.fields(search_type)
            .iter()
            .filter(|f| NULLABLE_FIELDS.contains(&f.id.as_str()))
            .flat_map(|f| [f.id.as_str(), f.name.as_str()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_type_parse() {
        assert_eq!("alert".parse::<SearchType>(), Ok(SearchType::Alert));
        assert_eq!("INCIDENT".parse::<SearchType>(), Ok(SearchType::Incident));
        assert!("metric".parse::<SearchType>().is_err());
    }

    #[test]
    fn test_default_names_are_ids() {
        let catalog = Catalog::new();
        let status = catalog.field(SearchType::Alert, "status").unwrap();
        assert_eq!(status.name, "status");
        assert!(!status.special);
    }

    #[test]
    fn test_labels_override_names() {
        let labels = HashMap::from([("status".to_string(), "Status".to_string())]);
        let catalog = Catalog::with_labels(&labels);
        assert_eq!(catalog.field(SearchType::Alert, "status").unwrap().name, "Status");
        assert_eq!(catalog.field(SearchType::Alert, "severity").unwrap().name, "severity");
        let vocab = catalog.vocabulary(SearchType::Alert);
        assert_eq!(vocab.field_id("Status"), Some("status"));
        assert_eq!(vocab.field_id("status"), Some("status"));
        assert_eq!(vocab.field_id("nope"), None);
    }

    #[test]
    fn test_field_lists_differ_per_search_type() {
        let catalog = Catalog::new();
        assert!(catalog.field(SearchType::Incident, "incident_name").is_some());
        assert!(catalog.field(SearchType::Alert, "incident_name").is_none());
        assert!(catalog.field(SearchType::Action, "action_name").is_some());
        assert!(catalog.field(SearchType::Event, "event_id").is_some());
    }

    #[test]
    fn test_special_field_insertion() {
        let catalog = Catalog::new();
        let tags = catalog.field(SearchType::Alert, "tags").unwrap();
        assert_eq!(tags.insertion(), ("tags.".to_string(), ""));
        let status = catalog.field(SearchType::Alert, "status").unwrap();
        assert_eq!(status.insertion(), ("status : ".to_string(), " "));
    }

    #[test]
    fn test_nullable_field_gets_empty_entry() {
        let mut catalog = Catalog::new();
        catalog.set_values("assignee", vec![MenuItem::new("admin", "admin")]);
        let values = catalog.values("assignee");
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].id, EMPTY_VALUE_ID);

        catalog.set_values("status", vec![MenuItem::new("ABNORMAL", "ABNORMAL")]);
        assert_eq!(catalog.values("status").len(), 1);
    }

    #[test]
    fn test_menu_items_follow_context() {
        let mut catalog = Catalog::new();
        catalog.set_values("status", vec![MenuItem::new("ABNORMAL", "ABNORMAL")]);

        let condition = FocusContext::new(Panel::Condition, 0, "");
        assert_eq!(catalog.menu_items(&condition).len(), 2);

        let method = FocusContext::new(Panel::Method, 0, "");
        assert_eq!(catalog.menu_items(&method)[0].id, ":");

        let value = FocusContext::value(0, "", "status");
        assert_eq!(catalog.menu_items(&value)[0].id, "ABNORMAL");

        let unknown = FocusContext::value(0, "", "");
        assert!(catalog.menu_items(&unknown).is_empty());

        let field = FocusContext::new(Panel::Field, 0, "");
        assert!(catalog.menu_items(&field).is_empty());
    }

    #[test]
    fn test_nullable_field_names_include_labels() {
        let labels = HashMap::from([("assignee".to_string(), "Assignee".to_string())]);
        let catalog = Catalog::with_labels(&labels);
        assert_eq!(
            catalog.nullable_field_names(SearchType::Alert),
            vec!["assignee", "Assignee"]
        );
        assert!(catalog.nullable_field_names(SearchType::Incident).is_empty());
    }
}
