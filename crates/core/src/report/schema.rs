use serde_json::{json, Map, Value};

use crate::domain::certificate_type::is_excluded;
use crate::report::validator::derive_section;

const CONDITIONS: &[&str] = &["excellent", "good", "fair", "poor"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text { min_len: u32 },
    Choice(Vec<String>),
    Integer { min: i64, max: i64 },
    Boolean,
    TextList,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldRule {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub kind: FieldKind,
}

impl FieldRule {
    pub fn new(name: &str, label: &str, required: bool, kind: FieldKind) -> Self {
        Self { name: name.to_string(), label: label.to_string(), required, kind }
    }

    pub fn section(&self) -> String {
        derive_section(&self.name)
    }

    pub fn required_message(&self) -> String {
        format!("{} is required", self.label)
    }

    /// Message for a present value that breaks the rule.
    pub fn invalid_message(&self) -> String {
        match &self.kind {
            FieldKind::Text { min_len } if *min_len > 1 => {
                format!("{} must be at least {min_len} characters", self.label)
            }
            FieldKind::Text { .. } => format!("{} must not be empty", self.label),
            FieldKind::Choice(options) => {
                format!("{} must be one of: {}", self.label, options.join(", "))
            }
            FieldKind::Integer { min, max } => {
                format!("{} must be a whole number between {min} and {max}", self.label)
            }
            FieldKind::Boolean => format!("{} must be yes or no", self.label),
            FieldKind::TextList => format!("{} must be a list of text entries", self.label),
        }
    }

    fn json_schema(&self) -> Value {
        match &self.kind {
            FieldKind::Text { min_len } if *min_len > 0 => {
                json!({ "type": "string", "minLength": min_len, "pattern": "\\S" })
            }
            FieldKind::Text { .. } => json!({ "type": "string" }),
            FieldKind::Choice(options) => json!({ "type": "string", "enum": options }),
            FieldKind::Integer { min, max } => {
                json!({ "type": "integer", "minimum": min, "maximum": max })
            }
            FieldKind::Boolean => json!({ "type": "boolean" }),
            FieldKind::TextList => {
                json!({ "type": "array", "items": { "type": "string", "minLength": 1 } })
            }
        }
    }
}

/// Ordered field rules for an inspection report. Order drives error ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportSchema {
    fields: Vec<FieldRule>,
}

impl ReportSchema {
    pub fn new(fields: Vec<FieldRule>) -> Self {
        Self { fields }
    }

    /// Base schema for physical inspections; certificate types prune it via exclusions.
    pub fn inspection() -> Self {
        use FieldKind::{Boolean, Integer, Text, TextList};

        Self::new(vec![
            FieldRule::new("general_comment", "General comment", true, Text { min_len: 1 }),
            FieldRule::new("notes", "Notes", true, Text { min_len: 1 }),
            FieldRule::new("brand_name", "Brand", true, Text { min_len: 1 }),
            FieldRule::new("brand_logo_condition", "Brand logo condition", true, conditions()),
            FieldRule::new("model_name", "Model", true, Text { min_len: 1 }),
            FieldRule::new("model_reference", "Model reference", false, Text { min_len: 2 }),
            FieldRule::new("serial_number", "Serial number", false, Text { min_len: 2 }),
            FieldRule::new("serial_matches_papers", "Serial matches papers", false, Boolean),
            FieldRule::new("case_material", "Case material", true, Text { min_len: 1 }),
            FieldRule::new("case_condition", "Case condition", true, conditions()),
            FieldRule::new("dial_condition", "Dial condition", true, conditions()),
            FieldRule::new(
                "movement_type",
                "Movement type",
                false,
                choice(&["automatic", "manual", "quartz"]),
            ),
            FieldRule::new("movement_condition", "Movement condition", true, conditions()),
            FieldRule::new("bracelet_condition", "Bracelet condition", false, conditions()),
            FieldRule::new("suspect_points", "Suspect points", false, TextList),
            FieldRule::new("overall_score", "Overall score", true, Integer { min: 0, max: 100 }),
            FieldRule::new(
                "authenticity_verdict",
                "Authenticity verdict",
                true,
                choice(&["authentic", "not_authentic", "inconclusive"]),
            ),
        ])
    }

    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|rule| rule.name == name)
    }

    /// Distinct sections in first-appearance order.
    pub fn sections(&self) -> Vec<String> {
        let mut sections: Vec<String> = Vec::new();
        for rule in &self.fields {
            let section = rule.section();
            if !sections.contains(&section) {
                sections.push(section);
            }
        }
        sections
    }

    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> =
            self.fields.iter().map(|rule| (rule.name.clone(), rule.json_schema())).collect();
        let required: Vec<&str> =
            self.fields.iter().filter(|rule| rule.required).map(|rule| rule.name.as_str()).collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }
}

fn choice(options: &[&str]) -> FieldKind {
    FieldKind::Choice(options.iter().map(|option| option.to_string()).collect())
}

fn conditions() -> FieldKind {
    choice(CONDITIONS)
}

/// Drops every rule whose name is covered by an excluded prefix. `base` is left untouched.
pub fn effective_schema<S: AsRef<str>>(base: &ReportSchema, excluded_prefixes: &[S]) -> ReportSchema {
    ReportSchema::new(
        base.fields
            .iter()
            .filter(|rule| !is_excluded(&rule.name, excluded_prefixes))
            .cloned()
            .collect(),
    )
}
