//! Agent definition - the read-only configuration one conversation runs on.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use super::personality::Personality;
use crate::domain::conversation::ConversationRecord;
use crate::domain::escalation::{
    EscalationEngine, EscalationPolicyDefinition, PolicyConfigError, PolicyHandler,
};
use crate::domain::fields::FieldDefinition;
use crate::domain::foundation::ValidationError;

pub const DEFAULT_GREETING: &str = "Hello! I'm here to help collect some information.";

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}

/// Errors found while validating an agent definition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentDefinitionError {
    #[error("at least one field must be configured")]
    NoFields,

    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    #[error("invalid field '{name}': {source}")]
    InvalidField {
        name: String,
        #[source]
        source: ValidationError,
    },

    #[error("greeting cannot be empty")]
    EmptyGreeting,

    #[error("personality style cannot be empty")]
    EmptyStyle,

    #[error(transparent)]
    Policy(#[from] PolicyConfigError),
}

/// Personality, greeting, fields and escalation policies of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Tag copied onto records started from this definition.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub personality: Personality,
    #[serde(default = "default_greeting")]
    pub greeting: String,
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub escalation_policies: Vec<EscalationPolicyDefinition>,
}

impl AgentDefinition {
    /// Creates a definition with default personality and greeting.
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        Self {
            id: None,
            personality: Personality::default(),
            greeting: default_greeting(),
            fields,
            escalation_policies: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    pub fn with_policy(mut self, policy: EscalationPolicyDefinition) -> Self {
        self.escalation_policies.push(policy);
        self
    }

    /// Checks everything a turn relies on, so turns never hit a config error.
    pub fn validate(&self) -> Result<(), AgentDefinitionError> {
        if self.fields.is_empty() {
            return Err(AgentDefinitionError::NoFields);
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            field.validate().map_err(|source| AgentDefinitionError::InvalidField {
                name: field.name.clone(),
                source,
            })?;
            if !seen.insert(field.name.as_str()) {
                return Err(AgentDefinitionError::DuplicateField(field.name.clone()));
            }
        }

        if self.greeting.trim().is_empty() {
            return Err(AgentDefinitionError::EmptyGreeting);
        }
        if self.personality.style.trim().is_empty() {
            return Err(AgentDefinitionError::EmptyStyle);
        }

        for (index, def) in self.escalation_policies.iter().enumerate() {
            if let PolicyHandler::Completion(handler) = PolicyHandler::from_definition(index, def)? {
                if let Some(unknown) = handler
                    .required_fields()
                    .iter()
                    .find(|name| !seen.contains(name.as_str()))
                {
                    return Err(PolicyConfigError::UnknownField {
                        index,
                        field: unknown.clone(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Builds the escalation engine for this definition.
    pub fn escalation_engine(&self) -> Result<EscalationEngine, AgentDefinitionError> {
        Ok(EscalationEngine::from_definitions(&self.escalation_policies)?)
    }

    /// Looks up a field by exact name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of the required fields, in configuration order.
    pub fn required_field_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.clone())
            .collect()
    }

    /// The next field without a valid value: required fields first, then
    /// optional ones, each in configuration order.
    pub fn next_field_to_collect(&self, record: &ConversationRecord) -> Option<&FieldDefinition> {
        let pending = |required: bool| {
            self.fields
                .iter()
                .filter(move |f| f.required == required && !record.is_collected(&f.name))
        };
        pending(true).chain(pending(false)).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::escalation::PolicyType;
    use crate::domain::fields::FieldType;
    use serde_json::json;

    fn field(name: &str, field_type: FieldType) -> FieldDefinition {
        FieldDefinition::new(name, field_type).unwrap()
    }

    fn definition() -> AgentDefinition {
        AgentDefinition::new(vec![
            field("nickname", FieldType::Text).optional(),
            field("full_name", FieldType::Text),
            field("email", FieldType::Email),
        ])
    }

    mod validation {
        use super::*;

        #[test]
        fn accepts_well_formed_definition() {
            assert!(definition().validate().is_ok());
        }

        #[test]
        fn requires_fields() {
            assert_eq!(
                AgentDefinition::new(vec![]).validate(),
                Err(AgentDefinitionError::NoFields)
            );
        }

        #[test]
        fn rejects_duplicate_names() {
            let def = AgentDefinition::new(vec![
                field("email", FieldType::Email),
                field("email", FieldType::Text),
            ]);
            assert_eq!(
                def.validate(),
                Err(AgentDefinitionError::DuplicateField("email".into()))
            );
        }

        #[test]
        fn rejects_blank_greeting() {
            assert_eq!(
                definition().with_greeting("  ").validate(),
                Err(AgentDefinitionError::EmptyGreeting)
            );
        }

        #[test]
        fn rejects_malformed_field_pattern() {
            let def = AgentDefinition::new(vec![field("zip", FieldType::Text).with_pattern("[0-9")]);
            assert!(matches!(
                def.validate(),
                Err(AgentDefinitionError::InvalidField { .. })
            ));
        }

        #[test]
        fn rejects_malformed_policy() {
            let def = definition()
                .with_policy(EscalationPolicyDefinition::new(PolicyType::Timeout, "slow"));
            assert!(matches!(def.validate(), Err(AgentDefinitionError::Policy(_))));
        }

        #[test]
        fn rejects_completion_policy_naming_unknown_field() {
            let def = definition().with_policy(
                EscalationPolicyDefinition::new(PolicyType::Completion, "done")
                    .with("required_fields", json!(["full_name", "phone"])),
            );
            assert_eq!(
                def.validate(),
                Err(AgentDefinitionError::Policy(PolicyConfigError::UnknownField {
                    index: 0,
                    field: "phone".into()
                }))
            );
        }
    }

    mod field_order {
        use super::*;

        #[test]
        fn required_fields_come_before_optional() {
            let def = definition();
            let record = ConversationRecord::new();
            assert_eq!(def.next_field_to_collect(&record).unwrap().name, "full_name");
        }

        #[test]
        fn skips_collected_fields() {
            let def = definition();
            let mut record = ConversationRecord::new();
            record.record_attempt("full_name", Some("Jane".into()), true);
            assert_eq!(def.next_field_to_collect(&record).unwrap().name, "email");

            record.record_attempt("email", Some("j@x.io".into()), true);
            assert_eq!(def.next_field_to_collect(&record).unwrap().name, "nickname");

            record.record_attempt("nickname", Some("JJ".into()), true);
            assert!(def.next_field_to_collect(&record).is_none());
        }

        #[test]
        fn invalid_values_are_still_pending() {
            let def = definition();
            let mut record = ConversationRecord::new();
            record.record_attempt("full_name", Some("?".into()), false);
            assert_eq!(def.next_field_to_collect(&record).unwrap().name, "full_name");
        }

        #[test]
        fn required_names_keep_configuration_order() {
            assert_eq!(definition().required_field_names(), vec!["full_name", "email"]);
        }
    }

    #[test]
    fn deserializes_from_yaml_with_defaults() {
        let yaml = r#"
fields:
  - name: full_name
    type: text
  - name: email
    type: email
escalation_policies:
  - type: keyword
    reason: wants human
    config:
      keywords: [human, agent]
"#;
        let def: AgentDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.greeting, DEFAULT_GREETING);
        assert_eq!(def.fields.len(), 2);
        assert!(def.validate().is_ok());
        assert!(def.escalation_engine().unwrap().has_policies());
    }
}
