//! Declared output schemas and reply checking
//!
//! Output schemas are generated from the reply record types with
//! [`schemars`], with subschemas inlined so the model receives one
//! self-contained JSON Schema per analysis. Model replies are checked against
//! the same schema with `jsonschema` before being deserialized.

use jsonschema::Validator;
use schemars::generate::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::analysis::{
    Analysis, AnalysisError, AnalysisKind, FeatureDetection, GeologicalReasoning, ShadowSlope,
    TemporalAnalysis,
};

/// JSON Schema for `T`, inlined and without the `$schema` marker.
pub fn output_schema<T: JsonSchema>() -> Value {
    let schema = SchemaSettings::draft2020_12()
        .with(|settings| settings.inline_subschemas = true)
        .into_generator()
        .into_root_schema_for::<T>();

    let mut value = schema.to_value();
    if let Some(object) = value.as_object_mut() {
        object.remove("$schema");
    }
    value
}

/// Output schemas for every analysis kind, built and compiled once.
pub struct SchemaRegistry {
    schemas: [Value; 4],
    /// Compiled form of `schemas`, or the compile error text
    validators: [Result<Validator, String>; 4],
}

impl SchemaRegistry {
    pub fn new() -> Self {
        let mut schemas: [Value; 4] = Default::default();
        schemas[FeatureDetection::KIND.index()] =
            output_schema::<<FeatureDetection as Analysis>::Output>();
        schemas[ShadowSlope::KIND.index()] = output_schema::<<ShadowSlope as Analysis>::Output>();
        schemas[GeologicalReasoning::KIND.index()] =
            output_schema::<<GeologicalReasoning as Analysis>::Output>();
        schemas[TemporalAnalysis::KIND.index()] =
            output_schema::<<TemporalAnalysis as Analysis>::Output>();

        let validators = std::array::from_fn(|i| {
            jsonschema::validator_for(&schemas[i]).map_err(|e| {
                let kind = AnalysisKind::ALL[i];
                tracing::error!(kind = %kind, error = %e, "Output schema does not compile");
                format!("output schema for {kind} does not compile: {e}")
            })
        });

        Self {
            schemas,
            validators,
        }
    }

    /// Declared output schema for `kind`.
    pub fn get(&self, kind: AnalysisKind) -> &Value {
        &self.schemas[kind.index()]
    }

    /// Check a model reply against the declared schema for `kind`.
    ///
    /// Returns every schema violation, each prefixed with its JSON pointer.
    pub fn check(&self, kind: AnalysisKind, reply: &Value) -> Result<(), Vec<String>> {
        let validator = self.validators[kind.index()]
            .as_ref()
            .map_err(|e| vec![e.clone()])?;

        let errors: Vec<String> = validator
            .iter_errors(reply)
            .map(|error| {
                let path = error.instance_path.to_string();
                if path.is_empty() {
                    error.to_string()
                } else {
                    format!("{path}: {error}")
                }
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// [`check`](Self::check) as an upstream failure of the analysis.
    pub fn check_reply(&self, kind: AnalysisKind, reply: &Value) -> Result<(), AnalysisError> {
        self.check(kind, reply).map_err(|errors| {
            tracing::warn!(
                kind = %kind,
                errors = ?errors,
                "Model reply does not match the declared output schema"
            );
            AnalysisError::Upstream(format!(
                "model reply does not match the {kind} output schema: {}",
                errors.join("; ")
            ))
        })
    }

    /// Read an already checked reply into the typed output record.
    pub fn decode_reply<T: DeserializeOwned>(
        &self,
        kind: AnalysisKind,
        reply: Value,
    ) -> Result<T, AnalysisError> {
        serde_json::from_value(reply).map_err(|e| {
            AnalysisError::Upstream(format!(
                "model reply could not be read as {kind} output: {e}"
            ))
        })
    }

    /// Check a model reply and deserialize it into the typed output record.
    pub fn parse_reply<T: DeserializeOwned>(
        &self,
        kind: AnalysisKind,
        reply: Value,
    ) -> Result<T, AnalysisError> {
        self.check_reply(kind, &reply)?;
        self.decode_reply(kind, reply)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schemas", &self.schemas)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::analysis::{DetectFeaturesOutput, Significance, TemporalAnalysisOutput};
    use serde_json::json;

    #[test]
    fn test_schemas_are_self_contained_objects() {
        let registry = SchemaRegistry::new();
        for kind in AnalysisKind::ALL {
            let schema = registry.get(kind);
            assert_eq!(schema["type"], "object", "{kind}");
            assert!(schema.get("$schema").is_none());
            assert!(schema.get("$defs").is_none(), "{kind} schema should be inlined");
        }
    }

    #[test]
    fn test_every_schema_compiles() {
        let registry = SchemaRegistry::new();
        for kind in AnalysisKind::ALL {
            assert!(registry.validators[kind.index()].is_ok(), "{kind}");
        }
    }

    #[test]
    fn test_registry_checks_many_replies() {
        let registry = SchemaRegistry::new();
        let reply = json!({"analysisResults": "flat", "riskAssessment": "low"});
        for _ in 0..3 {
            assert!(registry.check(AnalysisKind::ShadowSlope, &reply).is_ok());
        }
        assert!(registry
            .check(AnalysisKind::ShadowSlope, &json!({"analysisResults": 3}))
            .is_err());
    }

    #[test]
    fn test_feature_schema_shape() {
        let schema = SchemaRegistry::new().get(AnalysisKind::FeatureDetection).clone();
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("detectedFeatures")));
        assert!(required.contains(&json!("summary")));

        let item = &schema["properties"]["detectedFeatures"]["items"];
        assert_eq!(item["properties"]["confidence"]["type"], "number");
        assert!(item["properties"]["type"]["description"]
            .as_str()
            .unwrap()
            .contains("landslide"));
    }

    #[test]
    fn test_temporal_schema_enumerates_significance() {
        let schema = SchemaRegistry::new().get(AnalysisKind::TemporalAnalysis).clone();
        let significance = &schema["properties"]["detailedChanges"]["items"]["properties"]["significance"];
        let allowed: Vec<&str> = significance["enum"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(allowed, vec!["low", "medium", "high"]);
    }

    #[test]
    fn test_parse_conforming_reply() {
        let registry = SchemaRegistry::new();
        let output: TemporalAnalysisOutput = registry
            .parse_reply(
                AnalysisKind::TemporalAnalysis,
                json!({
                    "changeSummary": "One new crater.",
                    "detailedChanges": [
                        {"description": "new crater", "location": "sector 4", "significance": "high"}
                    ]
                }),
            )
            .unwrap();
        assert_eq!(output.detailed_changes[0].significance, Significance::High);
    }

    #[test]
    fn test_reply_violations_carry_pointer() {
        let registry = SchemaRegistry::new();
        let errors = registry
            .check(
                AnalysisKind::FeatureDetection,
                &json!({
                    "detectedFeatures": [{"type": "boulder", "confidence": "high", "locationDescription": "NE"}],
                    "summary": "One boulder."
                }),
            )
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("/detectedFeatures/0/confidence"));
    }

    #[test]
    fn test_parse_reply_missing_field_is_upstream_error() {
        let registry = SchemaRegistry::new();
        let err = registry
            .parse_reply::<DetectFeaturesOutput>(
                AnalysisKind::FeatureDetection,
                json!({ "summary": "nothing" }),
            )
            .unwrap_err();
        assert!(!err.is_validation());
        assert!(err.to_string().contains("detectedFeatures"));
    }
}
