//! Prompt templates and composition
//!
//! Each analysis kind owns one fixed instruction template. Placeholders use a
//! small Handlebars subset:
//!
//! - `{{name}}` / `{{{name}}}` insert the text field `name`
//! - `{{media url=name}}` attaches the data URI field `name` as inline media
//!
//! Rendering is plain interpolation. A field the input does not provide renders
//! as nothing, the same way Handlebars treats an undefined value.

use crate::analysis::{AnalysisKind, DataUri};

const FEATURE_DETECTION_TEMPLATE: &str = "\
You are an expert in lunar geology and image analysis. Your task is to analyze lunar images and detect potential hazards, specifically landslides and boulders.

Analyze the following image and any additional context to identify landslides, boulders, and other notable geological features.

Image: {{media url=photoDataUri}}
Additional Context: {{{additionalContext}}}

Based on your analysis, provide a list of detected features with their confidence levels (0 to 1) and location descriptions. Also provide a summary of the detected features and any potential hazards they pose to lunar missions.

Respond with JSON that follows the provided output schema.
";

const SHADOW_SLOPE_TEMPLATE: &str = "\
You are an expert lunar geologist specializing in analyzing lunar terrain.

Use the image and digital terrain model (DTM) provided to analyze shadow and slope based features and differentiate between natural terrain and displaced mass. Provide a risk assessment based on your findings.

Description: {{{description}}}
Image: {{media url=imageUri}}
DTM: {{media url=dtmUri}}
";

const GEOLOGICAL_REASONING_TEMPLATE: &str = "\
You are a geologist specializing in lunar risk assessment. Analyze the extracted lunar features and correlate them with known geological data to identify and map risk zones accurately.

Extracted Features: {{{extractedFeatures}}}
Known Geological Data: {{{knownGeologicalData}}}

Based on your analysis, provide a risk zone mapping and a contextual analysis.
For the riskZoneMapping field output a string that can be saved as a GeoJSON file, and for the llmContextualAnalysis field a paragraph form analysis.
";

const TEMPORAL_ANALYSIS_TEMPLATE: &str = "\
You are an expert in lunar geology and temporal image analysis. Your task is to compare two images of the same lunar region taken at different times and identify any geological changes.

Image Before (taken on {{dateBefore}}):
{{media url=imageBeforeUri}}

Image After (taken on {{dateAfter}}):
{{media url=imageAfterUri}}

Analyze these two images to identify changes such as new craters, boulder movements, landslides, or any other surface disturbances. Provide a summary of your findings and a detailed list of each significant change you detect, including its location and its significance (low, medium or high) for mission planning.
";

static TEMPLATES: [(AnalysisKind, &str); 4] = [
    (AnalysisKind::FeatureDetection, FEATURE_DETECTION_TEMPLATE),
    (AnalysisKind::ShadowSlope, SHADOW_SLOPE_TEMPLATE),
    (AnalysisKind::GeologicalReasoning, GEOLOGICAL_REASONING_TEMPLATE),
    (AnalysisKind::TemporalAnalysis, TEMPORAL_ANALYSIS_TEMPLATE),
];

/// Instruction template for an analysis kind.
pub fn template_for(kind: AnalysisKind) -> &'static str {
    TEMPLATES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, template)| *template)
        .unwrap_or_default()
}

// ============================================================================
// Prompt
// ============================================================================

/// One piece of a composed prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPart {
    Text(String),
    Media(DataUri),
}

/// A composed prompt: text interleaved with media attachments, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prompt {
    pub parts: Vec<PromptPart>,
}

impl Prompt {
    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(PromptPart::Text(last)) = self.parts.last_mut() {
            last.push_str(text);
        } else {
            self.parts.push(PromptPart::Text(text.to_string()));
        }
    }

    fn push_media(&mut self, media: &DataUri) {
        self.parts.push(PromptPart::Media(media.clone()));
    }

    /// Text parts concatenated, media left out.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                PromptPart::Text(text) => Some(text.as_str()),
                PromptPart::Media(_) => None,
            })
            .collect()
    }

    pub fn media(&self) -> impl Iterator<Item = &DataUri> {
        self.parts.iter().filter_map(|part| match part {
            PromptPart::Media(media) => Some(media),
            PromptPart::Text(_) => None,
        })
    }
}

/// A value a template placeholder can resolve to.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Media(&'a DataUri),
}

/// Named field lookup used to fill a template, keyed by wire name.
pub trait PromptFields {
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

/// Piece of a tokenized template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'t> {
    Literal(&'t str),
    Text(&'t str),
    Media(&'t str),
}

/// Split a template into literal text and placeholders.
fn tokenize(template: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let (open, close) = if rest[start..].starts_with("{{{") {
            ("{{{", "}}}")
        } else {
            ("{{", "}}")
        };
        let body_start = start + open.len();
        let Some(body_len) = rest[body_start..].find(close) else {
            break;
        };

        if start > 0 {
            tokens.push(Token::Literal(&rest[..start]));
        }
        let body = rest[body_start..body_start + body_len].trim();
        let token = match body.strip_prefix("media") {
            Some(args) if args.starts_with(char::is_whitespace) => {
                let args = args.trim();
                Token::Media(args.strip_prefix("url=").unwrap_or(args))
            }
            _ => Token::Text(body),
        };
        tokens.push(token);
        rest = &rest[body_start + body_len + close.len()..];
    }

    if !rest.is_empty() {
        tokens.push(Token::Literal(rest));
    }
    tokens
}

/// Fill `template` from `fields`.
pub fn render(template: &str, fields: &dyn PromptFields) -> Prompt {
    let mut prompt = Prompt::default();

    for token in tokenize(template) {
        match token {
            Token::Literal(literal) => prompt.push_text(literal),
            Token::Text(name) => match fields.field(name) {
                Some(FieldValue::Text(text)) => prompt.push_text(text),
                Some(FieldValue::Media(media)) => prompt.push_text(media.as_str()),
                None => {}
            },
            Token::Media(name) => match fields.field(name) {
                Some(FieldValue::Media(media)) => prompt.push_media(media),
                Some(FieldValue::Text(_)) | None => {
                    tracing::debug!(field = %name, "Media placeholder has no data URI value");
                }
            },
        }
    }

    prompt
}

/// Compose the prompt for `kind` from a validated input.
pub fn compose(kind: AnalysisKind, fields: &dyn PromptFields) -> Prompt {
    render(template_for(kind), fields)
}

/// Field names a template refers to, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    tokenize(template)
        .into_iter()
        .filter_map(|token| match token {
            Token::Text(name) | Token::Media(name) => Some(name),
            Token::Literal(_) => None,
        })
        .collect()
}
