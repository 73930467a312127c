//! Extraction of "buy ingredients" directives embedded in assistant text.
//!
//! The assistant replies in free-form markdown and may embed purchasable
//! ingredient bundles inline, e.g.
//!
//! ```text
//! [BUY_INGREDIENTS: {"items": [{"name": "Onion", "price": 110}], "total": 110}]
//! ```
//!
//! [`DirectiveExtractor`] partitions such text into an ordered list of
//! [`ContentSegment`]s. The JSON span is located by brace counting rather than
//! a shortest-match pattern so nested objects inside the payload are kept
//! whole. Malformed markers never abort the scan; they are logged and dropped.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::DirectiveError;
use crate::types::{ContentSegment, IngredientDirective};

/// Marker opening a directive span
pub const BUY_INGREDIENTS_MARKER: &str = "[BUY_INGREDIENTS:";

/// Marker older assistant prompts emitted for the same payload
pub const LEGACY_BUY_BUTTON_MARKER: &str = "[BUY_BUTTON_DATA:";

/// What to do with a well-formed directive whose `items` list is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyDirectivePolicy {
    /// Drop the marker span entirely
    #[default]
    Discard,
    /// Leave the marker span in the surrounding prose
    RestoreAsProse,
}

/// Extractor settings
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// Literal tokens that open a directive, matched case-sensitively
    pub markers: Vec<String>,
    pub empty_policy: EmptyDirectivePolicy,
    /// Stop recognising directives after this many have been emitted
    pub max_directives: Option<usize>,
    /// Drop payloads whose JSON span exceeds this many bytes
    pub max_payload_bytes: Option<usize>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            markers: vec![
                BUY_INGREDIENTS_MARKER.to_string(),
                LEGACY_BUY_BUTTON_MARKER.to_string(),
            ],
            empty_policy: EmptyDirectivePolicy::default(),
            max_directives: None,
            max_payload_bytes: None,
        }
    }
}

/// Splits assistant text into prose and directive segments
#[derive(Debug, Clone, Default)]
pub struct DirectiveExtractor {
    config: ExtractorConfig,
}

impl DirectiveExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Partitions `text` into segments in source order.
    ///
    /// Prose is emitted verbatim; whitespace-only runs are skipped. The
    /// result depends only on `text` and the extractor's configuration.
    pub fn extract(&self, text: &str) -> Vec<ContentSegment> {
        let mut segments = Vec::new();
        // Start of the prose run not yet emitted
        let mut prose_start = 0;
        // Where the next marker search begins
        let mut cursor = 0;
        let mut emitted = 0;

        while cursor < text.len() {
            if self.config.max_directives.is_some_and(|max| emitted >= max) {
                debug!(max = emitted, "directive limit reached, remaining text kept as prose");
                break;
            }

            let Some((marker_start, marker_len)) = self.find_marker(text, cursor) else {
                break;
            };

            let payload_from = marker_start + marker_len;
            let Some(json_start) = text[payload_from..].find('{').map(|i| payload_from + i) else {
                debug!(offset = marker_start, "directive marker without payload");
                break;
            };

            let Some(json_end) = matching_brace(text, json_start) else {
                warn!(offset = marker_start, "unterminated directive payload");
                cursor = marker_start + 1;
                continue;
            };

            // Anything between the payload's closing brace and the `]` belongs to the
            // marker. The `]` must come before the next marker.
            let search_end = self
                .find_marker(text, json_end)
                .map_or(text.len(), |(next, _)| next);
            let span_end = text[json_end..search_end]
                .find(']')
                .map(|i| json_end + i + 1)
                .unwrap_or(json_end);

            match self.parse_payload(&text[json_start..json_end]) {
                Ok(directive) => {
                    push_prose(&mut segments, &text[prose_start..marker_start]);
                    segments.push(ContentSegment::Directive(directive));
                    prose_start = span_end;
                    emitted += 1;
                }
                Err(DirectiveError::Empty)
                    if self.config.empty_policy == EmptyDirectivePolicy::RestoreAsProse =>
                {
                    debug!(offset = marker_start, "empty directive restored as prose");
                }
                Err(e) => {
                    warn!(offset = marker_start, error = %e, "dropping directive");
                    push_prose(&mut segments, &text[prose_start..marker_start]);
                    prose_start = span_end;
                }
            }

            cursor = span_end;
        }

        push_prose(&mut segments, &text[prose_start..]);
        segments
    }

    /// Earliest configured marker at or after `from`, as (offset, marker length).
    fn find_marker(&self, text: &str, from: usize) -> Option<(usize, usize)> {
        self.config
            .markers
            .iter()
            .filter(|marker| !marker.is_empty())
            .filter_map(|marker| {
                text[from..]
                    .find(marker.as_str())
                    .map(|i| (from + i, marker.len()))
            })
            .min_by_key(|(offset, _)| *offset)
    }

    fn parse_payload(&self, json: &str) -> Result<IngredientDirective, DirectiveError> {
        if let Some(limit) = self.config.max_payload_bytes {
            if json.len() > limit {
                return Err(DirectiveError::TooLarge {
                    size: json.len(),
                    limit,
                });
            }
        }

        let directive: IngredientDirective = serde_json::from_str(json)?;
        if !directive.is_valid() {
            return Err(DirectiveError::Empty);
        }
        Ok(directive)
    }
}

/// Extracts segments with the default configuration
pub fn extract_segments(text: &str) -> Vec<ContentSegment> {
    DirectiveExtractor::default().extract(text)
}

/// Offset one past the `}` that brings brace depth back to zero, counting from
/// the `{` at `open`. `None` when the braces never balance.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, byte) in text.as_bytes()[open..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn push_prose(segments: &mut Vec<ContentSegment>, run: &str) {
    if !run.trim().is_empty() {
        segments.push(ContentSegment::Prose(run.to_string()));
    }
}
