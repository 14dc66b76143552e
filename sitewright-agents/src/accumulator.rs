use std::collections::BTreeMap;

use sitewright_llm_sdk::tools::ToolCall;
use sitewright_llm_sdk::types::ToolCallDelta;
use tracing::warn;

#[derive(Debug, Default)]
struct ToolCallBuilder {
    id: Option<String>,
    name: String,
    arguments: String,
}

/// Reassembles streamed tool-call fragments, keyed by the fragment index.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    builders: BTreeMap<u32, ToolCallBuilder>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, delta: &ToolCallDelta) {
        let builder = self.builders.entry(delta.index).or_default();

        if builder.id.is_none() {
            builder.id = delta.id.clone().filter(|id| !id.is_empty());
        }
        if let Some(function) = &delta.function {
            if let Some(name) = &function.name {
                builder.name.push_str(name);
            }
            if let Some(arguments) = &function.arguments {
                builder.arguments.push_str(arguments);
            }
        }
    }

    pub fn extend<'a>(&mut self, deltas: impl IntoIterator<Item = &'a ToolCallDelta>) {
        for delta in deltas {
            self.push(delta);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Complete calls in index order. Fragments that never got a name or
    /// arguments are dropped.
    pub fn finish(self) -> Vec<ToolCall> {
        self.builders
            .into_iter()
            .filter_map(|(index, builder)| {
                if builder.name.is_empty() || builder.arguments.is_empty() {
                    warn!(
                        index,
                        name = %builder.name,
                        "Dropping incomplete streamed tool call"
                    );
                    return None;
                }
                let id = builder.id.unwrap_or_else(|| format!("call_{}", index));
                Some(ToolCall::new(id, builder.name, builder.arguments))
            })
            .collect()
    }
}
