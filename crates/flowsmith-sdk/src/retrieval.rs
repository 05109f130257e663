//! Reference retrieval
//!
//! The catalog is read once at start-up and shared read-only between
//! requests. [`CatalogRetriever`] ranks catalog entries by keyword overlap
//! with the request and renders them as context blocks for the generator.

use crate::error::{Result, SdkError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub const COMPONENTS_FILE: &str = "components.json";
pub const TEMPLATES_FILE: &str = "templates.json";
pub const RESOURCES_FILE: &str = "resources.json";
pub const CODE_STORE_FILE: &str = "code_store.jsonl";

const MISSING_CODE: &str = "// Code not found in repository";

/// Kind of a retrieved entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Component,
    Template,
    Helper,
}

/// One block of reference context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextEntry {
    pub id: String,
    pub entry_type: EntryType,
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

/// Retrieval collaborator
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Entries relevant to `query`, most relevant first
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<ContextEntry>>;

    fn is_ready(&self) -> bool {
        true
    }
}

/// Join entries into the context handed to the generator
pub fn render_context(entries: &[ContextEntry]) -> String {
    let blocks: Vec<&str> = entries.iter().map(|e| e.content.as_str()).collect();
    blocks.join("\n")
}

/// A standard tool
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Component {
    pub id: String,
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub input_types: Vec<String>,
    #[serde(default)]
    pub output_types: Vec<String>,
}

/// A pipeline blueprint composed of components
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Template {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logic_flow: Vec<serde_json::Value>,
}

impl Template {
    /// Component ids referenced by the logic flow, in order of appearance
    pub fn step_ids(&self) -> Vec<String> {
        fn step_of(value: &serde_json::Value, out: &mut Vec<String>) {
            if let Some(step) = value.get("step").and_then(|s| s.as_str()) {
                if !out.iter().any(|s| s == step) {
                    out.push(step.to_string());
                }
            }
        }

        let mut ids = Vec::new();
        for flow_step in &self.logic_flow {
            step_of(flow_step, &mut ids);
            for key in ["parallel_execution", "branches", "options"] {
                let Some(items) = flow_step.get(key).and_then(|v| v.as_array()) else {
                    continue;
                };
                for item in items {
                    step_of(item, &mut ids);
                    if let Some(next) = item.get("next").and_then(|v| v.as_array()) {
                        for sub_item in next {
                            step_of(sub_item, &mut ids);
                        }
                    }
                }
            }
        }
        ids
    }
}

/// Helper function importable from the helper namespace
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Helper {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub usage: String,
}

#[derive(Deserialize)]
struct ComponentsFile {
    #[serde(default)]
    components: Vec<Component>,
}

#[derive(Deserialize)]
struct TemplatesFile {
    #[serde(default)]
    templates: Vec<Template>,
}

#[derive(Deserialize, Default)]
struct ResourcesSection {
    #[serde(default)]
    helper_functions: Vec<Helper>,
}

#[derive(Deserialize)]
struct ResourcesFile {
    #[serde(default)]
    resources: ResourcesSection,
}

#[derive(Deserialize)]
struct CodeEntry {
    id: String,
    content: String,
}

/// Read-only reference data
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    components: BTreeMap<String, Component>,
    templates: BTreeMap<String, Template>,
    helpers: Vec<Helper>,
    code: BTreeMap<String, String>,
}

impl ReferenceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every catalog file found in `dir`; absent files leave that part empty
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(SdkError::CatalogError(format!(
                "catalog directory '{}' does not exist",
                dir.display()
            )));
        }

        let mut catalog = Self::new();

        if let Some(file) = read_json::<ComponentsFile>(&dir.join(COMPONENTS_FILE))? {
            for component in file.components {
                catalog.components.insert(component.id.clone(), component);
            }
        }
        if let Some(file) = read_json::<TemplatesFile>(&dir.join(TEMPLATES_FILE))? {
            for template in file.templates {
                catalog.templates.insert(template.id.clone(), template);
            }
        }
        if let Some(file) = read_json::<ResourcesFile>(&dir.join(RESOURCES_FILE))? {
            catalog.helpers = file.resources.helper_functions;
        }

        let code_path = dir.join(CODE_STORE_FILE);
        if code_path.is_file() {
            let text = fs::read_to_string(&code_path)?;
            for (n, line) in text.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<CodeEntry>(line) {
                    Ok(entry) => {
                        catalog.code.insert(entry.id, entry.content);
                    }
                    Err(e) => debug!("skipping code store line {}: {}", n + 1, e),
                }
            }
        }

        info!(
            "loaded catalog from {}: {} components, {} templates, {} helpers, {} code entries",
            dir.display(),
            catalog.components.len(),
            catalog.templates.len(),
            catalog.helpers.len(),
            catalog.code.len()
        );
        Ok(catalog)
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.insert(component.id.clone(), component);
        self
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.templates.insert(template.id.clone(), template);
        self
    }

    pub fn with_helper(mut self, helper: Helper) -> Self {
        self.helpers.push(helper);
        self
    }

    pub fn with_code(mut self, id: impl Into<String>, content: impl Into<String>) -> Self {
        self.code.insert(id.into(), content.into());
        self
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.get(id)
    }

    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    pub fn code(&self, id: &str) -> Option<&str> {
        self.code.get(id).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.templates.is_empty()
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>> {
    if !path.is_file() {
        debug!("catalog file {} not present", path.display());
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| SdkError::CatalogError(format!("{}: {}", path.display(), e)))
}

/// Lower-cased alphanumeric words of at least three characters
fn tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| word.len() >= 3)
        .map(|word| word.to_ascii_lowercase())
        .collect()
}

fn overlap(query: &BTreeSet<String>, text: &str) -> usize {
    tokens(text).intersection(query).count()
}

/// Keyword retriever over a [`ReferenceCatalog`]
pub struct CatalogRetriever {
    catalog: Arc<ReferenceCatalog>,
    embed_code: bool,
}

impl CatalogRetriever {
    pub fn new(catalog: Arc<ReferenceCatalog>) -> Self {
        Self {
            catalog,
            embed_code: false,
        }
    }

    /// Include component source code in component blocks
    pub fn embed_code(mut self, enable: bool) -> Self {
        self.embed_code = enable;
        self
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    fn component_entry(&self, component: &Component) -> ContextEntry {
        let mut content = format!(
            "--- COMPONENT: {} ---\nTOOL: {}\nDESCRIPTION: {}\nCONTAINER: {}\nINPUTS: {}\nOUTPUTS: {}\n",
            component.id,
            component.tool,
            component.description,
            component.container.as_deref().unwrap_or("none"),
            component.input_types.join(", "),
            component.output_types.join(", "),
        );
        if self.embed_code {
            let code = self.catalog.code(&component.id).unwrap_or(MISSING_CODE);
            content.push_str(&format!(
                "\n**SOURCE CODE ({}.nf):**\n```groovy\n{}\n```\n",
                component.id, code
            ));
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("tool".to_string(), component.tool.clone());
        if let Some(container) = &component.container {
            metadata.insert("container".to_string(), container.clone());
        }

        ContextEntry {
            id: component.id.clone(),
            entry_type: EntryType::Component,
            content,
            metadata,
        }
    }

    fn template_entry(&self, template: &Template) -> ContextEntry {
        let code = self.catalog.code(&template.id).unwrap_or(MISSING_CODE);
        let content = format!(
            "### PIPELINE BLUEPRINT: {}\n{}\n\n**SOURCE CODE ({}.nf):**\n```groovy\n{}\n```\n",
            template.id, template.description, template.id, code
        );

        let mut metadata = BTreeMap::new();
        metadata.insert("steps".to_string(), template.step_ids().join(","));

        ContextEntry {
            id: template.id.clone(),
            entry_type: EntryType::Template,
            content,
            metadata,
        }
    }

    fn helper_entry(helper: &Helper) -> ContextEntry {
        ContextEntry {
            id: helper.name.clone(),
            entry_type: EntryType::Helper,
            content: format!(
                "- {}: {}\n  Usage: `{}`",
                helper.name, helper.description, helper.usage
            ),
            metadata: BTreeMap::new(),
        }
    }

    /// Rank catalog entries against the query
    fn rank(&self, query: &str) -> Vec<(usize, EntryType, &str)> {
        let query = tokens(query);
        let mut scored = Vec::new();

        for template in self.catalog.templates.values() {
            let score = overlap(&query, &format!("{} {}", template.id, template.description));
            if score > 0 {
                scored.push((score, EntryType::Template, template.id.as_str()));
            }
        }
        for component in self.catalog.components.values() {
            let text = format!(
                "{} {} {} {} {}",
                component.id,
                component.tool,
                component.description,
                component.input_types.join(" "),
                component.output_types.join(" ")
            );
            let score = overlap(&query, &text);
            if score > 0 {
                scored.push((score, EntryType::Component, component.id.as_str()));
            }
        }

        // Highest score first; ties by id for a stable order
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.2.cmp(&b.2)));
        scored
    }
}

#[async_trait]
impl Retriever for CatalogRetriever {
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<ContextEntry>> {
        let mut found: HashSet<String> = HashSet::new();
        let mut entries = Vec::new();

        for (_, entry_type, id) in self.rank(query).into_iter().take(limit) {
            if found.contains(id) {
                continue;
            }
            match entry_type {
                EntryType::Template => {
                    let Some(template) = self.catalog.template(id) else {
                        continue;
                    };
                    found.insert(id.to_string());
                    entries.push(self.template_entry(template));

                    for step in template.step_ids() {
                        if found.contains(&step) {
                            continue;
                        }
                        if let Some(component) = self.catalog.component(&step) {
                            found.insert(step.clone());
                            entries.push(self.component_entry(component));
                        }
                    }
                }
                EntryType::Component => {
                    if let Some(component) = self.catalog.component(id) {
                        found.insert(id.to_string());
                        entries.push(self.component_entry(component));
                    }
                }
                EntryType::Helper => {}
            }
        }

        let mut helpers: Vec<ContextEntry> = Vec::new();
        for helper in &self.catalog.helpers {
            let used = entries.iter().any(|e| {
                e.content.contains(&helper.name)
                    || self
                        .catalog
                        .code(&e.id)
                        .map(|code| code.contains(&helper.name))
                        .unwrap_or(false)
            });
            if used {
                helpers.push(Self::helper_entry(helper));
            }
        }
        entries.extend(helpers);

        debug!("retrieved {} entries for query", entries.len());
        Ok(entries)
    }

    fn is_ready(&self) -> bool {
        !self.catalog.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn component(id: &str, tool: &str, description: &str) -> Component {
        Component {
            id: id.to_string(),
            tool: tool.to_string(),
            description: description.to_string(),
            container: Some(format!("quay.io/biocontainers/{}", tool)),
            input_types: vec!["fastq".to_string()],
            output_types: vec!["bam".to_string()],
        }
    }

    fn catalog() -> ReferenceCatalog {
        ReferenceCatalog::new()
            .with_component(component("tool_bwa", "bwa", "Align short reads to a reference genome"))
            .with_component(component("tool_fastqc", "fastqc", "Quality control report for raw reads"))
            .with_component(component("tool_gatk", "gatk", "Call germline variants"))
            .with_template(Template {
                id: "module_viral_mapper".to_string(),
                description: "Viral genome mapping and variant calling".to_string(),
                logic_flow: vec![
                    json!({"step": "tool_bwa"}),
                    json!({"parallel_execution": [{"step": "tool_gatk", "next": [{"step": "tool_fastqc"}]}]}),
                ],
            })
            .with_helper(Helper {
                name: "extractKey".to_string(),
                description: "Key for cross joins".to_string(),
                usage: "extractKey(meta)".to_string(),
            })
            .with_code("module_viral_mapper", "workflow { extractKey(x) }")
    }

    #[test]
    fn test_template_step_ids() {
        let catalog = catalog();
        let template = catalog.template("module_viral_mapper").unwrap();
        assert_eq!(template.step_ids(), vec!["tool_bwa", "tool_gatk", "tool_fastqc"]);
    }

    #[tokio::test]
    async fn test_component_hit() {
        let retriever = CatalogRetriever::new(Arc::new(catalog()));
        let entries = retriever.retrieve("quality control of reads", 1).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "tool_fastqc");
        assert!(entries[0].content.starts_with("--- COMPONENT: tool_fastqc ---"));
    }

    #[tokio::test]
    async fn test_template_expands_components_and_helpers() {
        let retriever = CatalogRetriever::new(Arc::new(catalog()));
        let entries = retriever.retrieve("viral mapping pipeline", 1).await.unwrap();

        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["module_viral_mapper", "tool_bwa", "tool_gatk", "tool_fastqc", "extractKey"]
        );
        assert_eq!(entries[4].entry_type, EntryType::Helper);
    }

    #[tokio::test]
    async fn test_no_match() {
        let retriever = CatalogRetriever::new(Arc::new(catalog()));
        assert!(retriever.retrieve("xy", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embed_code() {
        let retriever = CatalogRetriever::new(Arc::new(catalog())).embed_code(true);
        let entries = retriever.retrieve("germline variants", 1).await.unwrap();
        assert!(entries[0].content.contains(MISSING_CODE));
    }

    #[test]
    fn test_render_context() {
        let entries = vec![
            CatalogRetriever::helper_entry(&Helper {
                name: "a".to_string(),
                description: "first".to_string(),
                usage: "a()".to_string(),
            }),
            CatalogRetriever::helper_entry(&Helper {
                name: "b".to_string(),
                description: "second".to_string(),
                usage: "b()".to_string(),
            }),
        ];
        assert_eq!(
            render_context(&entries),
            "- a: first\n  Usage: `a()`\n- b: second\n  Usage: `b()`"
        );
    }
}
