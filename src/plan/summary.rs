//! Batch plan summary
//!
//! Renders every materialized process and the solutions used into markdown, then
//! HTML, and embeds the result in the plan description between fixed markers.

use crate::plan::instantiate::WiredProcess;
use crate::schema::{FieldKind, SchemaRegistry};
use crate::section::{Section, Value};
use crate::store::ReferenceResolver;
use pulldown_cmark::{html, Options, Parser};
use tracing::debug;

pub const START_MARKER: &str = "----------start summary----------";
pub const END_MARKER: &str = "----------end summary----------";

/// Fields that describe wiring rather than the process itself.
const EXCLUDED_FIELDS: [&str; 8] = [
    "previous_process",
    "is_standard_process",
    "samples",
    "batch",
    "name",
    "datetime",
    "lab_id",
    "m_def",
];

/// Rendered summary
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Block embedded in the plan description, markers included.
    pub block: String,
    /// Content of the `batch_plan_{lab_id}.html` file.
    pub document: String,
}

impl Summary {
    pub fn file_name(lab_id: &str) -> String {
        format!("batch_plan_{}.html", lab_id)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn shift(indent: usize) -> String {
    "&nbsp;".repeat(indent)
}

fn line(key: &str, item: &str, indent: usize) -> String {
    format!("{}**{}**: {}  \n", shift(indent), capitalize(key), item)
}

/// Render markdown to HTML.
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Replace the marked summary block of `description` with `block`.
///
/// Text outside the markers is kept as is. Without an existing block the new one
/// is appended.
pub fn splice_description(description: Option<&str>, block: &str) -> String {
    let description = description.unwrap_or_default();
    if let Some(start) = description.find(START_MARKER) {
        if let Some(offset) = description[start..].find(END_MARKER) {
            let end = start + offset + END_MARKER.len();
            return format!("{}{}{}", &description[..start], block, &description[end..]);
        }
    }
    format!("{}{}", description, block)
}

pub struct SummaryBuilder<'a> {
    schema: &'a SchemaRegistry,
    resolver: &'a dyn ReferenceResolver,
    lab_id: String,
    markdown: String,
}

impl<'a> SummaryBuilder<'a> {
    pub fn new(schema: &'a SchemaRegistry, resolver: &'a dyn ReferenceResolver, lab_id: &str) -> Self {
        Self {
            schema,
            resolver,
            lab_id: lab_id.to_string(),
            markdown: format!("# Batch plan of batch {}\n\n", lab_id),
        }
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    /// Add a `### {step}.{subbatch} {name}` section for one process.
    pub fn add_process(&mut self, wired: &WiredProcess) {
        let process = &wired.process;
        self.markdown.push_str(&format!(
            "### {}.{} {}  \n**Batch Id**: {}  \n",
            wired.step + 1,
            wired.subbatch + 1,
            capitalize(process.name().unwrap_or_default()),
            wired.scope
        ));
        let mut out = String::new();
        self.section_lines(&mut out, process, 0, true);
        self.markdown.push_str(&out);
    }

    /// Finish with the solutions block and render.
    pub fn finish(self, solutions: &[Section]) -> Summary {
        let html = render_markdown(&self.markdown.replace('_', "\\_"));

        let mut solution_md = String::new();
        for (k, solution) in solutions.iter().enumerate() {
            solution_md.push_str(&format!(
                "**{}.** {}  \n",
                k + 1,
                solution.name().unwrap_or(solution.m_def.as_str())
            ));
            self.section_lines(&mut solution_md, solution, 4, true);
        }
        let sol = format!(
            "<b> Solutions for batch {}</b><br><br>{}",
            self.lab_id,
            render_markdown(&solution_md.replace('_', "\\_"))
        );

        debug!(lab_id = %self.lab_id, solutions = solutions.len(), "Summary rendered");
        Summary {
            block: format!("{}<br>{}<br>{}<br>{}", START_MARKER, sol, html, END_MARKER),
            document: format!("{}<br>{}", sol, html),
        }
    }

    /// Set fields of `section` in declaration order, undeclared ones last.
    fn ordered_fields<'s>(&self, section: &'s Section) -> Vec<(&'s str, &'s Value)> {
        let mut ordered: Vec<(&'s str, &'s Value)> = Vec::new();
        for def in self.schema.fields(&section.m_def) {
            if let Some((key, value)) = section.fields.get_key_value(def.name.as_str()) {
                ordered.push((key.as_str(), value));
            }
        }
        for (key, value) in &section.fields {
            if !ordered.iter().any(|(k, _)| *k == key.as_str()) {
                ordered.push((key.as_str(), value));
            }
        }
        ordered.retain(|(_, value)| !value.is_unset());
        ordered
    }

    fn is_reference(&self, section: &Section, field: &str) -> bool {
        matches!(
            self.schema.field(&section.m_def, field).map(|def| &def.kind),
            Some(FieldKind::Reference { .. })
        )
    }

    fn section_lines(&self, out: &mut String, section: &Section, indent: usize, expand: bool) {
        for (key, value) in self.ordered_fields(section) {
            self.key_item(out, section, key, value, indent, expand);
        }
    }

    fn key_item(
        &self,
        out: &mut String,
        owner: &Section,
        key: &str,
        value: &Value,
        indent: usize,
        expand: bool,
    ) {
        if EXCLUDED_FIELDS.contains(&key) {
            return;
        }
        match value {
            Value::Section(sub) => {
                out.push_str(&format!("{}**{}**:  \n", shift(indent), capitalize(key)));
                for (key2, value2) in self.ordered_fields(sub) {
                    out.push_str(&line(key2, &value2.to_string(), indent + 4));
                }
            }
            Value::List(items) if items.iter().any(|item| item.as_section().is_some()) => {
                out.push_str(&format!("{}**{}**:  \n", shift(indent), capitalize(key)));
                for (k, item) in items.iter().enumerate() {
                    out.push_str(&format!("{}{}**{}.**  \n", shift(indent), shift(4), k + 1));
                    if let Some(sub) = item.as_section() {
                        for (key2, value2) in self.ordered_fields(sub) {
                            out.push_str(&line(key2, &value2.to_string(), indent + 8));
                        }
                    }
                }
            }
            Value::Scalar(serde_json::Value::String(reference))
                if expand && self.is_reference(owner, key) =>
            {
                match self.resolver.resolve(reference) {
                    Ok(target) => {
                        let name = target.name().unwrap_or(target.m_def.as_str()).to_string();
                        out.push_str(&line(key, &name, indent + 4));
                        for (key2, value2) in self.ordered_fields(&target) {
                            self.key_item(out, &target, key2, value2, indent + 8, false);
                        }
                    }
                    Err(e) => {
                        debug!(reference = %reference, error = %e, "Summary reference not resolvable");
                        out.push_str(&line(key, reference, indent));
                    }
                }
            }
            other => out.push_str(&line(key, &other.to_string(), indent)),
        }
    }
}
