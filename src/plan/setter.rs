//! Path-based value assignment onto record trees
//!
//! A parameter path such as `solution/0/solution/solute/1/concentration_mol`
//! is walked segment by segment. Each node met on the way is classified into a
//! [`NodeKind`] and descended according to its own rule.

use crate::error::SetValueError;
use crate::schema::{units, DType, FieldDef, FieldKind, SchemaRegistry, SectionRole};
use crate::section::{Quantity, Section, Value};
use crate::store::ReferenceResolver;
use tracing::debug;

/// How a node is descended into
#[derive(Debug)]
pub enum NodeKind<'n> {
    /// An ordered list; the next segment is an index.
    Sequence(&'n mut Vec<Value>),
    /// A record holding a solution reference; snapshotted before descent.
    SolutionHolder(&'n mut Section),
    PlainRecord(&'n mut Section),
    /// The last segment names a field on this record.
    Leaf(&'n mut Section),
}

pub struct ValueSetter<'a> {
    schema: &'a SchemaRegistry,
    resolver: &'a dyn ReferenceResolver,
}

impl<'a> ValueSetter<'a> {
    pub fn new(schema: &'a SchemaRegistry, resolver: &'a dyn ReferenceResolver) -> Self {
        Self { schema, resolver }
    }

    /// Assign `value` at `path` below `root`.
    ///
    /// With a unit the value is parsed as a number and stored as a quantity in that
    /// unit; without one it is stored as given, typed by the field declaration.
    pub fn set_value(
        &self,
        root: &mut Section,
        path: &str,
        value: &str,
        unit: Option<&str>,
    ) -> Result<(), SetValueError> {
        let segments: Vec<&str> = path.split('/').map(str::trim).collect();
        if path.trim().is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(SetValueError::EmptyPath);
        }
        self.descend_section(root, &segments, value, unit)?;
        debug!(path, value, unit = unit.unwrap_or("None"), "Parameter applied");
        Ok(())
    }

    fn classify<'n>(&self, node: &'n mut Value, path: &str) -> Result<NodeKind<'n>, SetValueError> {
        match node {
            Value::List(items) => Ok(NodeKind::Sequence(items)),
            Value::Section(section) => Ok(self.classify_section(section, 2)),
            _ => Err(SetValueError::NotASection(path.to_string())),
        }
    }

    fn classify_section<'n>(&self, section: &'n mut Section, remaining: usize) -> NodeKind<'n> {
        if remaining == 1 {
            return NodeKind::Leaf(section);
        }
        match self.schema.role(&section.m_def) {
            SectionRole::SolutionHolder => NodeKind::SolutionHolder(section),
            _ => NodeKind::PlainRecord(section),
        }
    }

    fn descend_section(
        &self,
        section: &mut Section,
        segments: &[&str],
        value: &str,
        unit: Option<&str>,
    ) -> Result<(), SetValueError> {
        match self.classify_section(section, segments.len()) {
            NodeKind::Leaf(section) => self.assign(section, segments[0], value, unit),
            NodeKind::SolutionHolder(section) => {
                self.snapshot_solution(section)?;
                // edits through the reference land on the snapshot
                let field = match segments[0] {
                    "solution" => "solution_details",
                    other => other,
                };
                self.descend_field(section, field, &segments[1..], value, unit)
            }
            NodeKind::PlainRecord(section) => {
                self.descend_field(section, segments[0], &segments[1..], value, unit)
            }
            NodeKind::Sequence(_) => Err(SetValueError::NotASection(segments[0].to_string())),
        }
    }

    fn descend_value(
        &self,
        node: &mut Value,
        segments: &[&str],
        value: &str,
        unit: Option<&str>,
    ) -> Result<(), SetValueError> {
        match self.classify(node, segments[0])? {
            NodeKind::Sequence(items) => {
                let index: usize = segments[0]
                    .parse()
                    .map_err(|_| SetValueError::InvalidIndex(segments[0].to_string()))?;
                let len = items.len();
                let item = items
                    .get_mut(index)
                    .ok_or(SetValueError::IndexOutOfRange { index, len })?;
                if segments.len() == 1 {
                    return Err(SetValueError::NotAssignable(segments[0].to_string()));
                }
                self.descend_value(item, &segments[1..], value, unit)
            }
            NodeKind::SolutionHolder(section)
            | NodeKind::PlainRecord(section)
            | NodeKind::Leaf(section) => self.descend_section(section, segments, value, unit),
        }
    }

    /// Move into `field` of `section`, instantiating unset placeholders.
    fn descend_field(
        &self,
        section: &mut Section,
        field: &str,
        rest: &[&str],
        value: &str,
        unit: Option<&str>,
    ) -> Result<(), SetValueError> {
        let def = self.field_def(section, field)?;
        let placeholder = match &def.kind {
            FieldKind::SubSection {
                section: target,
                placeholder: true,
                ..
            } if !section.is_set(field) => Some(self.placeholder(target)),
            FieldKind::SubSection { .. } => None,
            FieldKind::Reference { .. } | FieldKind::Quantity { .. } => {
                return Err(SetValueError::NotASection(field.to_string()));
            }
        };
        if let Some(instance) = placeholder {
            debug!(field, m_def = %instance.m_def, "Instantiating placeholder");
            section.set(field, Value::Section(instance));
        }

        let child = section
            .get_mut(field)
            .filter(|v| !v.is_unset())
            .ok_or_else(|| SetValueError::UnsetSubSection(field.to_string()))?;
        self.descend_value(child, rest, value, unit)
    }

    fn placeholder(&self, m_def: &str) -> Section {
        let section = Section::new(m_def);
        match self.schema.role(m_def) {
            SectionRole::PureSubstance => section.with("load_data", Value::Scalar(false.into())),
            _ => section,
        }
    }

    /// Copy the referenced solution into `solution_details` unless already there.
    fn snapshot_solution(&self, holder: &mut Section) -> Result<(), SetValueError> {
        if holder.is_set("solution_details") {
            return Ok(());
        }
        let reference = holder
            .get_str("solution")
            .filter(|r| !r.is_empty())
            .ok_or_else(|| SetValueError::SolutionUnset(holder.m_def.clone()))?
            .to_string();
        let solution = self.resolver.resolve(&reference)?;
        debug!(reference = %reference, "Snapshotting solution");
        holder.set("solution_details", Value::Section(solution));
        Ok(())
    }

    fn field_def(&self, section: &Section, field: &str) -> Result<&'a FieldDef, SetValueError> {
        if !self.schema.contains(&section.m_def) {
            return Err(SetValueError::UnknownSection(section.m_def.clone()));
        }
        self.schema
            .field(&section.m_def, field)
            .ok_or_else(|| SetValueError::NoSuchField {
                section: section.m_def.clone(),
                field: field.to_string(),
            })
    }

    fn assign(
        &self,
        section: &mut Section,
        field: &str,
        value: &str,
        unit: Option<&str>,
    ) -> Result<(), SetValueError> {
        let def = self.field_def(section, field)?;
        let assigned = match (&def.kind, unit) {
            (FieldKind::SubSection { .. }, _) => {
                return Err(SetValueError::NotAssignable(field.to_string()))
            }
            (FieldKind::Quantity { array: true, .. }, _) => {
                return Err(SetValueError::NotAssignable(field.to_string()))
            }
            (FieldKind::Quantity { dtype, unit: declared, .. }, Some(unit)) => {
                quantity(*dtype, declared.as_deref(), value, unit)?
            }
            (FieldKind::Quantity { dtype, .. }, None) => raw(*dtype, value)?,
            (FieldKind::Reference { .. }, Some(unit)) => {
                return Err(SetValueError::IncompatibleUnit {
                    unit: unit.to_string(),
                    expected: "a reference".to_string(),
                })
            }
            (FieldKind::Reference { .. }, None) => Value::string(value),
        };
        section.set(field, assigned);
        Ok(())
    }
}

fn parse_number(value: &str) -> Result<f64, SetValueError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| SetValueError::InvalidNumber(value.to_string()))
}

fn quantity(
    dtype: DType,
    declared: Option<&str>,
    value: &str,
    unit: &str,
) -> Result<Value, SetValueError> {
    if !matches!(dtype, DType::Float | DType::Int) {
        return Err(SetValueError::IncompatibleUnit {
            unit: unit.to_string(),
            expected: "no unit".to_string(),
        });
    }
    if units::parse(unit).is_none() {
        return Err(SetValueError::UnknownUnit(unit.to_string()));
    }
    if let Some(declared) = declared {
        if !units::compatible(unit, declared) {
            return Err(SetValueError::IncompatibleUnit {
                unit: unit.to_string(),
                expected: declared.to_string(),
            });
        }
    }
    Ok(Value::Quantity(Quantity {
        value: parse_number(value)?,
        unit: unit.to_string(),
    }))
}

fn raw(dtype: DType, value: &str) -> Result<Value, SetValueError> {
    Ok(match dtype {
        DType::Str | DType::Datetime => Value::string(value),
        DType::Float => {
            let number = serde_json::Number::from_f64(parse_number(value)?)
                .ok_or_else(|| SetValueError::InvalidNumber(value.to_string()))?;
            Value::Scalar(serde_json::Value::Number(number))
        }
        DType::Int => match value.trim().parse::<i64>() {
            Ok(int) => Value::Scalar(int.into()),
            Err(_) => {
                let float = parse_number(value)?;
                if float.fract() != 0.0 {
                    return Err(SetValueError::InvalidNumber(value.to_string()));
                }
                Value::Scalar((float as i64).into())
            }
        },
        DType::Bool => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Value::Scalar(true.into()),
            "false" | "0" | "no" => Value::Scalar(false.into()),
            _ => return Err(SetValueError::InvalidBool(value.to_string())),
        },
    })
}
