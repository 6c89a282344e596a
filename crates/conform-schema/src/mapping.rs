//! # Mapping Matcher
//!
//! Matches a mapping input against declared (key pattern, value schema)
//! entries.
//!
//! ## Key resolution
//!
//! Candidates are ordered once at compile time: literal keys first, then
//! marker-wrapped keys, then type/predicate patterns, then the `Extra`
//! catch-all, declaration order breaking ties. Each input key resolves to
//!
//! 1. the candidate whose literal equals it,
//! 2. with [`KeyMatching::CaseInsensitive`], the first text literal equal to
//!    it ignoring case,
//! 3. the first pattern candidate whose key validator accepts it. The
//!    validator's output becomes the output key.
//!
//! A `Remove` candidate drops the pair; its value is never examined.
//!
//! ## Aggregation
//!
//! Value failures, extra keys, missing required keys and group violations
//! are all collected before anything is raised.

use std::collections::{HashMap, HashSet};

use conform_core::{
    ErrorKind, Invalid, MultipleInvalid, Path, PathSegment, SchemaError, ValidationResult, Value,
    ValueMap,
};

use crate::compile::{compile, SchemaNode};
use crate::marker::{DefaultValue, MarkerId, MarkerKind};
use crate::raw::RawSchema;
use crate::schema::{ExtraPolicy, KeyMatching, SchemaOptions};

#[derive(Debug)]
enum KeyPattern {
    Literal(Value),
    Validator(SchemaNode),
}

#[derive(Debug)]
struct KeyCandidate {
    /// Position in the declared mapping.
    declared: usize,
    /// 0 = literal, 1 = marker-wrapped, 2 = type/predicate pattern,
    /// 3 = catch-all (`Extra`).
    priority: u8,
    pattern: KeyPattern,
    /// Rendered key, used to address a missing pattern key.
    label: String,
    value: SchemaNode,
    required: bool,
    remove: bool,
    default: DefaultValue,
    msg: Option<String>,
    marker: Option<MarkerId>,
}

/// True for a key whose lookup fragment is `Predicate::extra()`.
fn is_catch_all(key: &RawSchema) -> bool {
    matches!(key.lookup_key(), RawSchema::Predicate(p) if p.is_catch_all())
}

impl KeyCandidate {
    fn compile(
        declared: usize,
        key: &RawSchema,
        value: &RawSchema,
        options: &SchemaOptions,
    ) -> Result<Self, SchemaError> {
        check_key_shape(key)?;
        let value = compile(value, options)?;
        let catch_all = is_catch_all(key);

        let RawSchema::Marker(marker) = key else {
            let (priority, pattern) = match key {
                RawSchema::Literal(literal) => {
                    compile(key, options)?;
                    (0, KeyPattern::Literal(literal.clone()))
                }
                pattern if catch_all => (3, KeyPattern::Validator(compile(pattern, options)?)),
                pattern => (2, KeyPattern::Validator(compile(pattern, options)?)),
            };
            return Ok(Self {
                declared,
                priority,
                pattern,
                label: key.to_string(),
                value,
                required: options.required && !catch_all,
                remove: false,
                default: DefaultValue::Absent,
                msg: None,
                marker: None,
            });
        };

        marker.check()?;
        check_key_shape(marker.key().lookup_key())?;
        let pattern = match key.literal_key() {
            Some(literal) => KeyPattern::Literal(literal.clone()),
            None if marker.default_value().is_set() => {
                return Err(SchemaError::new(format!(
                    "{} key {} carries a default and must wrap a literal value",
                    marker.kind().name(),
                    marker.key()
                )))
            }
            None => KeyPattern::Validator(compile(key, &SchemaOptions::default())?),
        };

        Ok(Self {
            declared,
            priority: if catch_all { 3 } else { 1 },
            pattern,
            label: marker.key().to_string(),
            value,
            required: *marker.kind() == MarkerKind::Required,
            remove: marker.is_remove(),
            default: marker.default_value().clone(),
            msg: marker.msg().map(str::to_string),
            marker: Some(marker.id()),
        })
    }

    fn literal(&self) -> Option<&Value> {
        match &self.pattern {
            KeyPattern::Literal(value) => Some(value),
            KeyPattern::Validator(_) => None,
        }
    }

    /// The path segment naming this key when it is missing.
    fn missing_segment(&self) -> PathSegment {
        match self.literal() {
            Some(key) => PathSegment::Key(key.clone()),
            None => PathSegment::Key(Value::Str(self.label.clone())),
        }
    }
}

/// Containers, object shapes and override messages cannot name a key.
fn check_key_shape(key: &RawSchema) -> Result<(), SchemaError> {
    match key {
        RawSchema::Mapping(_)
        | RawSchema::List(_)
        | RawSchema::Tuple(_)
        | RawSchema::Set(_)
        | RawSchema::Object(_)
        | RawSchema::Msg(_) => Err(SchemaError::new(format!(
            "{key} cannot be used as a mapping key"
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupRule {
    Exclusive,
    Inclusive,
}

#[derive(Debug)]
struct KeyGroup {
    name: String,
    rule: GroupRule,
    members: Vec<MarkerId>,
    msg: Option<String>,
}

impl KeyGroup {
    fn check(&self, present: &HashSet<MarkerId>) -> Option<Invalid> {
        let count = self.members.iter().filter(|id| present.contains(id)).count();
        let (violated, kind, standard) = match self.rule {
            GroupRule::Exclusive => (
                count >= 2,
                ErrorKind::Exclusive,
                format!("two or more values in the same group of exclusion '{}'", self.name),
            ),
            GroupRule::Inclusive => (
                count > 0 && count < self.members.len(),
                ErrorKind::Inclusive,
                format!("some but not all values in the same group of inclusion '{}'", self.name),
            ),
        };
        violated.then(|| {
            Invalid::new(kind, self.msg.clone().unwrap_or(standard))
                .with_path(Path::from(vec![PathSegment::Group(self.name.clone())]))
        })
    }
}

/// Partition Exclusive/Inclusive markers by group name, in declaration order.
fn collect_groups(entries: &[(RawSchema, RawSchema)]) -> Vec<KeyGroup> {
    let mut groups: Vec<KeyGroup> = Vec::new();
    for (key, _) in entries {
        let RawSchema::Marker(marker) = key else {
            continue;
        };
        let (rule, name) = match marker.kind() {
            MarkerKind::Exclusive { group } => (GroupRule::Exclusive, group),
            MarkerKind::Inclusive { group } => (GroupRule::Inclusive, group),
            _ => continue,
        };
        match groups.iter_mut().find(|g| g.rule == rule && g.name == *name) {
            Some(group) => {
                group.members.push(marker.id());
                if group.msg.is_none() {
                    group.msg = marker.msg().map(str::to_string);
                }
            }
            None => groups.push(KeyGroup {
                name: name.clone(),
                rule,
                members: vec![marker.id()],
                msg: marker.msg().map(str::to_string),
            }),
        }
    }
    groups
}

/// Compiled mapping schema.
#[derive(Debug)]
pub(crate) struct MappingNode {
    /// Match-priority order.
    candidates: Vec<KeyCandidate>,
    /// Candidate indices in declaration order.
    declared_order: Vec<usize>,
    literal_index: HashMap<Value, usize>,
    groups: Vec<KeyGroup>,
    extra: ExtraPolicy,
    key_matching: KeyMatching,
}

impl MappingNode {
    pub(crate) fn compile(
        entries: &[(RawSchema, RawSchema)],
        options: &SchemaOptions,
    ) -> Result<Self, SchemaError> {
        let mut candidates = Vec::with_capacity(entries.len());
        for (declared, (key, value)) in entries.iter().enumerate() {
            if entries[..declared].iter().any(|(earlier, _)| earlier == key) {
                return Err(SchemaError::new(format!("duplicate mapping key {key}")));
            }
            candidates.push(KeyCandidate::compile(declared, key, value, options)?);
        }
        candidates.sort_by_key(|c| c.priority);

        let mut declared_order: Vec<usize> = (0..candidates.len()).collect();
        declared_order.sort_by_key(|&i| candidates[i].declared);

        let literal_index = candidates
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.literal().map(|key| (key.clone(), i)))
            .collect();

        Ok(Self {
            candidates,
            declared_order,
            literal_index,
            groups: collect_groups(entries),
            extra: options.extra,
            key_matching: options.key_matching,
        })
    }

    /// Resolve an input key to a candidate index and the output key.
    fn resolve(&self, key: &Value) -> Option<(usize, Value)> {
        if let Some(&index) = self.literal_index.get(key) {
            return Some((index, key.clone()));
        }
        if self.key_matching == KeyMatching::CaseInsensitive {
            if let Value::Str(text) = key {
                let folded = text.to_lowercase();
                let hit = self.candidates.iter().position(|c| {
                    matches!(c.literal(), Some(Value::Str(s)) if s.to_lowercase() == folded)
                });
                if let Some(index) = hit {
                    return Some((index, key.clone()));
                }
            }
        }
        self.candidates
            .iter()
            .enumerate()
            .find_map(|(index, c)| match &c.pattern {
                KeyPattern::Validator(node) => node.validate(key).ok().map(|out| (index, out)),
                KeyPattern::Literal(_) => None,
            })
    }

    pub(crate) fn validate(&self, data: &Value) -> ValidationResult {
        let Value::Map(input) = data else {
            return Err(Invalid::new(ErrorKind::Dict, "expected a dictionary").into());
        };

        let mut out = ValueMap::with_capacity(input.len());
        let mut errors = MultipleInvalid::default();
        let mut matched = vec![false; self.candidates.len()];

        for (key, value) in input.iter() {
            let Some((index, out_key)) = self.resolve(key) else {
                match self.extra {
                    ExtraPolicy::Prevent => errors.push(
                        Invalid::extra_key()
                            .with_path(Path::from(vec![PathSegment::Key(key.clone())])),
                    ),
                    ExtraPolicy::Allow => {
                        out.insert(key.clone(), value.clone());
                    }
                    ExtraPolicy::Remove => tracing::trace!(%key, "dropping extra key"),
                }
                continue;
            };

            matched[index] = true;
            let candidate = &self.candidates[index];
            if candidate.remove {
                tracing::trace!(%key, "removing marked key");
                continue;
            }
            match candidate.value.validate(value) {
                Ok(validated) => {
                    out.insert(out_key, validated);
                }
                Err(failed) => errors.merge(failed.prefixed(PathSegment::Key(key.clone()))),
            }
        }

        for &index in &self.declared_order {
            let candidate = &self.candidates[index];
            if matched[index] || candidate.remove {
                continue;
            }
            if let (Some(key), Some(default)) = (candidate.literal(), candidate.default.materialize()) {
                tracing::trace!(%key, "inserting default");
                match candidate.value.validate(&default) {
                    Ok(validated) => {
                        out.insert(key.clone(), validated);
                    }
                    Err(failed) => errors.merge(failed.prefixed(PathSegment::Key(key.clone()))),
                }
            } else if candidate.required {
                let message = candidate
                    .msg
                    .clone()
                    .unwrap_or_else(|| "required key not provided".to_string());
                errors.push(
                    Invalid::new(ErrorKind::RequiredField, message)
                        .with_path(Path::from(vec![candidate.missing_segment()])),
                );
            }
        }

        let present: HashSet<MarkerId> = self
            .candidates
            .iter()
            .zip(&matched)
            .filter_map(|(c, &hit)| if hit { c.marker } else { None })
            .collect();
        errors.extend(self.groups.iter().filter_map(|g| g.check(&present)));

        if errors.is_empty() {
            Ok(Value::Map(out))
        } else {
            Err(errors)
        }
    }
}
