//! Modification expressions and resolution. A caller-supplied
//! [`ModifyRequest`] is an ordered list of raw `(key, value)` directive
//! pairs where the key's single-character prefix selects the semantic: no
//! prefix replaces, `+` adds values, `-` removes values, and an unprefixed
//! empty or null value purges the attribute. The request is parsed exactly
//! once at the boundary into the typed [`Modify`] union; everything
//! downstream works by exhaustive matching, never by re-inspecting strings.
//!
//! A [`ModifyList`] carries a validity state. Lists enter as
//! `ModifyList<ModifyInvalid>` and only [`validate`](ModifyList::validate)
//! can produce a `ModifyList<ModifyValid>`, so a list that has not been
//! checked against the schema cannot reach an apply path.

use std::collections::BTreeSet;
use std::slice;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::prelude::*;
use crate::schema::SchemaTransaction;

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct ModifyValid;
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct ModifyInvalid;

/// One typed, tagged mutation of a single attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modify {
    /// The attribute's values *should become* exactly this set.
    Replaced(Attribute, Vec<String>),
    /// These values *should be added* to the attribute.
    Added(Attribute, Vec<String>),
    /// These values *should be removed* from the attribute.
    Removed(Attribute, Vec<String>),
    /// The attribute *should not exist* afterwards.
    Purged(Attribute),
}

pub fn m_replace(attr: Attribute, values: &[&str]) -> Modify {
    Modify::Replaced(attr, values.iter().map(|v| v.to_string()).collect())
}

pub fn m_add(attr: Attribute, values: &[&str]) -> Modify {
    Modify::Added(attr, values.iter().map(|v| v.to_string()).collect())
}

pub fn m_remove(attr: Attribute, values: &[&str]) -> Modify {
    Modify::Removed(attr, values.iter().map(|v| v.to_string()).collect())
}

pub fn m_purge(attr: Attribute) -> Modify {
    Modify::Purged(attr)
}

impl Modify {
    pub fn attribute(&self) -> &Attribute {
        match self {
            Modify::Replaced(attr, _)
            | Modify::Added(attr, _)
            | Modify::Removed(attr, _)
            | Modify::Purged(attr) => attr,
        }
    }
}

/// What a batch means for one single-valued attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SingleValueMod {
    Setting(String),
    Unsetting,
}

/// What a batch means for one multi-valued attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultiValueMod {
    Adding(Vec<String>),
    Removing(Vec<String>),
    Replacing(Vec<String>),
    Deleting,
}

#[derive(Clone, Debug, Default)]
pub struct ModifyList<VALID> {
    // This is never read, it's just used for state machine enforcement.
    #[allow(dead_code)]
    valid: VALID,
    // The order of this list matters, it is the order of the request.
    mods: Vec<Modify>,
}

impl<'a> IntoIterator for &'a ModifyList<ModifyValid> {
    type IntoIter = slice::Iter<'a, Modify>;
    type Item = &'a Modify;

    fn into_iter(self) -> Self::IntoIter {
        self.mods.iter()
    }
}

// Directive kinds as they appear on the wire, before purge forms are
// recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawKind {
    Replace,
    Add,
    Remove,
}

struct RawGroup {
    kind: RawKind,
    attr: Attribute,
    values: Vec<String>,
}

fn parse_key(key: &str) -> Result<(RawKind, Attribute), OperationError> {
    let (kind, name) = match key.strip_prefix('+') {
        Some(rest) => (RawKind::Add, rest),
        None => match key.strip_prefix('-') {
            Some(rest) => (RawKind::Remove, rest),
            None => (RawKind::Replace, key),
        },
    };
    if name.is_empty() {
        return Err(OperationError::InvalidRequest(format!(
            "directive key {:?} names no attribute",
            key
        )));
    }
    Ok((kind, Attribute::from(name)))
}

impl ModifyList<ModifyInvalid> {
    pub fn new() -> Self {
        ModifyList {
            valid: ModifyInvalid,
            mods: Vec::with_capacity(0),
        }
    }

    pub fn new_list(mods: Vec<Modify>) -> Self {
        ModifyList {
            valid: ModifyInvalid,
            mods,
        }
    }

    pub fn push_mod(&mut self, modify: Modify) {
        self.mods.push(modify)
    }

    /// Parse a raw request into typed mutations. Pairs group per
    /// (prefix, attribute) and accumulate values in order; null and empty
    /// values contribute nothing. An unprefixed group left with no values
    /// is a purge. Two distinct directive kinds of replace, add, and remove
    /// for one attribute reject the whole request before anything else
    /// happens. A purge coexisting with other directives is not a
    /// contradiction, it simply wins at resolution.
    pub fn from_request(req: &ModifyRequest) -> Result<Self, OperationError> {
        let mut groups: Vec<RawGroup> = Vec::with_capacity(req.len());

        for (key, value) in req.iter() {
            let (kind, attr) = parse_key(key)?;
            let idx = match groups.iter().position(|g| g.kind == kind && g.attr == attr) {
                Some(idx) => idx,
                None => {
                    groups.push(RawGroup {
                        kind,
                        attr,
                        values: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            if let Some(v) = value {
                if !v.is_empty() {
                    groups[idx].values.push(v.clone());
                }
            }
        }

        let mods: Vec<Modify> = groups
            .into_iter()
            .map(|g| match g.kind {
                RawKind::Replace if g.values.is_empty() => Modify::Purged(g.attr),
                RawKind::Replace => Modify::Replaced(g.attr, g.values),
                RawKind::Add => Modify::Added(g.attr, g.values),
                RawKind::Remove => Modify::Removed(g.attr, g.values),
            })
            .collect();

        for m in mods.iter() {
            if matches!(m, Modify::Purged(_)) {
                continue;
            }
            let contradiction = mods.iter().any(|other| {
                other.attribute() == m.attribute()
                    && !matches!(other, Modify::Purged(_))
                    && std::mem::discriminant(other) != std::mem::discriminant(m)
            });
            if contradiction {
                return Err(OperationError::InvalidRequest(format!(
                    "contradictory directives for attribute {}",
                    m.attribute()
                )));
            }
        }

        Ok(ModifyList {
            valid: ModifyInvalid,
            mods,
        })
    }

    /// Check every mutation against the schema, promoting the list to the
    /// valid state. `check_immutable` is false for internal rewrites that
    /// are allowed to touch immutable attributes.
    pub fn validate(
        &self,
        schema: &dyn SchemaTransaction,
        check_immutable: bool,
    ) -> Result<ModifyList<ModifyValid>, SchemaError> {
        let schema_attributes = schema.get_attributes();

        self.mods.iter().try_for_each(|m| {
            let schema_a = schema_attributes
                .get(m.attribute())
                .ok_or_else(|| SchemaError::AttributeNotFound(m.attribute().to_string()))?;
            match m {
                Modify::Replaced(_, values)
                | Modify::Added(_, values)
                | Modify::Removed(_, values) => {
                    schema_a.validate_ava(Some(values), check_immutable)
                }
                Modify::Purged(_) => schema_a.validate_ava(None, check_immutable),
            }
        })?;

        Ok(ModifyList {
            valid: ModifyValid,
            mods: self.mods.clone(),
        })
    }
}

impl ModifyList<ModifyValid> {
    pub fn iter(&self) -> slice::Iter<'_, Modify> {
        self.mods.iter()
    }
}

impl<VALID> ModifyList<VALID> {
    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The set of attributes this list touches.
    pub fn modified_attrs(&self) -> BTreeSet<Attribute> {
        self.mods.iter().map(|m| m.attribute().clone()).collect()
    }

    /// What this list means for a single-valued attribute. `None` when the
    /// attribute is untouched. Any remove or purge anywhere in the list is
    /// an unset.
    pub fn single_value_mod(
        &self,
        attr: &Attribute,
    ) -> Result<Option<SingleValueMod>, OperationError> {
        let relevant: Vec<&Modify> = self.mods.iter().filter(|m| m.attribute() == attr).collect();
        if relevant.is_empty() {
            return Ok(None);
        }
        if relevant
            .iter()
            .any(|m| matches!(m, Modify::Removed(..) | Modify::Purged(_)))
        {
            return Ok(Some(SingleValueMod::Unsetting));
        }
        let values = relevant.iter().find_map(|m| match m {
            Modify::Replaced(_, values) | Modify::Added(_, values) => Some(values),
            _ => None,
        });
        match values.map(|vs| vs.as_slice()) {
            None => Ok(None),
            Some([]) => Ok(Some(SingleValueMod::Unsetting)),
            Some([v]) => Ok(Some(SingleValueMod::Setting(v.clone()))),
            Some(_) => Err(OperationError::InvalidRequest(format!(
                "single-valued attribute {} given multiple values",
                attr
            ))),
        }
    }

    /// What this list means for a multi-valued attribute. A purge wins over
    /// every other directive for the same attribute.
    pub fn multi_value_mod(&self, attr: &Attribute) -> Option<MultiValueMod> {
        let relevant: Vec<&Modify> = self.mods.iter().filter(|m| m.attribute() == attr).collect();
        if relevant.iter().any(|m| matches!(m, Modify::Purged(_))) {
            return Some(MultiValueMod::Deleting);
        }
        for m in relevant.iter() {
            if let Modify::Replaced(_, values) = m {
                return Some(MultiValueMod::Replacing(values.clone()));
            }
        }
        for m in relevant.iter() {
            if let Modify::Added(_, values) = m {
                return Some(MultiValueMod::Adding(values.clone()));
            }
        }
        for m in relevant.iter() {
            if let Modify::Removed(_, values) = m {
                return Some(MultiValueMod::Removing(values.clone()));
            }
        }
        None
    }

    /// Enforce the safeguarded replacement policy: replacing every value of
    /// a safeguarded multi-valued attribute with a single value rejects the
    /// whole batch, unless the batch carries multiple values or the config
    /// allows it.
    pub fn check_safeguards(
        &self,
        config: &EngineConfig,
        schema: &dyn SchemaTransaction,
    ) -> Result<(), OperationError> {
        if config.allow_multivalued_replacement {
            return Ok(());
        }
        for m in self.mods.iter() {
            if let Modify::Replaced(attr, values) = m {
                let multivalue = schema
                    .get_attribute(attr)
                    .map(|sa| sa.multivalue)
                    .unwrap_or(false);
                if multivalue && config.is_safeguarded(attr) && values.len() == 1 {
                    return Err(OperationError::InvalidRequest(format!(
                        "replacing all values of {} with a single value",
                        attr
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The value set an attribute would hold after this mutation applies. With
/// no entry (a creation) the current set is empty.
pub fn new_values_to_be(
    mutation: Option<&MultiValueMod>,
    entry: Option<&Entry>,
    attr: &Attribute,
) -> BTreeSet<String> {
    let current = entry.map(|e| e.get_ava_set(attr)).unwrap_or_default();
    match mutation {
        None => current,
        Some(MultiValueMod::Adding(values)) => {
            let mut next = current;
            next.extend(values.iter().cloned());
            next
        }
        Some(MultiValueMod::Removing(values)) => {
            let mut next = current;
            for v in values {
                next.remove(v);
            }
            next
        }
        Some(MultiValueMod::Replacing(values)) => values.iter().cloned().collect(),
        Some(MultiValueMod::Deleting) => BTreeSet::new(),
    }
}
