//! Typed widget settings.
//!
//! Each widget kind carries a fixed schema of settings. Leaves hold a value and
//! the default it started from; groups (`Line`, `Background`, ...) nest leaves
//! and are addressed with `/` separated paths such as `Line/color`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DocumentError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SettingValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            SettingValue::Bool(_) => "a boolean",
            SettingValue::Int(_) => "an integer",
            SettingValue::Float(_) => "a number",
            SettingValue::Text(_) => "text",
        }
    }

    /// Convert `self` to the type of `target`.
    ///
    /// Integers widen to floats and integral floats narrow to integers; any
    /// other change of type is refused.
    fn coerce_like(self, target: &SettingValue) -> Option<SettingValue> {
        match (target, self) {
            (SettingValue::Bool(_), value @ SettingValue::Bool(_)) => Some(value),
            (SettingValue::Int(_), value @ SettingValue::Int(_)) => Some(value),
            (SettingValue::Int(_), SettingValue::Float(f))
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 =>
            {
                Some(SettingValue::Int(f as i64))
            }
            (SettingValue::Float(_), value @ SettingValue::Float(_)) => Some(value),
            (SettingValue::Float(_), SettingValue::Int(i)) => Some(SettingValue::Float(i as f64)),
            (SettingValue::Text(_), value @ SettingValue::Text(_)) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(value) => write!(f, "{value}"),
            SettingValue::Int(value) => write!(f, "{value}"),
            SettingValue::Float(value) => write!(f, "{value}"),
            SettingValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Int(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

/// A `/` separated path to a setting within one widget.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SettingPath(Vec<String>);

impl SettingPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for SettingPath {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self> {
        let segments: Vec<String> = s
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            return Err(DocumentError::setting_not_found(s));
        }
        Ok(Self(segments))
    }
}

impl fmt::Display for SettingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    value: SettingValue,
    default: SettingValue,
}

impl Setting {
    pub fn new(default: SettingValue) -> Self {
        Self {
            value: default.clone(),
            default,
        }
    }

    pub fn value(&self) -> &SettingValue {
        &self.value
    }

    pub fn default_value(&self) -> &SettingValue {
        &self.default
    }

    pub fn is_default(&self) -> bool {
        self.value == self.default
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Leaf(Setting),
    Group(Settings),
}

/// An ordered collection of settings and setting groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    entries: Vec<(String, Entry)>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf with its default value.
    pub fn with(mut self, name: &str, default: impl Into<SettingValue>) -> Self {
        self.entries
            .push((name.to_string(), Entry::Leaf(Setting::new(default.into()))));
        self
    }

    pub fn with_group(mut self, name: &str, group: Settings) -> Self {
        self.entries.push((name.to_string(), Entry::Group(group)));
        self
    }

    fn find(&self, name: &str) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, entry)| entry)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|(entry, _)| entry == name)
            .map(|(_, entry)| entry)
    }

    pub fn get(&self, path: &SettingPath) -> Result<&Setting> {
        let (last, groups) = split_path(path)?;
        let mut current = self;
        for name in groups {
            match current.find(name) {
                Some(Entry::Group(group)) => current = group,
                _ => return Err(DocumentError::setting_not_found(path)),
            }
        }
        match current.find(last) {
            Some(Entry::Leaf(setting)) => Ok(setting),
            _ => Err(DocumentError::setting_not_found(path)),
        }
    }

    pub fn contains(&self, path: &SettingPath) -> bool {
        self.get(path).is_ok()
    }

    /// Assign a value, converting it to the setting's type.
    pub fn set(&mut self, path: &SettingPath, value: SettingValue) -> Result<()> {
        let (last, groups) = split_path(path)?;
        let mut current = self;
        for name in groups {
            current = match current.find_mut(name) {
                Some(Entry::Group(group)) => group,
                _ => return Err(DocumentError::setting_not_found(path)),
            };
        }
        let Some(Entry::Leaf(setting)) = current.find_mut(last) else {
            return Err(DocumentError::setting_not_found(path));
        };
        let found = value.to_string();
        let expected = setting.default.type_name();
        setting.value = value
            .coerce_like(&setting.default)
            .ok_or_else(|| DocumentError::SettingType {
                path: path.to_string(),
                expected,
                found,
            })?;
        Ok(())
    }

    /// Every leaf with its full path, groups expanded in place.
    pub fn leaves(&self) -> Vec<(SettingPath, &Setting)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leaves<'a>(
        &'a self,
        prefix: &mut Vec<String>,
        out: &mut Vec<(SettingPath, &'a Setting)>,
    ) {
        for (name, entry) in &self.entries {
            prefix.push(name.clone());
            match entry {
                Entry::Leaf(setting) => out.push((SettingPath(prefix.clone()), setting)),
                Entry::Group(group) => group.collect_leaves(prefix, out),
            }
            prefix.pop();
        }
    }

    /// Leaves whose value differs from the default.
    pub fn changed(&self) -> Vec<(SettingPath, &SettingValue)> {
        self.leaves()
            .into_iter()
            .filter(|(_, setting)| !setting.is_default())
            .map(|(path, setting)| (path, setting.value()))
            .collect()
    }

    /// Text value of a top-level leaf, or an empty string.
    pub(crate) fn text(&self, name: &str) -> String {
        match self.find(name) {
            Some(Entry::Leaf(setting)) => setting.value.to_string(),
            _ => String::new(),
        }
    }
}

fn split_path(path: &SettingPath) -> Result<(&str, &[String])> {
    match path.segments().split_last() {
        Some((last, groups)) => Ok((last.as_str(), groups)),
        None => Err(DocumentError::setting_not_found(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Settings {
        Settings::new()
            .with("label", "")
            .with("steps", 50i64)
            .with("angle", 0.0)
            .with_group("Line", Settings::new().with("color", "black").with("hide", false))
    }

    fn path(text: &str) -> SettingPath {
        text.parse().unwrap()
    }

    #[test]
    fn test_nested_lookup() {
        let settings = sample();
        assert_eq!(
            settings.get(&path("Line/color")).unwrap().value(),
            &SettingValue::from("black")
        );
        assert!(settings.get(&path("Line")).is_err());
        assert!(settings.get(&path("Line/width")).is_err());
    }

    #[test]
    fn test_numeric_conversion() {
        let mut settings = sample();
        settings.set(&path("steps"), SettingValue::Float(20.0)).unwrap();
        assert_eq!(settings.get(&path("steps")).unwrap().value(), &SettingValue::Int(20));
        settings.set(&path("angle"), SettingValue::Int(90)).unwrap();
        assert_eq!(settings.get(&path("angle")).unwrap().value(), &SettingValue::Float(90.0));
        assert!(matches!(
            settings.set(&path("steps"), SettingValue::Float(2.5)),
            Err(DocumentError::SettingType { .. })
        ));
        assert!(matches!(
            settings.set(&path("Line/hide"), SettingValue::from("yes")),
            Err(DocumentError::SettingType { .. })
        ));
    }

    #[test]
    fn test_changed_lists_only_non_defaults() {
        let mut settings = sample();
        assert!(settings.changed().is_empty());
        settings.set(&path("Line/color"), "red".into()).unwrap();
        let changed = settings.changed();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].0.to_string(), "Line/color");
        settings.set(&path("Line/color"), "black".into()).unwrap();
        assert!(settings.changed().is_empty());
    }
}
