//! Dependency requirement value objects
//!
//! A `Requirement` is one declared dependency: a normalized package name and
//! the version constraint attached to it. Python names follow PEP 503
//! normalization; npm names are kept verbatim.

use std::fmt;

/// Normalized package name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName(String);

impl PackageName {
    /// PEP 503: lowercase, runs of `-`, `_`, `.` collapse to a single `-`
    pub fn python(raw: &str) -> Self {
        let mut out = String::with_capacity(raw.len());
        let mut in_separator = false;
        for ch in raw.trim().chars() {
            if matches!(ch, '-' | '_' | '.') {
                if !in_separator {
                    out.push('-');
                }
                in_separator = true;
            } else {
                out.extend(ch.to_lowercase());
                in_separator = false;
            }
        }
        Self(out)
    }

    /// npm names are case-sensitive and already canonical
    pub fn npm(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A declared dependency
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Requirement {
    name: PackageName,
    extras: Vec<String>,
    specifier: String,
    marker: Option<String>,
    raw: String,
}

impl Requirement {
    /// Parse a PEP 508 requirement string such as
    /// `uvicorn[standard]>=0.30 ; python_version >= "3.10"`.
    ///
    /// Returns `None` when no package name can be read.
    pub fn parse_pep508(raw: &str) -> Option<Self> {
        let (body, marker) = match raw.split_once(';') {
            Some((body, marker)) => (body, Some(marker.trim().to_string())),
            None => (raw, None),
        };
        let body = body.trim();
        let name_end = body
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .unwrap_or(body.len());
        if name_end == 0 {
            return None;
        }
        let name = PackageName::python(&body[..name_end]);
        let mut rest = body[name_end..].trim_start();

        let mut extras = Vec::new();
        if let Some(stripped) = rest.strip_prefix('[') {
            let close = stripped.find(']')?;
            extras = stripped[..close]
                .split(',')
                .map(|e| PackageName::python(e).as_str().to_string())
                .filter(|e| !e.is_empty())
                .collect();
            extras.sort();
            rest = stripped[close + 1..].trim_start();
        }

        let specifier = canonical_specifier(rest.trim_start_matches('(').trim_end_matches(')'));

        Some(Self {
            name,
            extras,
            specifier,
            marker: marker.filter(|m| !m.is_empty()),
            raw: raw.trim().to_string(),
        })
    }

    /// npm dependency entry, e.g. `"react": "^18.2.0"`
    pub fn npm(name: &str, range: &str) -> Self {
        Self {
            name: PackageName::npm(name),
            extras: Vec::new(),
            specifier: range.trim().to_string(),
            marker: None,
            raw: format!("{}@{}", name.trim(), range.trim()),
        }
    }

    /// Build from already-separated parts (uv.lock `requires-dist` tables)
    pub fn from_parts(
        name: &str,
        extras: Vec<String>,
        specifier: Option<&str>,
        marker: Option<&str>,
    ) -> Self {
        let name = PackageName::python(name);
        let mut extras: Vec<String> = extras
            .iter()
            .map(|e| PackageName::python(e).as_str().to_string())
            .collect();
        extras.sort();
        let specifier = canonical_specifier(specifier.unwrap_or(""));
        let raw = format!("{}{}", name, specifier);
        Self {
            name,
            extras,
            specifier,
            marker: marker.map(str::trim).filter(|m| !m.is_empty()).map(String::from),
            raw,
        }
    }

    pub fn name(&self) -> &PackageName {
        &self.name
    }

    pub fn extras(&self) -> &[String] {
        &self.extras
    }

    pub fn specifier(&self) -> &str {
        &self.specifier
    }

    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    /// Requirement exactly as written in the manifest
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Key used to compare a manifest against a lock snapshot
    pub fn fingerprint(&self) -> String {
        let mut key = self.name.as_str().to_string();
        if !self.extras.is_empty() {
            key.push('[');
            key.push_str(&self.extras.join(","));
            key.push(']');
        }
        key.push_str(&self.specifier);
        key
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Remove whitespace and sort comma-separated clauses so `>=1, <2` equals `<2,>=1`
fn canonical_specifier(raw: &str) -> String {
    let mut clauses: Vec<String> = raw
        .split(',')
        .map(|c| c.chars().filter(|ch| !ch.is_whitespace()).collect::<String>())
        .filter(|c| !c.is_empty())
        .collect();
    clauses.sort();
    clauses.join(",")
}
