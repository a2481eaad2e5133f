//! Include strings and the loaders that resolve them.
//!
//! An include string names one or more files joined by `+` (override) or `|`
//! (augment), each optionally selecting a map and an explicit group:
//!
//! ```text
//! pc+us(intl):2|extra
//! ```
//!
//! Resolving a directive to a statement tree is the job of an [`IncludeLoader`].

use super::ast::{IncludeDirective, IncludeStmt, MergeMode, XkbFile};
use super::context::Context;
use super::error::LoadError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<file>[^():|+]+)(?:\((?P<map>[^()]+)\))?(?::(?P<modifier>[^():|+]+))?$")
        .expect("include directive pattern is valid")
});

impl IncludeStmt {
    /// Split an include string into its directives.
    ///
    /// The first directive takes `merge`; later ones take the mode of the separator
    /// that precedes them.
    pub fn parse(merge: MergeMode, text: &str) -> Result<Self, String> {
        let mut directives = Vec::new();
        let mut pending = merge;
        let mut start = 0;

        for (pos, ch) in text.char_indices().chain(std::iter::once((text.len(), '+'))) {
            if ch != '+' && ch != '|' {
                continue;
            }
            let segment = text[start..pos].trim();
            let caps = DIRECTIVE
                .captures(segment)
                .ok_or_else(|| format!("malformed include directive \"{}\" in \"{}\"", segment, text))?;
            directives.push(IncludeDirective {
                merge: pending,
                file: caps["file"].trim().to_string(),
                map: caps.name("map").map(|m| m.as_str().trim().to_string()),
                modifier: caps.name("modifier").map(|m| m.as_str().trim().to_string()),
            });
            pending = if ch == '|' {
                MergeMode::Augment
            } else {
                MergeMode::Override
            };
            start = pos + ch.len_utf8();
        }

        Ok(IncludeStmt {
            merge,
            text: text.to_string(),
            directives,
        })
    }
}

/// Resolves an include directive to the statement tree of one map.
pub trait IncludeLoader {
    fn load(&mut self, ctx: &mut Context, file: &str, map: Option<&str>)
        -> Result<XkbFile, LoadError>;
}

/// Pick the map an include refers to: the named one, else the one flagged default,
/// else the first (with a warning when there was a choice to make).
pub fn choose_map(
    ctx: &mut Context,
    file: &str,
    maps: &[XkbFile],
    map: Option<&str>,
) -> Result<XkbFile, LoadError> {
    let chosen = match map {
        Some(name) => maps
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| LoadError::NoSuchMap {
                file: file.to_string(),
                map: name.to_string(),
            })?,
        None => {
            let first = maps.first().ok_or_else(|| LoadError::Empty(file.to_string()))?;
            if maps.len() > 1 {
                match maps.iter().find(|m| m.default) {
                    Some(default) => default,
                    None => {
                        ctx.warn(format!(
                            "No map in include statement, but \"{}\" contains several; \
                             Using first defined map, \"{}\"",
                            file, first.name
                        ));
                        first
                    }
                }
            } else {
                first
            }
        }
    };

    let mut chosen = chosen.clone();
    chosen.id = ctx.next_file_id();
    Ok(chosen)
}

/// Loader over maps registered in memory, keyed by file name.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: HashMap<String, Vec<XkbFile>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `map` as one of the maps of `file`.
    pub fn add_map(&mut self, file: &str, map: XkbFile) -> &mut Self {
        self.files.entry(file.to_string()).or_default().push(map);
        self
    }

    pub fn with_map(mut self, file: &str, map: XkbFile) -> Self {
        self.add_map(file, map);
        self
    }
}

impl IncludeLoader for MemoryLoader {
    fn load(
        &mut self,
        ctx: &mut Context,
        file: &str,
        map: Option<&str>,
    ) -> Result<XkbFile, LoadError> {
        let maps = self
            .files
            .get(file)
            .ok_or_else(|| LoadError::NotFound(file.to_string()))?;
        choose_map(ctx, file, maps, map)
    }
}

/// Loader reading `<root>/symbols/<file>.{yaml,yml,json}` from a list of roots.
#[derive(Debug, Default, Clone)]
pub struct DirectoryLoader {
    roots: Vec<PathBuf>,
}

impl DirectoryLoader {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    fn find(&self, file: &str) -> Option<PathBuf> {
        const EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];
        self.roots.iter().find_map(|root| {
            EXTENSIONS
                .iter()
                .map(|ext| root.join("symbols").join(format!("{}.{}", file, ext)))
                .find(|candidate| candidate.is_file())
        })
    }
}

impl IncludeLoader for DirectoryLoader {
    fn load(
        &mut self,
        ctx: &mut Context,
        file: &str,
        map: Option<&str>,
    ) -> Result<XkbFile, LoadError> {
        let path = self
            .find(file)
            .ok_or_else(|| LoadError::NotFound(file.to_string()))?;
        let maps = read_source_file(&path)?;
        choose_map(ctx, file, &maps, map)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SourceFile {
    Many(Vec<XkbFile>),
    One(XkbFile),
}

/// Read every map of a YAML or JSON statement file.
pub fn read_source_file(path: &Path) -> Result<Vec<XkbFile>, LoadError> {
    let display = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;

    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let parsed: SourceFile = if is_json {
        serde_json::from_str(&text).map_err(|e| LoadError::Parse {
            path: display.clone(),
            message: e.to_string(),
        })?
    } else {
        serde_yaml::from_str(&text).map_err(|e| LoadError::Parse {
            path: display.clone(),
            message: e.to_string(),
        })?
    };

    Ok(match parsed {
        SourceFile::Many(maps) => maps,
        SourceFile::One(map) => vec![map],
    })
}
