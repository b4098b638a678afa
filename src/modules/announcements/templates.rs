use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::warn;

/// Read-only store of announcement bodies, loaded from a flat text file.
/// Blocks are separated by `===` lines, the first line of a block is the
/// announcement name, the rest is the body. Lookup is case-insensitive.
#[derive(Debug)]
pub(crate) struct TemplateStore {
    entries: Vec<(String, String)>,
}

impl TemplateStore {
    pub(crate) fn load(path: impl AsRef<Path>) -> Self {
        match fs::read_to_string(path.as_ref()) {
            Ok(content) => Self::parse(&content),
            Err(err) => {
                warn!(
                    "couldn't read announcement templates from {}: {}",
                    path.as_ref().display(),
                    err
                );
                Self {
                    entries: Vec::new(),
                }
            }
        }
    }

    pub(crate) fn parse(content: &str) -> Self {
        let mut entries = Vec::new();
        for block in content.split("===") {
            let mut lines = block.trim().lines();
            let Some(name) = lines.next() else { continue };
            let name = name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            entries.push((name, lines.collect::<Vec<_>>().join("\n")));
        }
        Self { entries }
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, body)| body.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("template references {{{placeholder}}} but no substitution was provided")]
pub(crate) struct MissingPlaceholder {
    pub(crate) placeholder: String,
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder regex is valid"))
}

/// Replace every `{NAME}` placeholder with its substitution. A referenced
/// placeholder with no substitution fails the whole render.
pub(crate) fn render(
    template: &str,
    substitutions: &HashMap<String, String>,
) -> Result<String, MissingPlaceholder> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in placeholder_re().captures_iter(template) {
        let whole = caps.get(0).expect("capture 0 is the whole match");
        let key = &caps[1];
        let Some(value) = substitutions.get(key) else {
            return Err(MissingPlaceholder {
                placeholder: key.to_owned(),
            });
        };
        out.push_str(&template[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}
