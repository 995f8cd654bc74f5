// Google-style docstring sections
//
// Headers are matched case-insensitively at the start of a trimmed line:
// `Args:`, `Returns:`, `Raises:` and anything starting with `Example`.
// The section in progress is flushed whenever the next header starts.

use crate::parser::python::clean_docstring;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Description,
    Args,
    Returns,
    Raises,
    Examples,
}

impl Section {
    fn from_header(line: &str) -> Option<Self> {
        let lower = line.to_lowercase();
        if lower.starts_with("args:") {
            Some(Section::Args)
        } else if lower.starts_with("returns:") {
            Some(Section::Returns)
        } else if lower.starts_with("raises:") {
            Some(Section::Raises)
        } else if lower.starts_with("example") {
            Some(Section::Examples)
        } else {
            None
        }
    }
}

/// Sections of a structured docstring
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocSections {
    pub description: String,
    /// Argument name to description, in docstring order
    pub args: Vec<(String, String)>,
    pub returns: String,
    /// Exception name to description, in docstring order
    pub raises: Vec<(String, String)>,
    pub examples: String,
}

impl DocSections {
    pub fn parse(docstring: &str) -> Self {
        let mut sections = DocSections::default();
        let mut current = Section::Description;
        let mut content: Vec<&str> = Vec::new();

        for line in docstring.lines() {
            let trimmed = line.trim();
            match Section::from_header(trimmed) {
                Some(next) => {
                    sections.flush(current, &content);
                    current = next;
                    content.clear();
                    // text after the header colon belongs to the section
                    if let Some((_, rest)) = trimmed.split_once(':') {
                        if !rest.trim().is_empty() {
                            content.push(rest);
                        }
                    }
                }
                None => content.push(line),
            }
        }
        sections.flush(current, &content);

        sections
    }

    fn flush(&mut self, section: Section, lines: &[&str]) {
        match section {
            Section::Description => self.description = join_trimmed(lines),
            Section::Returns => self.returns = join_trimmed(lines),
            Section::Args => self.args = parse_entries(lines),
            Section::Raises => self.raises = parse_entries(lines),
            Section::Examples => self.examples = clean_docstring(&lines.join("\n")),
        }
    }

    /// Description of one argument, if documented
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, desc)| desc.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_empty()
            && self.args.is_empty()
            && self.returns.is_empty()
            && self.raises.is_empty()
            && self.examples.is_empty()
    }
}

fn join_trimmed(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// `name: desc` entries; lines without a colon continue the previous entry
fn parse_entries(lines: &[&str]) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = Vec::new();

    for line in lines.iter().map(|l| l.trim()) {
        if let Some((key, desc)) = line.split_once(':') {
            // `name (int)` -> `name`
            let name = key.split('(').next().unwrap_or(key).trim().to_string();
            let desc = desc.trim().to_string();
            match entries.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 = desc,
                None => entries.push((name, desc)),
            }
        } else if !line.is_empty() {
            if let Some((_, desc)) = entries.last_mut() {
                if !desc.is_empty() {
                    desc.push(' ');
                }
                desc.push_str(line);
            }
        }
    }

    entries
}
