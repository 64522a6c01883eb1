//! Line-oriented project file.
//!
//! ```text
//! 3
//! Input/Output|Load Mesh|0|10|20|mesh.json|en|
//! Input/Output|Load 2D Polygons|1|10|80|polygons.json
//! Calculations|Compute Volume|2|200|50|H||0
//! 0|0|2|0
//! 1|0|2|1
//! ```
//!
//! The first line is the node count, then one `category|name|index|x|y|fields...`
//! record per node, then one `from|from_port|to|to_port` record per link.

use crate::error::PersistError;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub category: String,
    pub name: String,
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRecord {
    pub from: usize,
    pub from_port: usize,
    pub to: usize,
    pub to_port: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectDefinition {
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
}

fn parse_number<T: std::str::FromStr>(value: &str, line: usize, what: &str) -> Result<T, PersistError> {
    value.trim().parse().map_err(|_| PersistError::Malformed {
        line,
        message: format!("invalid {what} '{value}'"),
    })
}

impl ProjectDefinition {
    pub fn parse(text: &str) -> Result<Self, PersistError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
            .filter(|(_, l)| !l.trim().is_empty());

        let (line, first) = lines.next().ok_or(PersistError::Malformed {
            line: 1,
            message: "empty project file".to_string(),
        })?;
        let nb_nodes: usize = parse_number(first, line, "node count")?;

        let mut project = ProjectDefinition::default();
        for _ in 0..nb_nodes {
            let (line, content) = lines.next().ok_or(PersistError::Malformed {
                line: line + project.nodes.len() + 1,
                message: format!("expected {nb_nodes} node records"),
            })?;
            let parts: Vec<&str> = content.split('|').collect();
            if parts.len() < 5 {
                return Err(PersistError::Malformed {
                    line,
                    message: "a node record needs at least 5 fields".to_string(),
                });
            }
            project.nodes.push(NodeRecord {
                category: parts[0].to_string(),
                name: parts[1].to_string(),
                index: parse_number(parts[2], line, "node index")?,
                x: parse_number(parts[3], line, "abscissa")?,
                y: parse_number(parts[4], line, "ordinate")?,
                fields: parts[5..].iter().map(|s| s.to_string()).collect(),
            });
        }

        for (line, content) in lines {
            let parts: Vec<&str> = content.split('|').collect();
            let [from, from_port, to, to_port] = parts[..] else {
                return Err(PersistError::Malformed {
                    line,
                    message: "a link record needs 4 fields".to_string(),
                });
            };
            project.links.push(LinkRecord {
                from: parse_number(from, line, "node index")?,
                from_port: parse_number(from_port, line, "port")?,
                to: parse_number(to, line, "node index")?,
                to_port: parse_number(to_port, line, "port")?,
            });
        }
        Ok(project)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| PersistError::Io(format!("Cannot read '{}': {e}", path.display())))?;
        Self::parse(&content)
    }

    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistError> {
        let path = path.as_ref();
        fs::write(path, self.to_string())
            .map_err(|e| PersistError::Io(format!("Cannot write '{}': {e}", path.display())))
    }
}

impl fmt::Display for ProjectDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.nodes.len())?;
        for node in &self.nodes {
            write!(
                f,
                "{}|{}|{}|{}|{}",
                node.category, node.name, node.index, node.x, node.y
            )?;
            for field in &node.fields {
                write!(f, "|{field}")?;
            }
            writeln!(f)?;
        }
        for link in &self.links {
            writeln!(f, "{}|{}|{}|{}", link.from, link.from_port, link.to, link.to_port)?;
        }
        Ok(())
    }
}
