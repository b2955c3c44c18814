//! Single global portfolio loaded from a CSV of `Techstack,Links` rows.
//!
//! No per-user scoping: each row becomes one document keyed by its tech stack
//! and the lookup returns the `links` of the nearest rows.

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::retrieval::store::{Metadata, VectorRecord, VectorStore};
use crate::retrieval::user_index::collect_links;
use crate::retrieval::IndexError;

pub const DEFAULT_LEGACY_LIMIT: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioRow {
    pub techstack: String,
    pub links: String,
}

pub struct PortfolioIndex {
    store: Arc<dyn VectorStore>,
    collection: String,
    rows: Vec<PortfolioRow>,
}

impl PortfolioIndex {
    pub async fn from_csv_path(
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
        path: &Path,
    ) -> Result<Self, IndexError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| IndexError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            store,
            collection: collection.into(),
            rows: parse_portfolio_csv(&raw)?,
        })
    }

    pub fn rows(&self) -> &[PortfolioRow] {
        &self.rows
    }

    /// Indexes every row, but only into an empty collection. Returns rows added.
    pub async fn load(&self) -> Result<usize, IndexError> {
        if self.store.count(&self.collection).await? > 0 {
            info!("Legacy portfolio collection '{}' already populated", self.collection);
            return Ok(0);
        }

        let records: Vec<VectorRecord> = self
            .rows
            .iter()
            .map(|row| {
                let mut metadata = Metadata::new();
                metadata.insert("links".to_string(), row.links.clone());
                VectorRecord {
                    id: Uuid::new_v4().to_string(),
                    document: row.techstack.clone(),
                    metadata,
                }
            })
            .collect();

        let added = records.len();
        self.store.add(&self.collection, records).await?;
        info!("Loaded {added} legacy portfolio rows into '{}'", self.collection);
        Ok(added)
    }

    pub async fn query_links(&self, skills: &[String], limit: usize) -> Result<Vec<String>, IndexError> {
        if skills.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let groups = self
            .store
            .query(&self.collection, skills, None, limit)
            .await?;
        Ok(collect_links(&groups, "links"))
    }
}

/// Parses a CSV with a header naming `Techstack` and `Links` columns
/// (case-insensitive, any position). Quoted fields may contain commas, newlines
/// and doubled quotes. Rows with an empty tech stack or link are skipped.
pub fn parse_portfolio_csv(raw: &str) -> Result<Vec<PortfolioRow>, IndexError> {
    let mut records = split_csv(raw)?.into_iter();
    let header = records.next().ok_or_else(|| IndexError::Csv {
        line: 1,
        message: "missing header row".to_string(),
    })?;

    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| IndexError::Csv {
                line: 1,
                message: format!("missing '{name}' column"),
            })
    };
    let techstack_col = column("Techstack")?;
    let links_col = column("Links")?;

    Ok(records
        .filter_map(|fields| {
            let techstack = fields.get(techstack_col)?.trim().to_string();
            let links = fields.get(links_col)?.trim().to_string();
            (!techstack.is_empty() && !links.is_empty()).then_some(PortfolioRow { techstack, links })
        })
        .collect())
}

fn split_csv(raw: &str) -> Result<Vec<Vec<String>>, IndexError> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', true) => in_quotes = false,
            ('"', false) if field.is_empty() => in_quotes = true,
            (',', false) => row.push(std::mem::take(&mut field)),
            ('\r', false) => {}
            ('\n', false) => {
                line += 1;
                row.push(std::mem::take(&mut field));
                if row.iter().any(|f| !f.is_empty()) {
                    rows.push(std::mem::take(&mut row));
                } else {
                    row.clear();
                }
            }
            (c, _) => {
                if c == '\n' {
                    line += 1;
                }
                field.push(c);
            }
        }
    }

    if in_quotes {
        return Err(IndexError::Csv {
            line,
            message: "unterminated quoted field".to_string(),
        });
    }
    row.push(field);
    if row.iter().any(|f| !f.is_empty()) {
        rows.push(row);
    }
    Ok(rows)
}
