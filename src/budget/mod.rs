//! Byte-size budgets for rendered documents
//!
//! Budgets are advisory: an oversized document is still published and only
//! produces a [`BudgetWarning`].

use serde::Serialize;
use std::fmt;

use crate::config::BudgetConfig;
use crate::generator::BuildOutput;

/// What a document is, for budget purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Home page and its pagination pages
    Index,
    /// Posts and static pages
    Article,
    /// Category listings
    Other,
}

impl PageKind {
    /// Byte limit for this kind
    pub fn limit(self, budget: &BudgetConfig) -> usize {
        match self {
            Self::Index => budget.index,
            Self::Article => budget.article,
            Self::Other => budget.other,
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Index => "index",
            Self::Article => "article",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// A document that exceeds its kind's limit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetWarning {
    pub kind: PageKind,
    /// Display name of the document
    pub name: String,
    /// Output-relative path
    pub path: String,
    /// Size in bytes
    pub size: usize,
    pub limit: usize,
}

impl fmt::Display for BudgetWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} page \"{}\" ({}) is {} bytes, over the {} byte budget by {}",
            self.kind,
            self.name,
            self.path,
            self.size,
            self.limit,
            self.size.saturating_sub(self.limit)
        )
    }
}

/// Check one document against the budget
pub fn check(
    kind: PageKind,
    name: &str,
    path: &str,
    html: &str,
    budget: &BudgetConfig,
) -> Option<BudgetWarning> {
    let size = html.len();
    let limit = kind.limit(budget);
    (size > limit).then(|| BudgetWarning {
        kind,
        name: name.to_string(),
        path: path.to_string(),
        size,
        limit,
    })
}

/// Check every document of a build, logging each overrun
pub fn validate(output: &BuildOutput, budget: &BudgetConfig) -> Vec<BudgetWarning> {
    let warnings: Vec<BudgetWarning> = output
        .documents
        .iter()
        .filter_map(|(path, doc)| check(doc.kind, &doc.name, path, &doc.html, budget))
        .collect();

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }
    warnings
}
