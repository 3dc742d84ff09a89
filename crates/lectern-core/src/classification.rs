//! Tag and category classification nodes.
//!
//! Nodes form a self-referencing tree through `parent_id`. Trees are held as
//! flat collections keyed by id; parent links are never followed through
//! in-memory references. Every write runs a bounded ancestor walk
//! ([`validate_lineage`]) so a cycle or an over-deep chain is rejected before
//! it reaches storage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::access::Scoped;
use crate::defaults::CLASSIFICATION_PATH_SEPARATOR;
use crate::error::{Error, Result};
use crate::models::{AuditFields, ClientId, RecordId, UserId};

// =============================================================================
// ENUMS
// =============================================================================

/// Tags and categories are separate populations governed by the same rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationKind {
    Tag,
    Category,
}

impl fmt::Display for ClassificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag => write!(f, "tag"),
            Self::Category => write!(f, "category"),
        }
    }
}

/// Document population a classification applies to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationTarget {
    #[default]
    Reference,
    Auxiliary,
}

impl fmt::Display for ClassificationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Auxiliary => write!(f, "auxiliary"),
        }
    }
}

impl FromStr for ClassificationTarget {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reference" => Ok(Self::Reference),
            "auxiliary" => Ok(Self::Auxiliary),
            _ => Err(format!("Invalid classification target: {}", s)),
        }
    }
}

/// Industry or other top level grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationDomain {
    #[default]
    General,
    Finance,
    Insurance,
    Shipping,
}

// =============================================================================
// NODES
// =============================================================================

/// A persisted tag or category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationNode {
    pub id: RecordId,
    pub kind: ClassificationKind,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<RecordId>,
    pub target: ClassificationTarget,
    pub domain: ClassificationDomain,
    pub client_id: ClientId,
    pub audit: AuditFields,
}

impl ClassificationNode {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Render `"root -> ... -> name"`, following at most `max_depth` parents.
    pub fn path<'a, F>(&'a self, lookup: F, max_depth: usize) -> String
    where
        F: Fn(RecordId) -> Option<&'a ClassificationNode>,
    {
        let mut names = vec![self.name.as_str()];
        let mut parent = self.parent_id;
        while let Some(id) = parent {
            if names.len() > max_depth {
                break;
            }
            match lookup(id) {
                Some(node) => {
                    names.push(node.name.as_str());
                    parent = node.parent_id;
                }
                None => break,
            }
        }
        names.reverse();
        names.join(CLASSIFICATION_PATH_SEPARATOR)
    }
}

impl Scoped for ClassificationNode {
    fn owner_client(&self) -> ClientId {
        self.client_id
    }

    fn effective_user(&self) -> UserId {
        self.audit.effective_user
    }
}

/// Request for creating a tag or category.
#[derive(Debug, Clone)]
pub struct CreateClassificationRequest {
    pub kind: ClassificationKind,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<RecordId>,
    pub target: ClassificationTarget,
    pub domain: ClassificationDomain,
    pub client_id: ClientId,
    pub user_id: UserId,
    pub site: i64,
}

impl CreateClassificationRequest {
    pub fn new(kind: ClassificationKind, name: impl Into<String>, client_id: ClientId) -> Self {
        Self {
            kind,
            name: name.into(),
            description: None,
            parent_id: None,
            target: ClassificationTarget::default(),
            domain: ClassificationDomain::default(),
            client_id,
            user_id: 0,
            site: 0,
        }
    }

    pub fn with_parent(mut self, parent_id: RecordId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_target(mut self, target: ClassificationTarget) -> Self {
        self.target = target;
        self
    }

    pub fn by_user(mut self, user_id: UserId, site: i64) -> Self {
        self.user_id = user_id;
        self.site = site;
        self
    }
}

// =============================================================================
// LINEAGE VALIDATION
// =============================================================================

/// Node about to be written: `id` is `None` for a node not yet persisted.
#[derive(Debug, Clone, Copy)]
pub struct LineageCandidate<'a> {
    pub id: Option<RecordId>,
    pub name: &'a str,
    pub parent_id: Option<RecordId>,
}

/// Walk the ancestor chain of `candidate` and reject it when
///
/// - the parent (or any ancestor) does not exist,
/// - a name or id repeats along the chain (this also catches cycles),
/// - the chain needs `max_depth` or more parent hops.
///
/// `lookup` resolves persisted nodes of the same population by id.
pub fn validate_lineage<'a, F>(
    candidate: LineageCandidate<'_>,
    lookup: F,
    max_depth: usize,
) -> Result<()>
where
    F: Fn(RecordId) -> Option<&'a ClassificationNode>,
{
    let mut seen_names: Vec<&str> = Vec::with_capacity(max_depth + 1);
    let mut seen_ids: Vec<RecordId> = Vec::with_capacity(max_depth + 1);

    let mut current_id = candidate.id;
    let mut current_name: &str = candidate.name;
    let mut parent = candidate.parent_id;
    let mut depth = 0usize;

    loop {
        if seen_names.contains(&current_name) {
            return Err(Error::InvalidInput(format!(
                "Duplicate name {} in hierarchy.",
                current_name
            )));
        }
        if let Some(id) = current_id {
            if seen_ids.contains(&id) {
                return Err(Error::InvalidInput(format!(
                    "Duplicate id {} in hierarchy.",
                    id
                )));
            }
            seen_ids.push(id);
        }
        seen_names.push(current_name);

        let Some(parent_id) = parent else {
            break;
        };
        let node = lookup(parent_id).ok_or_else(|| {
            Error::InvalidInput(format!("Invalid parent {} - does not exist.", parent_id))
        })?;
        depth += 1;
        trace!(node_id = node.id, depth, "Lineage hop");
        if depth >= max_depth {
            return Err(Error::InvalidInput(format!(
                "Max depth of {} exceeded.",
                max_depth
            )));
        }
        current_id = Some(node.id);
        current_name = node.name.as_str();
        parent = node.parent_id;
    }

    Ok(())
}
