//! Subjects and document permissions.
//!
//! Permissions follow the unix model: owner, group, and a 9-bit mode.
//! The mutation engine only ever asks one question — may this subject
//! write this document — so the accessors stay narrow.

use std::fmt;

/// Read bit, owner class. The remaining bits follow the usual layout.
pub const READ: u16 = 0o4;
/// Write bit.
pub const WRITE: u16 = 0o2;
/// Execute bit.
pub const EXECUTE: u16 = 0o1;

/// The active security principal of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    name: String,
    groups: Vec<String>,
    dba: bool,
}

impl Subject {
    /// Create a regular subject.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
            dba: false,
        }
    }

    /// Create a database-administrator subject. DBAs pass every check.
    pub fn dba(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
            dba: true,
        }
    }

    /// Add a group membership.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dba(&self) -> bool {
        self.dba
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Document permissions: owner, group, 9-bit mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permissions {
    owner: String,
    group: String,
    mode: u16,
}

impl Permissions {
    pub fn new(owner: impl Into<String>, group: impl Into<String>, mode: u16) -> Self {
        Self {
            owner: owner.into(),
            group: group.into(),
            mode: mode & 0o777,
        }
    }

    /// Owner rw, group r, other r. The store default for new documents.
    pub fn default_for(owner: impl Into<String>) -> Self {
        Self::new(owner, "dba", 0o644)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn mode(&self) -> u16 {
        self.mode
    }

    pub fn set_mode(&mut self, mode: u16) {
        self.mode = mode & 0o777;
    }

    /// Whether the subject may write. DBA overrides; otherwise the owner,
    /// group, and other classes are checked in that order.
    pub fn can_write(&self, subject: &Subject) -> bool {
        self.check(subject, WRITE)
    }

    /// Whether the subject may read.
    pub fn can_read(&self, subject: &Subject) -> bool {
        self.check(subject, READ)
    }

    fn check(&self, subject: &Subject, bit: u16) -> bool {
        if subject.is_dba() {
            return true;
        }
        if subject.name() == self.owner {
            return self.mode >> 6 & bit != 0;
        }
        if subject.in_group(&self.group) {
            return self.mode >> 3 & bit != 0;
        }
        self.mode & bit != 0
    }
}
