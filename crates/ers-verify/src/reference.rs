//! Per-reference validation results

use ers_types::{DigestValue, TimestampPosition};

/// What a validated reference turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// A supplied data object
    ArchiveObject,
    /// A protected digest whose data object was not supplied
    OrphanReference,
    /// A link to the immediately preceding archive timestamp's token
    ArchiveTimeStamp,
    /// A link to the root of a whole preceding run of archive timestamps
    ArchiveTimeStampSequence,
}

impl ReferenceKind {
    /// Whether this reference links archive timestamps together
    pub fn is_link(&self) -> bool {
        matches!(
            self,
            ReferenceKind::ArchiveTimeStamp | ReferenceKind::ArchiveTimeStampSequence
        )
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReferenceKind::ArchiveObject => "archive object",
            ReferenceKind::OrphanReference => "orphan reference",
            ReferenceKind::ArchiveTimeStamp => "archive timestamp",
            ReferenceKind::ArchiveTimeStampSequence => "archive timestamp sequence",
        };
        f.write_str(name)
    }
}

/// Outcome of checking one reference against one archive timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceValidation {
    /// Classification
    pub kind: ReferenceKind,
    /// A leaf slot for the reference exists
    pub found: bool,
    /// The leaf equals the digest recomputed from the referenced bytes
    pub intact: bool,
    /// Digest the check was made with
    pub digest: Option<DigestValue>,
    /// Data object name, for data object references
    pub identifier: Option<String>,
    /// Archive timestamp the reference was checked against
    pub position: TimestampPosition,
}

impl ReferenceValidation {
    /// Whether the reference was found and is intact
    pub fn is_valid(&self) -> bool {
        self.found && self.intact
    }
}
