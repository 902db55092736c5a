use chrono::NaiveDateTime;
use std::fmt;

// ── BackupLevel ──

/// Level of a backup job as recorded in the catalog's `Job.Level` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackupLevel {
    Full,
    Incremental,
    Differential,
}

impl BackupLevel {
    /// Order in which the levels of a client are fetched.
    pub const ALL: [BackupLevel; 3] = [
        BackupLevel::Incremental,
        BackupLevel::Differential,
        BackupLevel::Full,
    ];

    /// Single-letter code stored in the catalog.
    pub fn code(self) -> &'static str {
        match self {
            BackupLevel::Full => "F",
            BackupLevel::Incremental => "I",
            BackupLevel::Differential => "D",
        }
    }
}

impl fmt::Display for BackupLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackupLevel::Full => "full",
            BackupLevel::Incremental => "incremental",
            BackupLevel::Differential => "differential",
        };
        f.write_str(name)
    }
}

// ── Client ──

/// A host registered with the backup director.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: i64,
    /// Raw client name, usually suffixed by the file daemon marker (`-fd`).
    pub name: String,
}

// ── BackupJob ──

/// A successfully terminated backup job of a single level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupJob {
    pub level: BackupLevel,
    /// Catalog timestamps carry no zone information.
    pub completed_at: NaiveDateTime,
    pub bytes: u64,
}
