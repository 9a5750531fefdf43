use snapstate_migrations::MigrationRegistry;
use snapstate_store::{RecoveryReason, RestoreStatus, Restored};

pub struct MigrationReport {
    pub location: String,
    pub lines: Vec<String>,
    pub warning: Option<String>,
    pub dry_run: bool,
}

impl MigrationReport {
    pub fn new(
        location: String,
        restored: &Restored,
        registry: &MigrationRegistry,
        dry_run: bool,
    ) -> Self {
        let mut lines = Vec::new();
        match &restored.status {
            RestoreStatus::Fresh { version } => {
                lines.push("Nothing stored yet, no migrations needed".to_string());
                lines.push(format!("Starts:  {}", version_label(*version)));
            }
            RestoreStatus::Current { version } => {
                lines.push(format!("Already current at {}", version_label(*version)));
            }
            RestoreStatus::Migrated {
                from,
                to,
                applied,
                saved,
            } => {
                lines.push(format!("From:    {}", version_label(*from)));
                lines.push(format!("To:      {to}"));
                lines.push(format!("Applied: {} step(s)", applied.len()));
                for version in applied {
                    let name = registry.get(*version).map(|s| s.name).unwrap_or("?");
                    lines.push(format!("    - {version} {name}"));
                }
                let write = match (dry_run, *saved) {
                    (true, _) => "not written (dry run)",
                    (false, true) => "written back",
                    (false, false) => "NOT written back, see log",
                };
                lines.push(format!("Snapshot: {write}"));
            }
            RestoreStatus::Recovered {
                reason,
                quarantined,
            } => {
                let cause = match reason {
                    RecoveryReason::Unreadable(message) => format!("unreadable: {message}"),
                    RecoveryReason::MigrationFailed { message, .. } => message.clone(),
                };
                lines.push(format!("Failed:  {cause}"));
                if let Some(location) = quarantined {
                    lines.push(format!("Kept at: {location}"));
                }
                lines.push("Session: starting fresh".to_string());
            }
        }

        Self {
            location,
            lines,
            warning: restored.warning(),
            dry_run,
        }
    }

    pub fn print_summary(&self) {
        let mode = if self.dry_run { " (dry run)" } else { "" };
        println!("Snapshot Migration Report{mode}");
        println!("─────────────────────────");
        println!("  Store:   {}", self.location);
        for line in &self.lines {
            println!("  {line}");
        }
        if let Some(warning) = &self.warning {
            println!();
            println!("warning: {warning}");
        }
    }
}

pub fn version_label(version: Option<snapstate_common::SchemaVersion>) -> String {
    version.map_or_else(|| "pre-versioning".to_string(), |v| v.to_string())
}
