//! Textual report output.
//!
//! The report is written to a plain `io::Write` sink so tests can capture it;
//! the binary hands over stdout. Line content is stable, decoration is not.

use std::io::{self, Write};

use crate::detect::Finding;

/// Aggregate counters for one audit run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total_clubs: usize,
    pub clubs_with_duplicates: usize,
    pub extra_memberships: usize,
}

impl Summary {
    pub fn record(&mut self, finding: &Finding) {
        self.clubs_with_duplicates += 1;
        self.extra_memberships += finding.extra_memberships();
    }
}

/// Writes per-club findings and the run summary.
pub struct Reporter<W> {
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn finding(&mut self, finding: &Finding) -> io::Result<()> {
        writeln!(
            self.out,
            "⚠ Club \"{}\" ({})",
            finding.club_name, finding.club_id
        )?;
        writeln!(
            self.out,
            "   members: {} total, {} unique",
            finding.total_members, finding.unique_members
        )?;
        for dup in &finding.duplicates {
            writeln!(
                self.out,
                "   - {} ({}): {} memberships",
                dup.display_name, dup.user_id, dup.count
            )?;
        }
        writeln!(self.out)
    }

    pub fn summary(&mut self, summary: &Summary) -> io::Result<()> {
        writeln!(self.out, "Audit complete")?;
        writeln!(self.out, "   Clubs checked: {}", summary.total_clubs)?;
        writeln!(
            self.out,
            "   Clubs with duplicates: {}",
            summary.clubs_with_duplicates
        )?;
        writeln!(
            self.out,
            "   Extra memberships: {}",
            summary.extra_memberships
        )?;
        if summary.clubs_with_duplicates > 0 {
            writeln!(
                self.out,
                "→ Run fix-duplicate-clubs to repair the affected clubs"
            )
        } else {
            writeln!(self.out, "✓ No duplicate memberships found")
        }
    }
}
