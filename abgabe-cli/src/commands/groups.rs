//! `abgabesystem groups` — tutorial groups of a roster. Works offline.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use abgabe_core::roster::tutorial_groups;

#[derive(Args, Debug)]
pub struct GroupsArgs {
    /// Roster export (semicolon separated, Latin-1).
    #[arg(short, long)]
    pub students: PathBuf,
}

impl GroupsArgs {
    pub fn run(self) -> Result<()> {
        let roster = super::read_roster(&self.students)?;
        for group in tutorial_groups(&roster) {
            println!("{group}");
        }
        Ok(())
    }
}
