//! `abgabesystem users` — dummy accounts and `students` group enrollment.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use abgabe_provision::{
    course::resolve_course,
    enroll::{enroll_students, LdapSettings},
};

use crate::GlobalArgs;

#[derive(Args, Debug)]
pub struct UsersArgs {
    /// Course whose `students` group the accounts join.
    #[arg(short, long)]
    pub course: String,

    /// Roster export (semicolon separated, Latin-1).
    #[arg(short, long)]
    pub students: PathBuf,

    /// LDAP base DN; overrides `ldap_base` from the config.
    #[arg(short = 'b', long)]
    pub ldap_base: Option<String>,

    /// LDAP provider name; overrides `ldap_provider` from the config.
    #[arg(short = 'p', long)]
    pub ldap_provider: Option<String>,
}

impl UsersArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let mut config = super::load_config(global)?;
        if let Some(base) = self.ldap_base {
            config.ldap_base = Some(base);
        }
        if let Some(provider) = self.ldap_provider {
            config.ldap_provider = provider;
        }
        let ldap = LdapSettings {
            base: config.require_ldap_base()?.to_string(),
            provider: config.ldap_provider.clone(),
        };

        let roster = super::read_roster(&self.students)?;
        let client = super::connect(&config)?;
        let layout = resolve_course(&client, &self.course)
            .with_context(|| format!("course '{}' is not set up; run `course` first", self.course))?;

        let report = enroll_students(&client, &layout.students, &roster, &ldap);
        super::print_batch("Accounts", &report, |enrollment| {
            (
                super::reconciled_label(&enrollment.account),
                format!("membership {}", enrollment.membership.verb()),
            )
        });
        super::finish_batch("students", &report)
    }
}
