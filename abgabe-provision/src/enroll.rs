//! Dummy accounts for roster participants.
//!
//! Accounts are created with an LDAP identity; the instance fetches the real
//! profile from the directory on first login, so the password set here is a
//! random throwaway nobody ever learns.

use base64::Engine as _;

use abgabe_core::{
    types::{AccessLevel, RemoteGroup, RemoteMember, RemoteUser, StudentRecord},
    NewUser, Platform,
};

use crate::error::ProvisionError;
use crate::reconcile::{find_exact, reconcile, Lookup, MembershipSpec, Reconciled, UserSpec};
use crate::report::BatchReport;

/// Custom attribute carrying the tutorial group.
pub const GROUP_ATTRIBUTE: &str = "group";

const PASSWORD_BYTES: usize = 32;

/// Directory settings of the instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapSettings {
    /// Base DN, e.g. `ou=people,dc=tu-bs,dc=de`.
    pub base: String,
    /// Provider name configured on the instance, e.g. `ldapmain`.
    pub provider: String,
}

/// What enrollment did for one student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub account: Reconciled<RemoteUser>,
    pub membership: Reconciled<RemoteMember>,
}

/// Ensure an account and a `students` group membership for every student.
pub fn enroll_students(
    platform: &dyn Platform,
    students_group: &RemoteGroup,
    roster: &[StudentRecord],
    ldap: &LdapSettings,
) -> BatchReport<Enrollment> {
    let mut report = BatchReport::new();
    for student in roster {
        let result = enroll_student(platform, students_group, student, ldap);
        report.record(&student.username, result);
    }
    report
}

/// Account + enrollment for a single student.
pub fn enroll_student(
    platform: &dyn Platform,
    students_group: &RemoteGroup,
    student: &StudentRecord,
    ldap: &LdapSettings,
) -> Result<Enrollment, ProvisionError> {
    let mut spec = UserSpec {
        user: new_user(student, ldap, String::new()),
    };
    // The password is only needed when the account has to be created.
    let account = match find_exact(platform, &spec)? {
        Lookup::Exact(user) => Reconciled::Existing(user),
        Lookup::Absent | Lookup::Mismatch(_) => {
            spec.user.password = generate_password()?;
            reconcile(platform, &spec)?
        }
    };
    let user = account.handle();

    // An adopted account may come from a run that died before setting it.
    if !matches!(account, Reconciled::Existing(_)) {
        if let Err(err) =
            platform.set_user_attribute(user.id, GROUP_ATTRIBUTE, &student.tutorial_group)
        {
            tracing::warn!(username = %user.username, error = %err, "failed to set tutorial group attribute");
        }
    }

    let membership = reconcile(
        platform,
        &MembershipSpec::new(students_group.id, user, AccessLevel::Guest),
    )?;
    Ok(Enrollment {
        account,
        membership,
    })
}

/// Creation payload for a student's account.
pub fn new_user(student: &StudentRecord, ldap: &LdapSettings, password: String) -> NewUser {
    NewUser {
        email: student.email.clone(),
        username: student.username.clone(),
        name: student.full_name.clone(),
        provider: ldap.provider.clone(),
        extern_uid: student.extern_uid(&ldap.base),
        password,
        skip_confirmation: true,
    }
}

/// 32 random bytes, URL-safe base64 without padding.
pub fn generate_password() -> Result<String, ProvisionError> {
    let mut bytes = [0u8; PASSWORD_BYTES];
    getrandom::fill(&mut bytes).map_err(|e| ProvisionError::Random(e.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}
