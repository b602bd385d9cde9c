use std::fmt;

use serde::{Deserialize, Serialize};

/// Staff roles ordered by privilege, lowest first. The derived `Ord` is the
/// precedence table: SUPER_ADMIN > ADMIN > DOCTOR > RECEPTIONIST > PATIENT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Patient,
    Receptionist,
    Doctor,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "PATIENT",
            Role::Receptionist => "RECEPTIONIST",
            Role::Doctor => "DOCTOR",
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role actually granted to a session token. Any SUPER_ADMIN membership
/// wins outright; a user whose global default is the plain RECEPTIONIST role
/// is promoted to the highest clinic membership role they hold.
pub fn effective_role(default_role: Role, membership_roles: &[Role]) -> Role {
    if membership_roles.contains(&Role::SuperAdmin) {
        return Role::SuperAdmin;
    }

    if default_role == Role::Receptionist {
        if membership_roles.contains(&Role::Admin) {
            return Role::Admin;
        }
        if membership_roles.contains(&Role::Doctor) {
            return Role::Doctor;
        }
    }

    default_role
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn super_admin_membership_wins() {
        assert_eq!(
            effective_role(Role::Receptionist, &[Role::Doctor, Role::SuperAdmin]),
            Role::SuperAdmin
        );
    }

    #[test]
    fn default_receptionist_promoted_to_admin_over_doctor() {
        assert_eq!(
            effective_role(Role::Receptionist, &[Role::Doctor, Role::Admin]),
            Role::Admin
        );
    }

    #[test]
    fn default_receptionist_promoted_to_doctor() {
        assert_eq!(
            effective_role(Role::Receptionist, &[Role::Doctor]),
            Role::Doctor
        );
    }

    #[test]
    fn non_default_role_is_not_promoted() {
        assert_eq!(effective_role(Role::Doctor, &[Role::Admin]), Role::Doctor);
    }

    #[test]
    fn no_memberships_keeps_default() {
        assert_eq!(
            effective_role(Role::Receptionist, &[]),
            Role::Receptionist
        );
    }

    #[test]
    fn role_precedence_order() {
        assert!(Role::SuperAdmin > Role::Admin);
        assert!(Role::Admin > Role::Doctor);
        assert!(Role::Doctor > Role::Receptionist);
        assert!(Role::Receptionist > Role::Patient);
    }

    #[test]
    fn role_wire_format() {
        assert_eq!(
            serde_json::to_string(&Role::SuperAdmin).unwrap(),
            "\"SUPER_ADMIN\""
        );
    }
}
