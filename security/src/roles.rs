// security/src/roles.rs
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use models::Permission;

use crate::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Grants every other capability.
    Superuser,
    /// Users, departments and the investigation catalogs.
    ManageCatalogs,
    ManagePatients,
    TriageEmergencies,
    CallSpecialists,
    RecordInvestigations,
    RequestSpecialistWork,
    UpdateSpecialistWork,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Superuser => "superuser",
            Capability::ManageCatalogs => "manage_catalogs",
            Capability::ManagePatients => "manage_patients",
            Capability::TriageEmergencies => "triage_emergencies",
            Capability::CallSpecialists => "call_specialists",
            Capability::RecordInvestigations => "record_investigations",
            Capability::RequestSpecialistWork => "request_specialist_work",
            Capability::UpdateSpecialistWork => "update_specialist_work",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RolesConfig {
    roles: HashMap<Permission, Vec<Capability>>,
}

impl Default for RolesConfig {
    fn default() -> Self {
        use Capability::*;
        let roles = HashMap::from([
            (Permission::Admin, vec![Superuser]),
            (
                Permission::PsOperator,
                vec![
                    ManagePatients,
                    TriageEmergencies,
                    CallSpecialists,
                    RecordInvestigations,
                    RequestSpecialistWork,
                    UpdateSpecialistWork,
                ],
            ),
            (Permission::Specialist, vec![RecordInvestigations, UpdateSpecialistWork]),
            (Permission::Operator118, vec![ManagePatients, TriageEmergencies]),
        ]);
        RolesConfig { roles }
    }
}

impl RolesConfig {
    pub fn capabilities(&self, permission: Permission) -> &[Capability] {
        self.roles.get(&permission).map_or(&[], Vec::as_slice)
    }

    pub fn has_capability(&self, permission: Permission, capability: Capability) -> bool {
        let granted = self.capabilities(permission);
        granted.contains(&capability) || granted.contains(&Capability::Superuser)
    }

    pub fn require(&self, permission: Permission, capability: Capability) -> Result<(), AuthError> {
        if self.has_capability(permission, capability) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(format!("{} users cannot {}", permission, capability)))
        }
    }
}
