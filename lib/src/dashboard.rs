// lib/src/dashboard.rs
//
// Department overview computed from already loaded lists. `summarize` is
// pure; `load` gathers the caller's visible rows and feeds it.

use std::collections::BTreeMap;

use serde::Serialize;

use models::{AlertCode, Emergency, EmergencyStatus, RecordId, RequestStatus, SpecialistInvestigationRequest};

use crate::errors::Result;
use crate::services::{emergencies, investigations, specialist, Actor};
use crate::storage_engine::TriageStore;

pub const UNASSIGNED: &str = "unassigned";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OperatorLoad {
    pub user_id: RecordId,
    pub open: usize,
    pub closed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// Open emergencies per alert code, every code present.
    pub by_alert_code: BTreeMap<&'static str, usize>,
    /// Open emergencies per area.
    pub occupancy: BTreeMap<&'static str, usize>,
    /// 118 handoffs not yet arrived, newest first.
    pub incoming_118: Vec<Emergency>,
    pub per_operator: Vec<OperatorLoad>,
    pub specialist_requests: BTreeMap<&'static str, usize>,
    pub investigations_performed: usize,
}

pub fn summarize(
    emergencies: &[Emergency],
    requests: &[SpecialistInvestigationRequest],
    investigations_performed: usize,
) -> DashboardSummary {
    let mut by_alert_code: BTreeMap<&'static str, usize> =
        AlertCode::ALL.iter().map(|code| (code.as_str(), 0)).collect();
    by_alert_code.insert(UNASSIGNED, 0);
    let mut occupancy: BTreeMap<&'static str, usize> =
        EmergencyStatus::OPEN.iter().map(|status| (status.as_str(), 0)).collect();
    let mut operators: BTreeMap<RecordId, OperatorLoad> = BTreeMap::new();
    let mut incoming_118 = Vec::new();

    for emergency in emergencies {
        let load = operators.entry(emergency.user_id).or_insert(OperatorLoad {
            user_id: emergency.user_id,
            ..OperatorLoad::default()
        });
        if emergency.is_closed() {
            load.closed += 1;
            continue;
        }
        load.open += 1;

        let code = emergency.alert_code.map_or(UNASSIGNED, |c| c.as_str());
        *by_alert_code.entry(code).or_default() += 1;
        *occupancy.entry(emergency.status.as_str()).or_default() += 1;
        if emergency.is_incoming() {
            incoming_118.push(emergency.clone());
        }
    }
    incoming_118.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    let mut specialist_requests: BTreeMap<&'static str, usize> =
        RequestStatus::ALL.iter().map(|status| (status.as_str(), 0)).collect();
    for request in requests {
        *specialist_requests.entry(request.status.as_str()).or_default() += 1;
    }

    DashboardSummary {
        by_alert_code,
        occupancy,
        incoming_118,
        per_operator: operators.into_values().collect(),
        specialist_requests,
        investigations_performed,
    }
}

pub fn load(store: &TriageStore, actor: Actor) -> Result<DashboardSummary> {
    let emergencies = emergencies::list_emergencies(store, actor, Default::default())?;
    let requests = specialist::list_requests(store, actor)?;
    let performed = investigations::list_performed(store, actor)?.len();
    Ok(summarize(&emergencies, &requests, performed))
}
