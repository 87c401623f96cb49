//! Job application status state machine
//!
//! ```text
//! pending -> reviewing -> shortlisted -> interviewed -> accepted
//!                                                    \-> rejected
//! (any non-terminal) -> withdrawn
//! ```
//!
//! `accepted`, `rejected` and `withdrawn` are terminal.

use crate::cache::invalidation::{InvalidationGraph, Mutation};
use crate::error::{ClientError, Result};
use crate::keys::QueryKey;
use crate::model::JobApplication;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Application status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewing,
    Shortlisted,
    Interviewed,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 7] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewing,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Interviewed,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Interviewed => "interviewed",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// No transition leaves a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }

    /// Whether a reviewer has acted on the application.
    ///
    /// `None` for `withdrawn`, which is reachable both before and after review.
    pub fn was_reviewed(&self) -> Option<bool> {
        match self {
            ApplicationStatus::Pending => Some(false),
            ApplicationStatus::Withdrawn => None,
            _ => Some(true),
        }
    }

    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        ApplicationTransition::leading_to(next).is_some_and(|t| t.check(*self).is_ok())
    }

    /// Every status reachable in one step
    pub fn allowed_next(&self) -> Vec<ApplicationStatus> {
        ApplicationStatus::ALL
            .iter()
            .copied()
            .filter(|next| self.can_transition_to(*next))
            .collect()
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        ApplicationStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClientError::validation(format!("unknown application status `{}`", s)))
    }
}

/// A status change a reviewer or applicant can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApplicationTransition {
    MoveToReviewing,
    Shortlist,
    ScheduleInterview,
    Accept,
    Reject,
    Withdraw,
}

impl ApplicationTransition {
    pub const ALL: [ApplicationTransition; 6] = [
        ApplicationTransition::MoveToReviewing,
        ApplicationTransition::Shortlist,
        ApplicationTransition::ScheduleInterview,
        ApplicationTransition::Accept,
        ApplicationTransition::Reject,
        ApplicationTransition::Withdraw,
    ];

    pub fn target(&self) -> ApplicationStatus {
        match self {
            ApplicationTransition::MoveToReviewing => ApplicationStatus::Reviewing,
            ApplicationTransition::Shortlist => ApplicationStatus::Shortlisted,
            ApplicationTransition::ScheduleInterview => ApplicationStatus::Interviewed,
            ApplicationTransition::Accept => ApplicationStatus::Accepted,
            ApplicationTransition::Reject => ApplicationStatus::Rejected,
            ApplicationTransition::Withdraw => ApplicationStatus::Withdrawn,
        }
    }

    /// States this transition may start from
    pub fn sources(&self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            ApplicationTransition::MoveToReviewing => &[Pending],
            ApplicationTransition::Shortlist => &[Reviewing],
            ApplicationTransition::ScheduleInterview => &[Shortlisted],
            ApplicationTransition::Accept | ApplicationTransition::Reject => &[Interviewed],
            ApplicationTransition::Withdraw => &[Pending, Reviewing, Shortlisted, Interviewed],
        }
    }

    /// The transition whose target is `status`; `pending` has none
    pub fn leading_to(status: ApplicationStatus) -> Option<Self> {
        ApplicationTransition::ALL
            .iter()
            .copied()
            .find(|t| t.target() == status)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationTransition::MoveToReviewing => "move to reviewing",
            ApplicationTransition::Shortlist => "shortlist",
            ApplicationTransition::ScheduleInterview => "schedule an interview for",
            ApplicationTransition::Accept => "accept",
            ApplicationTransition::Reject => "reject",
            ApplicationTransition::Withdraw => "withdraw",
        }
    }

    /// Validate the move from `from`, returning the resulting status
    pub fn check(&self, from: ApplicationStatus) -> Result<ApplicationStatus> {
        if from.is_terminal() {
            return Err(ClientError::conflict(format!(
                "cannot {} an application that is already {}",
                self.label(),
                from
            )));
        }
        if !self.sources().contains(&from) {
            return Err(ClientError::conflict(format!(
                "cannot {} an application that is {}",
                self.label(),
                from
            )));
        }
        Ok(self.target())
    }

    /// Invalidation-graph entry for a successful transition of `application`
    pub fn mutation(&self, application: &JobApplication) -> Mutation {
        match self {
            ApplicationTransition::Withdraw => Mutation::WithdrawApplication {
                application_id: application.id.clone(),
                job_id: application.job_id.clone(),
            },
            _ => Mutation::UpdateApplicationStatus {
                application_id: application.id.clone(),
                job_id: application.job_id.clone(),
            },
        }
    }

    /// Affected-scope set: the key prefixes a successful transition marks stale
    pub fn affected_scopes(&self, graph: &InvalidationGraph, application: &JobApplication) -> Vec<QueryKey> {
        graph.resolve(&self.mutation(application))
    }
}

impl fmt::Display for ApplicationTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;

    #[test]
    fn test_happy_path() {
        let mut status = ApplicationStatus::Pending;
        for transition in [
            ApplicationTransition::MoveToReviewing,
            ApplicationTransition::Shortlist,
            ApplicationTransition::ScheduleInterview,
            ApplicationTransition::Accept,
        ] {
            status = transition.check(status).unwrap();
        }
        assert_eq!(status, ApplicationStatus::Accepted);
        assert!(status.is_terminal());
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for terminal in [
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
            ApplicationStatus::Withdrawn,
        ] {
            assert!(terminal.allowed_next().is_empty());
            for transition in ApplicationTransition::ALL {
                let err = transition.check(terminal).unwrap_err();
                assert!(err.is_state_conflict());
                assert!(err.to_string().contains("already"));
            }
        }
    }

    #[test]
    fn test_shortlist_rejected_application_conflicts() {
        let err = ApplicationTransition::Shortlist
            .check(ApplicationStatus::Rejected)
            .unwrap_err();
        assert!(matches!(err, ClientError::StateConflict { .. }));
    }

    #[test]
    fn test_skipping_steps_conflicts() {
        assert!(ApplicationTransition::Accept
            .check(ApplicationStatus::Pending)
            .is_err());
        assert!(ApplicationTransition::ScheduleInterview
            .check(ApplicationStatus::Reviewing)
            .is_err());
        assert!(!ApplicationStatus::Pending.can_transition_to(ApplicationStatus::Shortlisted));
    }

    #[test]
    fn test_withdraw_from_any_non_terminal() {
        for status in ApplicationStatus::ALL.iter().filter(|s| !s.is_terminal()) {
            assert!(status.can_transition_to(ApplicationStatus::Withdrawn));
        }
    }

    #[test]
    fn test_allowed_next() {
        assert_eq!(
            ApplicationStatus::Interviewed.allowed_next(),
            vec![
                ApplicationStatus::Accepted,
                ApplicationStatus::Rejected,
                ApplicationStatus::Withdrawn
            ]
        );
        assert_eq!(
            ApplicationStatus::Pending.allowed_next(),
            vec![ApplicationStatus::Reviewing, ApplicationStatus::Withdrawn]
        );
    }

    #[test]
    fn test_nothing_leads_back_to_pending() {
        assert!(ApplicationTransition::leading_to(ApplicationStatus::Pending).is_none());
        for status in ApplicationStatus::ALL {
            assert!(!status.can_transition_to(ApplicationStatus::Pending));
        }
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(
            "Shortlisted".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Shortlisted
        );
        assert!("hired".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_affected_scopes_cover_detail_list_and_stats() {
        let graph = InvalidationGraph::standard();
        let app = JobApplication::new("A1".into(), "J1".into(), "U1".into());
        let scopes = ApplicationTransition::Shortlist.affected_scopes(&graph, &app);

        assert!(scopes.contains(&keys::applications::detail("A1")));
        assert!(scopes.contains(&keys::applications::lists()));
        assert!(scopes.contains(&keys::applications::for_job("J1")));
        assert!(scopes.contains(&keys::applications::stats()));
    }
}
