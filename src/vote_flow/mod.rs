//! Client side of casting a vote.
//!
//! A [`VoteFlow`] holds one proposal view for the signed-in reviewer. A
//! submission either reaches a [`VoteBackend`], or, for the configured
//! simulation user, only waits out the simulated delay. Local state changes
//! only after the backend accepts the vote.

pub mod backend;
pub mod draft;
pub mod state;

pub use backend::{DirectBackend, GatewayBackend, VoteBackend};
pub use draft::{can_confirm_rejection, validate_signature, VoteIntent};
pub use state::{LocalReview, Notice, ProposalView, ReviewerVote, SubmissionState};

use std::time::Duration;
use tracing::{error, info};

use crate::auth::SessionProvider;
use crate::config::SimulationConfig;

pub const FAILURE_NOTICE: &str = "Failed to submit vote";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// No signed-in user or no proposal loaded.
    Skipped,
    Recorded,
    Failed,
}

pub struct VoteFlow<B: VoteBackend> {
    backend: B,
    sessions: SessionProvider,
    simulation: SimulationConfig,
    view: Option<ProposalView>,
    state: SubmissionState,
    notices: Vec<Notice>,
}

impl<B: VoteBackend> VoteFlow<B> {
    pub fn new(backend: B, sessions: SessionProvider, simulation: SimulationConfig) -> Self {
        Self {
            backend,
            sessions,
            simulation,
            view: None,
            state: SubmissionState::Idle,
            notices: Vec::new(),
        }
    }

    pub fn load(&mut self, view: ProposalView) {
        self.view = Some(view);
        self.state = SubmissionState::Idle;
    }

    pub fn view(&self) -> Option<&ProposalView> {
        self.view.as_ref()
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn is_simulated(&self, user_id: &str) -> bool {
        user_id == self.simulation.sentinel_user_id
    }

    /// Submit one vote. There are no retries; on failure the view is left
    /// exactly as it was.
    ///
    /// `&mut self` rules out overlapping calls. A dropped call leaves the
    /// state at `Submitting` until the next submission overwrites it.
    pub async fn submit(&mut self, intent: VoteIntent) -> SubmissionOutcome {
        let Some(user) = self.sessions.current() else {
            return SubmissionOutcome::Skipped;
        };
        let Some(proposal_id) = self.view.as_ref().map(|v| v.proposal.id.clone()) else {
            return SubmissionOutcome::Skipped;
        };
        self.state = SubmissionState::Submitting;

        let persisted = if self.is_simulated(user.id()) {
            info!("Simulated vote on {} by {}, skipping backend", proposal_id, user.id());
            tokio::time::sleep(Duration::from_millis(self.simulation.delay_ms)).await;
            Ok(None)
        } else {
            self.backend
                .persist(&user, &proposal_id, &intent)
                .await
                .map(|review| Some(review.id))
        };

        match persisted {
            Ok(review_id) => {
                if let Some(view) = self.view.as_mut() {
                    view.apply_vote(user.id(), &intent, review_id);
                }
                self.state = SubmissionState::Succeeded;
                self.notices.push(Notice::Success(format!(
                    "Vote Recorded: {}",
                    intent.vote_status().past_tense()
                )));
                SubmissionOutcome::Recorded
            }
            Err(e) => {
                error!("Vote submission for {} failed: {}", proposal_id, e);
                self.state = SubmissionState::Failed(e.to_string());
                self.notices.push(Notice::Failure(FAILURE_NOTICE.to_string()));
                SubmissionOutcome::Failed
            }
        }
    }
}
