use crate::database::models::{Proposal, ProposalStatus, Review, VoteStatus};
use crate::vote_flow::draft::VoteIntent;

/// Lifecycle of the in-flight vote request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed(String),
}

/// The reviewer's own position on one proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewerVote {
    NotVoted,
    Voted(VoteStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Failure(String),
}

/// Local mirror of the caller's review.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalReview {
    pub id: String,
    pub vote_status: VoteStatus,
    pub comments: String,
    pub reviewer_id: String,
}

/// Placeholder id for a review applied before its row id is known.
pub const TEMP_REVIEW_ID: &str = "temp";

/// What the detail screen shows: the proposal and the caller's review.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalView {
    pub proposal: Proposal,
    pub my_review: Option<LocalReview>,
}

impl ProposalView {
    pub fn new(proposal: Proposal, existing: Option<&Review>) -> Self {
        let my_review = existing.map(|r| LocalReview {
            id: r.id.clone(),
            vote_status: r.vote_status,
            comments: r.comments.clone().unwrap_or_default(),
            reviewer_id: r.reviewer_id.clone(),
        });
        Self {
            proposal,
            my_review,
        }
    }

    pub fn reviewer_vote(&self) -> ReviewerVote {
        match &self.my_review {
            Some(review) => ReviewerVote::Voted(review.vote_status),
            None => ReviewerVote::NotVoted,
        }
    }

    /// Apply a vote that the backend has already accepted.
    ///
    /// Pending advances to Reviewing on an approval; nothing else changes
    /// proposal status here.
    pub fn apply_vote(&mut self, reviewer_id: &str, intent: &VoteIntent, persisted_id: Option<String>) {
        let id = persisted_id
            .or_else(|| self.my_review.as_ref().map(|r| r.id.clone()))
            .unwrap_or_else(|| TEMP_REVIEW_ID.to_string());

        self.my_review = Some(LocalReview {
            id,
            vote_status: intent.vote_status(),
            comments: intent.comment().to_string(),
            reviewer_id: reviewer_id.to_string(),
        });

        if intent.vote_status() == VoteStatus::Approve
            && self.proposal.status == ProposalStatus::Pending
        {
            self.proposal.status = ProposalStatus::Reviewing;
        }
    }
}
