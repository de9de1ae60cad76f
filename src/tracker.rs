//! Per-member voting status and dashboard counts.
//!
//! Pure aggregation over rows; nothing here changes proposal status.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::database::models::{Profile, Proposal, ProposalStatus, Review, VoteStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberVoteStatus {
    pub id: String,
    pub email: String,
    pub department: String,
    pub has_voted: bool,
    pub vote_status: Option<VoteStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteTracker {
    pub members: Vec<MemberVoteStatus>,
    pub voted: usize,
    pub total: usize,
    /// Rounded to the nearest whole percent; 0 with no members.
    pub completion_percent: u32,
}

impl VoteTracker {
    pub fn build(members: &[Profile], reviews: &[Review]) -> Self {
        let votes: HashMap<&str, VoteStatus> = reviews
            .iter()
            .map(|r| (r.reviewer_id.as_str(), r.vote_status))
            .collect();

        let members: Vec<MemberVoteStatus> = members
            .iter()
            .map(|m| {
                let vote = votes.get(m.id.as_str()).copied();
                MemberVoteStatus {
                    id: m.id.clone(),
                    email: m.email.clone(),
                    department: m.department.clone(),
                    has_voted: vote.is_some(),
                    vote_status: vote,
                }
            })
            .collect();

        let voted = members.iter().filter(|m| m.has_voted).count();
        let total = members.len();

        Self {
            members,
            voted,
            total,
            completion_percent: completion_percent(voted, total),
        }
    }
}

pub fn completion_percent(voted: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((voted as f64 / total as f64) * 100.0).round() as u32
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub pending: usize,
    pub reviewing: usize,
    pub decided: usize,
}

impl DashboardStats {
    pub fn from_proposals(proposals: &[Proposal]) -> Self {
        proposals.iter().fold(Self::default(), |mut stats, p| {
            match p.status {
                ProposalStatus::Pending => stats.pending += 1,
                ProposalStatus::Reviewing => stats.reviewing += 1,
                ProposalStatus::Decided => stats.decided += 1,
            }
            stats
        })
    }
}
