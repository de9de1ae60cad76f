use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Pending,
    Reviewing,
    Decided,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "Pending",
            ProposalStatus::Reviewing => "Reviewing",
            ProposalStatus::Decided => "Decided",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ProposalStatus::Pending),
            "Reviewing" => Ok(ProposalStatus::Reviewing),
            "Decided" => Ok(ProposalStatus::Decided),
            _ => Err(format!("Invalid proposal status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteStatus {
    Approve,
    Reject,
    Pending,
}

impl VoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteStatus::Approve => "Approve",
            VoteStatus::Reject => "Reject",
            VoteStatus::Pending => "Pending",
        }
    }

    /// Past-tense label used in notifications ("Approved" / "Rejected").
    pub fn past_tense(&self) -> &'static str {
        match self {
            VoteStatus::Approve => "Approved",
            VoteStatus::Reject => "Rejected",
            VoteStatus::Pending => "Pending",
        }
    }
}

impl fmt::Display for VoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Approve" => Ok(VoteStatus::Approve),
            "Reject" => Ok(VoteStatus::Reject),
            "Pending" => Ok(VoteStatus::Pending),
            _ => Err(format!("Invalid vote_status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub department: String,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub title: String,
    pub department: String,
    pub pdf_url: String,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub signed_off: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub proposal_id: String,
    pub reviewer_id: String,
    pub vote_status: VoteStatus,
    pub comments: Option<String>,
    pub signature_data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values written by a review upsert keyed on (proposal_id, reviewer_id).
#[derive(Debug, Clone)]
pub struct ReviewUpsert {
    pub proposal_id: String,
    pub reviewer_id: String,
    pub vote_status: VoteStatus,
    pub comments: Option<String>,
    /// `None` leaves an existing signature untouched.
    pub signature_data: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProposal {
    pub title: String,
    pub department: String,
    pub pdf_url: String,
    pub created_by: String,
}

/// Row of `legal_audit_log`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub sequence: i64,
    pub id: String,
    pub user_id: String,
    pub action: String,
    pub ip_address: String,
    pub resource_id: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub previous_hash: String,
    pub entry_hash: String,
}
