use super::enums::{BloodGroup, RequestStatus};

/// Conjunctive donor search predicate with an explicit page window.
#[derive(Debug, Default, Clone)]
pub struct DonorFilter {
    pub blood_group: Option<BloodGroup>,
    /// Case-insensitive substring matched against city OR state.
    pub location: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

/// Exact-match predicate used to pick donors for an urgent request.
#[derive(Debug, Clone)]
pub struct MatchFilter {
    pub blood_group: BloodGroup,
    pub city: String,
    pub available_only: bool,
}

#[derive(Debug, Default, Clone)]
pub struct UrgentRequestFilter {
    pub status: Option<RequestStatus>,
}
