//! Blood-type compatibility lookup.
//!
//! A static table: for each recipient group, the groups it can receive
//! from, and for each donor group, the groups it can give to. Order
//! within each list follows the donation-guide cards the dashboard shows.

use std::str::FromStr;

use serde::Serialize;

use crate::models::enums::BloodGroup;
use crate::models::enums::BloodGroup::*;

const ALL_GROUPS: &[BloodGroup] = &[
    OPositive, ONegative, APositive, ANegative, BPositive, BNegative, AbPositive, AbNegative,
];

/// Both directions of compatibility for one blood group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Compatibility {
    pub blood_group: BloodGroup,
    /// Groups this group can safely receive from.
    pub can_receive_from: &'static [BloodGroup],
    /// Groups this group can safely donate to.
    pub can_donate_to: &'static [BloodGroup],
}

/// Look up the compatibility row for a group.
pub fn lookup(group: BloodGroup) -> Compatibility {
    let (can_receive_from, can_donate_to): (&'static [BloodGroup], &'static [BloodGroup]) =
        match group {
            APositive => (&[OPositive, ONegative, APositive, ANegative], &[APositive, AbPositive]),
            OPositive => (&[OPositive, ONegative], &[OPositive, APositive, BPositive, AbPositive]),
            BPositive => (&[OPositive, ONegative, BPositive, BNegative], &[BPositive, AbPositive]),
            AbPositive => (ALL_GROUPS, &[AbPositive]),
            ANegative => (&[ONegative, ANegative], &[APositive, ANegative, AbPositive, AbNegative]),
            // O- is the universal donor.
            ONegative => (&[ONegative], ALL_GROUPS),
            BNegative => (&[ONegative, BNegative], &[BPositive, BNegative, AbPositive, AbNegative]),
            AbNegative => (&[ONegative, ANegative, BNegative, AbNegative], &[AbPositive, AbNegative]),
        };

    Compatibility {
        blood_group: group,
        can_receive_from,
        can_donate_to,
    }
}

/// Lookup by raw code. Unknown codes yield `None`, rendered as "N/A".
pub fn lookup_code(code: &str) -> Option<Compatibility> {
    BloodGroup::from_str(code.trim()).ok().map(lookup)
}

/// Human-readable rendering of a group list ("N/A" when empty).
pub fn describe(groups: &[BloodGroup]) -> String {
    if groups.is_empty() {
        return "N/A".to_string();
    }
    groups.iter().map(BloodGroup::as_str).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_group_has_both_lists() {
        for group in BloodGroup::ALL {
            let c = lookup(group);
            assert!(!c.can_receive_from.is_empty(), "{group} receive list empty");
            assert!(!c.can_donate_to.is_empty(), "{group} donate list empty");
        }
    }

    #[test]
    fn singleton_rows() {
        assert_eq!(lookup(AbPositive).can_donate_to, &[AbPositive]);
        assert_eq!(lookup(ONegative).can_receive_from, &[ONegative]);
    }

    #[test]
    fn universal_donor_and_recipient() {
        assert_eq!(lookup(ONegative).can_donate_to.len(), 8);
        assert_eq!(lookup(AbPositive).can_receive_from.len(), 8);
    }

    #[test]
    fn a_positive_row_matches_guide_order() {
        let c = lookup(APositive);
        assert_eq!(c.can_receive_from, &[OPositive, ONegative, APositive, ANegative]);
        assert_eq!(c.can_donate_to, &[APositive, AbPositive]);
    }

    #[test]
    fn directions_are_consistent() {
        for donor in BloodGroup::ALL {
            for recipient in BloodGroup::ALL {
                let forward = lookup(donor).can_donate_to.contains(&recipient);
                let backward = lookup(recipient).can_receive_from.contains(&donor);
                assert_eq!(forward, backward, "{donor} -> {recipient}");
            }
        }
    }

    #[test]
    fn unknown_code_is_none() {
        assert!(lookup_code("C+").is_none());
        assert!(lookup_code("").is_none());
        assert_eq!(lookup_code(" B- ").unwrap().blood_group, BNegative);
    }

    #[test]
    fn describe_renders_na_for_empty() {
        assert_eq!(describe(&[]), "N/A");
        assert_eq!(describe(&[ONegative, BNegative]), "O- B-");
    }
}
