//! Donor achievement badges.
//!
//! Badges are derived from the donor record on every request and never
//! stored.

use serde::Serialize;

use crate::models::Donor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeKind {
    Welcome,
    GoldenDonor,
    LifeSaver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub kind: BadgeKind,
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

impl BadgeKind {
    pub fn badge(self) -> Badge {
        let (name, icon, color, description) = match self {
            BadgeKind::Welcome => ("Welcome", "👋", "from-blue-500 to-cyan-500", "New Member"),
            BadgeKind::GoldenDonor => (
                "Golden Donor",
                "🏆",
                "from-yellow-500 to-amber-500",
                "First Donation Complete",
            ),
            BadgeKind::LifeSaver => ("Life Saver", "❤️", "from-red-500 to-pink-500", "Ready to Help"),
        };
        Badge {
            kind: self,
            name,
            icon,
            color,
            description,
        }
    }
}

/// Welcome always, then Golden Donor once a donation is on record, then
/// Life Saver while the donor is available.
pub fn derive_badges(donor: &Donor) -> Vec<Badge> {
    let mut badges = vec![BadgeKind::Welcome.badge()];
    if donor.last_donation_date.is_some() {
        badges.push(BadgeKind::GoldenDonor.badge());
    }
    if donor.available_to_donate {
        badges.push(BadgeKind::LifeSaver.badge());
    }
    badges
}
