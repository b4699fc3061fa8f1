//! Between-level upgrade picks.

use mayhem_core::sim::UpgradeKind;

/// Most wanted first.
pub const UPGRADE_PREFERENCE: [UpgradeKind; 6] = [
    UpgradeKind::ExtraAmmo,
    UpgradeKind::MoveSpeed,
    UpgradeKind::ShotSpeed,
    UpgradeKind::SizeReduction,
    UpgradeKind::ExtraArrows,
    UpgradeKind::ExtraLife,
];

/// Lives at or below this force an extra-life pick when one is offered.
pub const CRITICAL_LIVES: i32 = 1;

fn preference_rank(kind: UpgradeKind) -> usize {
    UPGRADE_PREFERENCE
        .iter()
        .position(|candidate| *candidate == kind)
        .unwrap_or(UPGRADE_PREFERENCE.len())
}

/// Index of the offer to accept, `None` when nothing is offered.
pub fn choose_upgrade(offers: &[UpgradeKind], lives: i32) -> Option<usize> {
    if lives <= CRITICAL_LIVES {
        if let Some(index) = offers.iter().position(|kind| *kind == UpgradeKind::ExtraLife) {
            return Some(index);
        }
    }
    offers
        .iter()
        .enumerate()
        .min_by_key(|(index, kind)| (preference_rank(**kind), *index))
        .map(|(index, _)| index)
}
