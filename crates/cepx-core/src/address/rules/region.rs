//! State code to macro-region lookup.

use crate::models::Region;

/// Every state code (UF) and the federal district, with its region.
pub const STATE_REGIONS: &[(&str, Region)] = &[
    ("AC", Region::North),
    ("AP", Region::North),
    ("AM", Region::North),
    ("PA", Region::North),
    ("RO", Region::North),
    ("RR", Region::North),
    ("TO", Region::North),
    ("AL", Region::Northeast),
    ("BA", Region::Northeast),
    ("CE", Region::Northeast),
    ("MA", Region::Northeast),
    ("PB", Region::Northeast),
    ("PE", Region::Northeast),
    ("PI", Region::Northeast),
    ("RN", Region::Northeast),
    ("SE", Region::Northeast),
    ("DF", Region::CentralWest),
    ("GO", Region::CentralWest),
    ("MT", Region::CentralWest),
    ("MS", Region::CentralWest),
    ("ES", Region::Southeast),
    ("MG", Region::Southeast),
    ("RJ", Region::Southeast),
    ("SP", Region::Southeast),
    ("PR", Region::South),
    ("RS", Region::South),
    ("SC", Region::South),
];

/// Map a state code to its region; unknown or empty codes give `None`.
pub fn classify_region(state: &str) -> Option<Region> {
    let state = state.trim().to_uppercase();
    STATE_REGIONS
        .iter()
        .find(|(code, _)| *code == state)
        .map(|(_, region)| *region)
}

/// Whether `code` is a known state code.
pub fn is_state_code(code: &str) -> bool {
    classify_region(code).is_some()
}
