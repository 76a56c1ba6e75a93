//! NAIF body names and ID numbers for the bodies in DE4xx kernels

/// Pairs of (id, name) for solar system bodies
const TARGET_NAME_PAIRS: &[(i32, &str)] = &[
    (0, "SOLAR SYSTEM BARYCENTER"),
    (1, "MERCURY BARYCENTER"),
    (2, "VENUS BARYCENTER"),
    (3, "EARTH BARYCENTER"),
    (4, "MARS BARYCENTER"),
    (5, "JUPITER BARYCENTER"),
    (6, "SATURN BARYCENTER"),
    (7, "URANUS BARYCENTER"),
    (8, "NEPTUNE BARYCENTER"),
    (9, "PLUTO BARYCENTER"),
    (10, "SUN"),
    (199, "MERCURY"),
    (299, "VENUS"),
    (301, "MOON"),
    (399, "EARTH"),
    (499, "MARS"),
];

/// Aliases accepted in addition to the canonical names
const TARGET_ALIASES: &[(i32, &str)] = &[
    (0, "SSB"),
    (3, "EMB"),
    (3, "EARTH MOON BARYCENTER"),
    (5, "JUPITER"),
    (6, "SATURN"),
    (7, "URANUS"),
    (8, "NEPTUNE"),
    (9, "PLUTO"),
];

/// Get the canonical name of a target given its ID number
pub fn target_name(id: i32) -> Option<&'static str> {
    TARGET_NAME_PAIRS
        .iter()
        .find(|(code, _)| *code == id)
        .map(|(_, name)| *name)
}

/// Get the ID number of a target given its name (case-insensitive) or a
/// numeric string
pub fn target_id(name: &str) -> Option<i32> {
    let wanted = name.trim().replace('_', " ").to_uppercase();
    if let Ok(id) = wanted.parse::<i32>() {
        return Some(id);
    }
    TARGET_NAME_PAIRS
        .iter()
        .chain(TARGET_ALIASES)
        .find(|(_, candidate)| *candidate == wanted)
        .map(|(id, _)| *id)
}
