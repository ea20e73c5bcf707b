/// Upper bounds (exclusive) of the milestone bands, paired with the sentence
/// shown while the odometer is inside that band.
const MILESTONES: [(u32, &str); 7] = [
    (
        5_000,
        "Next milestone at 5,000 km: check oil level, leaks and tyres.",
    ),
    (
        10_000,
        "Next milestone at 10,000 km: wheel alignment, balancing and tyre rotation.",
    ),
    (
        15_000,
        "Next milestone at 15,000 km: oil and filter change, brake and battery check.",
    ),
    (
        30_000,
        "Next milestone at 30,000 km: replace brake pads and inspect discs.",
    ),
    (
        40_000,
        "Next milestone at 40,000 km: spark plugs and ignition system on petrol engines.",
    ),
    (
        60_000,
        "Next milestone at 60,000 km: air and fuel filters, timing belt inspection.",
    ),
    (
        80_000,
        "Next milestone at 80,000 km: coolant replacement and water pump inspection.",
    ),
];

const BEYOND_LAST_MILESTONE: &str =
    "Past 80,000 km: timing belt replacement is due by 100,000 km; keep a full service every 15,000 km.";

/// Human-readable description of the next maintenance milestone.
///
/// Depends only on mileage.
pub fn summarize_next_milestone(mileage_km: u32) -> &'static str {
    MILESTONES
        .iter()
        .find(|(limit, _)| mileage_km < *limit)
        .map(|(_, sentence)| *sentence)
        .unwrap_or(BEYOND_LAST_MILESTONE)
}
