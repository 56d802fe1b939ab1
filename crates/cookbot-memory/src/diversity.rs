//! Selection diversity: which cuisine to cook today
//!
//! A suggested cuisine wins when it is known and was not among the last
//! three picks. Otherwise a region is drawn from those not used recently, and
//! a cuisine from that region that was not used recently. Both draws fall
//! back to the full set when everything has been used.

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, info};

use cookbot_core::CuisineCatalog;

use crate::store::SessionMemory;

/// How many of the most recent cuisines block a suggestion
const SUGGESTION_COOLDOWN: usize = 3;

/// Choose today's cuisine
pub fn choose(
    suggested: Option<&str>,
    recent_cuisines: &[String],
    recent_regions: &[String],
    catalog: &CuisineCatalog,
) -> String {
    choose_with_rng(
        suggested,
        recent_cuisines,
        recent_regions,
        catalog,
        &mut rand::rng(),
    )
}

/// [`choose`] with an explicit random source
pub fn choose_with_rng<R: Rng + ?Sized>(
    suggested: Option<&str>,
    recent_cuisines: &[String],
    recent_regions: &[String],
    catalog: &CuisineCatalog,
    rng: &mut R,
) -> String {
    if let Some(cuisine) = suggested.and_then(|s| canonical_name(s, catalog)) {
        let blocked = recent_cuisines
            .iter()
            .take(SUGGESTION_COOLDOWN)
            .any(|c| c == cuisine);
        if !blocked {
            info!("Using suggested cuisine: {}", cuisine);
            return cuisine.to_string();
        }
        debug!("Suggested cuisine {} was served recently", cuisine);
    }

    let fresh_regions: Vec<_> = catalog
        .regions()
        .iter()
        .filter(|r| !recent_regions.contains(&r.name))
        .collect();
    let region_pool = if fresh_regions.is_empty() {
        catalog.regions().iter().collect()
    } else {
        fresh_regions
    };

    let Some(region) = region_pool.choose(rng) else {
        return suggested.unwrap_or_default().to_string();
    };
    info!(
        "Drew region {} (recent: {})",
        region.name,
        recent_regions.join(", ")
    );

    let fresh_cuisines: Vec<&String> = region
        .cuisines
        .iter()
        .filter(|c| !recent_cuisines.contains(*c))
        .collect();
    let cuisine_pool: Vec<&String> = if fresh_cuisines.is_empty() {
        region.cuisines.iter().collect()
    } else {
        fresh_cuisines
    };

    cuisine_pool
        .choose(rng)
        .map(|c| c.to_string())
        .unwrap_or_else(|| region.name.clone())
}

/// [`choose`] against the recent picks held in session memory
pub fn choose_for(memory: &SessionMemory, suggested: Option<&str>, catalog: &CuisineCatalog) -> String {
    choose(
        suggested,
        &memory.last_cuisines,
        &memory.last_regions,
        catalog,
    )
}

/// Catalog spelling of a cuisine name, matched case-insensitively
fn canonical_name<'a>(name: &str, catalog: &'a CuisineCatalog) -> Option<&'a str> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    catalog.cuisines().find(|c| c.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookbot_core::Region;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog() -> CuisineCatalog {
        CuisineCatalog::new(vec![
            Region::new("Europe", &["Italian", "Polish", "Greek"]),
            Region::new("Asia", &["Japanese", "Thai"]),
            Region::new("Special", &["Comfort"]),
        ])
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_suggestion_accepted() {
        let mut rng = StdRng::seed_from_u64(1);
        let chosen = choose_with_rng(
            Some("thai"),
            &strings(&["Italian"]),
            &[],
            &catalog(),
            &mut rng,
        );
        assert_eq!(chosen, "Thai");
    }

    #[test]
    fn test_recent_suggestion_rejected() {
        let catalog = catalog();
        let recent = strings(&["Polish", "Greek", "Thai"]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = choose_with_rng(Some("Thai"), &recent, &[], &catalog, &mut rng);
            // Thai can only come back through the Asia fallback draw, which excludes it
            assert_ne!(chosen, "Thai");
            assert!(catalog.contains(&chosen));
        }
    }

    #[test]
    fn test_suggestion_outside_cooldown_window_accepted() {
        let mut rng = StdRng::seed_from_u64(3);
        let recent = strings(&["Polish", "Greek", "Italian", "Thai"]);
        let chosen = choose_with_rng(Some("Thai"), &recent, &[], &catalog(), &mut rng);
        assert_eq!(chosen, "Thai");
    }

    #[test]
    fn test_unknown_suggestion_ignored() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(4);
        let chosen = choose_with_rng(Some("Martian"), &[], &[], &catalog, &mut rng);
        assert!(catalog.contains(&chosen));
    }

    #[test]
    fn test_recent_regions_avoided() {
        let catalog = catalog();
        let recent_regions = strings(&["Europe", "Asia"]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = choose_with_rng(None, &[], &recent_regions, &catalog, &mut rng);
            assert_eq!(chosen, "Comfort");
        }
    }

    #[test]
    fn test_recent_cuisines_avoided_within_region() {
        let catalog = catalog();
        let recent_regions = strings(&["Asia", "Special"]);
        let recent = strings(&["Italian", "Polish"]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = choose_with_rng(None, &recent, &recent_regions, &catalog, &mut rng);
            assert_eq!(chosen, "Greek");
        }
    }

    #[test]
    fn test_saturated_history_still_chooses() {
        let catalog = catalog();
        let all_cuisines: Vec<String> = catalog.cuisines().map(str::to_string).collect();
        let all_regions = strings(&["Europe", "Asia", "Special"]);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = choose_with_rng(None, &all_cuisines, &all_regions, &catalog, &mut rng);
            assert!(catalog.contains(&chosen));
        }
    }

    #[test]
    fn test_empty_catalog_never_panics() {
        let empty = CuisineCatalog::new(vec![]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(choose_with_rng(None, &[], &[], &empty, &mut rng), "");
    }

    #[test]
    fn test_choose_for_reads_memory() {
        let catalog = catalog();
        let mut memory = SessionMemory::default();
        memory.record_region("Europe");
        memory.record_region("Asia");
        assert_eq!(choose_for(&memory, None, &catalog), "Comfort");
    }
}
