//! Cuisine catalog: regions and the cuisines that belong to them
//!
//! The catalog is the universe the diversity engine draws from. Order is
//! preserved as written (built-in list or `[[catalog.regions]]` in config).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{CookbotError, Result};

/// A named group of cuisines (e.g. a continent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub cuisines: Vec<String>,
}

impl Region {
    pub fn new(name: impl Into<String>, cuisines: &[&str]) -> Self {
        Self {
            name: name.into(),
            cuisines: cuisines.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn contains(&self, cuisine: &str) -> bool {
        self.cuisines.iter().any(|c| c == cuisine)
    }
}

/// Region -> cuisines mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuisineCatalog {
    pub regions: Vec<Region>,
}

impl CuisineCatalog {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    /// The catalog shipped with cookbot
    pub fn builtin() -> Self {
        Self::new(vec![
            Region::new(
                "Europe",
                &[
                    "Italian (Classic)",
                    "Italian (Sicily/South)",
                    "French (Provencal)",
                    "French (Bistro)",
                    "Spanish (Tapas/Paella)",
                    "Greek (Taverna)",
                    "Polish (Old Polish)",
                    "Polish (Milk Bar)",
                    "Ukrainian (Varenyky/Borscht)",
                    "Georgian (Supra)",
                    "Hungarian (Paprika)",
                    "German (Wurst/Kartoffel)",
                    "Scandinavian (Hygge)",
                    "Balkan (Grill)",
                ],
            ),
            Region::new(
                "Asia",
                &[
                    "Japanese (Ramen Shop)",
                    "Japanese (Home Cooking)",
                    "Chinese (Sichuan)",
                    "Chinese (Cantonese/Dim Sum)",
                    "Vietnamese (Street Food)",
                    "Thai (Curry/Pad Thai)",
                    "Indian (Curry House)",
                    "Korean (K-Drama Food)",
                    "Indonesian (Bali)",
                    "Turkish (Kebab/Meze)",
                    "Lebanese/Arabic",
                ],
            ),
            Region::new(
                "Americas",
                &[
                    "Mexican (Cantina)",
                    "Mexican (Tex-Mex)",
                    "USA (Southern BBQ)",
                    "USA (NYC Style)",
                    "USA (Cajun/Creole)",
                    "Brazilian",
                    "Argentinian",
                    "Peruvian",
                ],
            ),
            Region::new(
                "Comfort & Seasonal",
                &[
                    "Grandma's Kitchen (Comfort Food)",
                    "Taste of Autumn (Pumpkin/Mushroom)",
                ],
            ),
        ])
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Whether `cuisine` is a known cuisine in any region
    pub fn contains(&self, cuisine: &str) -> bool {
        self.regions.iter().any(|r| r.contains(cuisine))
    }

    /// Region of a cuisine; unknown cuisines fall into the last region
    pub fn region_of(&self, cuisine: &str) -> &str {
        self.regions
            .iter()
            .find(|r| r.contains(cuisine))
            .or_else(|| self.regions.last())
            .map(|r| r.name.as_str())
            .unwrap_or_default()
    }

    /// All cuisines, region by region
    pub fn cuisines(&self) -> impl Iterator<Item = &str> {
        self.regions
            .iter()
            .flat_map(|r| r.cuisines.iter().map(String::as_str))
    }

    /// Check the catalog can always yield a choice
    pub fn validate(&self) -> Result<()> {
        if self.regions.is_empty() {
            return Err(CookbotError::Config("catalog has no regions".to_string()));
        }

        let mut seen = HashSet::new();
        for region in &self.regions {
            if region.cuisines.is_empty() {
                return Err(CookbotError::Config(format!(
                    "catalog region '{}' has no cuisines",
                    region.name
                )));
            }
            for cuisine in &region.cuisines {
                if !seen.insert(cuisine.as_str()) {
                    return Err(CookbotError::Config(format!(
                        "cuisine '{}' appears in more than one place",
                        cuisine
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for CuisineCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
