//! Place/county resolution into the canonical jurisdiction set.

use std::collections::{BTreeMap, BTreeSet};

use geo::{Area, BooleanOps, MultiPolygon};
use rhna_geography_models::fips::normalize_geoid;
use rhna_geography_models::{
    GeographyLevel, Jurisdiction, JurisdictionKind, MatchReport, ResolutionGap,
};
use rhna_housing_models::County;
use rhna_source_models::{BoundaryLayer, JurisdictionTargets, NameAliases};
use rhna_spatial::{SpatialIndex, union_all};

use crate::GeoError;
use crate::crs::reproject;

/// Smallest unincorporated remainder kept, as a fraction of county area.
pub const DEFAULT_MIN_REMAINDER_FRACTION: f64 = 1e-4;

/// Knobs for [`resolve`].
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Place-name aliases applied before matching against targets.
    pub aliases: NameAliases,
    /// Place GEOIDs to ignore (e.g. a CDP that shares a city's name).
    pub excluded_place_geoids: BTreeSet<String>,
    /// Remainders smaller than this fraction of their county's area are
    /// treated as slivers and dropped.
    pub min_remainder_fraction: f64,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            aliases: NameAliases::default(),
            excluded_place_geoids: BTreeSet::new(),
            min_remainder_fraction: DEFAULT_MIN_REMAINDER_FRACTION,
        }
    }
}

/// Output of [`resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Resolved jurisdictions sorted by name, cities and remainders alike.
    pub jurisdictions: Vec<Jurisdiction>,
    /// Jurisdictions that resolved partially or not at all.
    pub gaps: Vec<ResolutionGap>,
    /// Target names against resolved and leftover place names.
    pub match_report: MatchReport,
}

/// A place feature that survived clipping and matched a target name.
struct Candidate {
    geoid: String,
    geometry: MultiPolygon<f64>,
    area: f64,
}

/// Resolves census boundaries into jurisdictions.
///
/// Places are reprojected into the county layer's CRS, clipped to the union
/// of the Bay Area counties and matched by canonical name against
/// `targets`. Each county named in `targets` gets an unincorporated
/// remainder: its polygon minus every resolved city.
///
/// # Errors
///
/// * [`GeoError::EmptyStudyArea`] if the county layer has no Bay Area
///   county
/// * [`GeoError::MissingCounty`] if a county named in `targets` has no
///   boundary
pub fn resolve(
    places: &BoundaryLayer,
    counties: &BoundaryLayer,
    targets: &[JurisdictionTargets],
    options: &ResolveOptions,
) -> Result<Resolution, GeoError> {
    let county_shapes = bay_area_counties(counties);
    if county_shapes.is_empty() {
        return Err(GeoError::EmptyStudyArea);
    }

    let target_counties: BTreeMap<&str, County> = targets
        .iter()
        .map(|t| (t.jurisdiction.as_str(), t.county))
        .collect();
    let referenced: BTreeSet<County> = target_counties.values().copied().collect();

    for county in &referenced {
        if !county_shapes.contains_key(county) {
            return Err(GeoError::MissingCounty { county: *county });
        }
    }

    let study_area = union_all(county_shapes.values());
    if study_area.unsigned_area() <= 0.0 {
        return Err(GeoError::EmptyStudyArea);
    }
    let county_index = SpatialIndex::new(
        county_shapes
            .iter()
            .map(|(county, shape)| (county.geoid(), shape.clone())),
    );

    let excluded: BTreeSet<String> = options
        .excluded_place_geoids
        .iter()
        .map(|g| place_geoid(g))
        .collect();

    let mut gaps = Vec::new();
    let mut extras = BTreeSet::new();
    let mut candidates: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();

    for feature in &places.features {
        let geoid = place_geoid(&feature.geoid);
        if excluded.contains(&geoid) {
            log::debug!("Skipping excluded place {} ({geoid})", feature.name);
            continue;
        }

        let name = options.aliases.canonical(&feature.name).to_string();
        let projected = reproject(&feature.geometry, places.crs, counties.crs);
        let clipped = projected.intersection(&study_area);
        let area = clipped.unsigned_area();
        let is_target = target_counties.contains_key(name.as_str());

        if area <= 0.0 {
            if is_target {
                gaps.push(ResolutionGap::EmptyGeometry {
                    jurisdiction: name,
                    geoid,
                });
            }
            continue;
        }

        if is_target {
            candidates.entry(name).or_default().push(Candidate {
                geoid,
                geometry: clipped,
                area,
            });
        } else {
            extras.insert(name);
        }
    }

    let mut jurisdictions = Vec::new();

    for (name, mut group) in candidates {
        group.sort_by(|a, b| b.area.total_cmp(&a.area).then_with(|| a.geoid.cmp(&b.geoid)));

        if group.len() > 1 {
            let mut geoids: Vec<String> = group.iter().map(|c| c.geoid.clone()).collect();
            geoids.sort_unstable();
            log::warn!("{} places named {name}, keeping {}", group.len(), group[0].geoid);
            gaps.push(ResolutionGap::AmbiguousName {
                jurisdiction: name.clone(),
                geoids,
                kept: group[0].geoid.clone(),
            });
        }

        let kept = group.swap_remove(0);
        let Some(&county) = target_counties.get(name.as_str()) else {
            continue;
        };

        let county_geoid = county.geoid();
        if let Some(overlap) = county_index.largest_overlap(&kept.geometry) {
            if overlap != county_geoid {
                log::warn!("{name} is listed under {county} but mostly lies in county {overlap}");
            }
        }

        jurisdictions.push(Jurisdiction {
            name,
            county,
            kind: JurisdictionKind::Incorporated,
            geoid: kept.geoid,
            geometry: kept.geometry,
            demographics: None,
        });
    }

    let resolved: BTreeSet<&str> = jurisdictions.iter().map(|j| j.name.as_str()).collect();
    gaps.retain(|gap| {
        !matches!(gap, ResolutionGap::EmptyGeometry { .. }) || !resolved.contains(gap.jurisdiction())
    });
    let unincorporated_names: BTreeMap<County, String> = referenced
        .iter()
        .map(|&county| {
            let name = county.unincorporated_name();
            (county, options.aliases.canonical(&name).to_string())
        })
        .collect();
    let remainder_names: BTreeSet<&str> =
        unincorporated_names.values().map(String::as_str).collect();

    for (name, county) in &target_counties {
        if resolved.contains(name) || remainder_names.contains(name) {
            continue;
        }
        if gaps.iter().any(|g| g.jurisdiction() == *name) {
            continue;
        }
        log::warn!("No place boundary for {name} ({county})");
        gaps.push(ResolutionGap::MissingGeometry {
            jurisdiction: (*name).to_string(),
            county: *county,
        });
    }

    let city_index = SpatialIndex::new(
        jurisdictions
            .iter()
            .map(|j| (j.name.clone(), j.geometry.clone())),
    );

    let mut remainders = Vec::new();
    for (county, name) in unincorporated_names {
        let Some(shape) = county_shapes.get(&county) else {
            continue;
        };
        let remainder = shape.difference(&city_index.union_intersecting(shape));
        let threshold = shape.unsigned_area() * options.min_remainder_fraction;

        if remainder.unsigned_area() < threshold {
            log::info!("{county} is fully incorporated, dropping remainder");
            if target_counties.contains_key(name.as_str()) {
                gaps.push(ResolutionGap::NoRemainder {
                    jurisdiction: name,
                    county,
                });
            }
            continue;
        }

        remainders.push(Jurisdiction {
            name,
            county,
            kind: JurisdictionKind::Unincorporated,
            geoid: county.geoid(),
            geometry: remainder,
            demographics: None,
        });
    }

    jurisdictions.extend(remainders);
    jurisdictions.sort_by(|a, b| a.name.cmp(&b.name));

    let match_report = MatchReport::between(
        target_counties.keys().copied(),
        jurisdictions
            .iter()
            .map(|j| j.name.as_str())
            .chain(extras.iter().map(String::as_str)),
    );

    log::info!(
        "Resolved {} jurisdictions ({} gaps, {} unmatched targets, {} extra places)",
        jurisdictions.len(),
        gaps.len(),
        match_report.missing.len(),
        match_report.extra.len()
    );

    Ok(Resolution {
        jurisdictions,
        gaps,
        match_report,
    })
}

/// Bay Area county polygons keyed by county. Features are identified by
/// GEOID first, then by name; duplicates are unioned.
fn bay_area_counties(layer: &BoundaryLayer) -> BTreeMap<County, MultiPolygon<f64>> {
    let mut shapes: BTreeMap<County, MultiPolygon<f64>> = BTreeMap::new();

    for feature in &layer.features {
        let Some(county) =
            County::from_fips(&feature.geoid).or_else(|| County::from_name(&feature.name))
        else {
            continue;
        };

        shapes
            .entry(county)
            .and_modify(|shape| *shape = shape.union(&feature.geometry))
            .or_insert_with(|| feature.geometry.clone());
    }

    shapes
}

/// Zero-padded place GEOID, or the raw value when it is not numeric.
fn place_geoid(raw: &str) -> String {
    normalize_geoid(raw, GeographyLevel::Place).unwrap_or_else(|| raw.trim().to_string())
}
