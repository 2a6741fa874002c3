//! Name labels and city markers, tiered by zoom and population.

use ordered_float::OrderedFloat;
use std::cmp::Reverse;

use crate::core::config::LabelConfig;
use crate::core::types::{EntityId, GeoCoord};
use crate::world::geometry::GeometryStore;
use crate::world::snapshot::WorldSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub entity: EntityId,
    pub text: String,
    pub anchor: GeoCoord,
    pub population: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Capital,
    City,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityMarker {
    pub name: String,
    pub coord: GeoCoord,
    pub kind: MarkerKind,
    pub population: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSet {
    pub labels: Vec<Label>,
    pub markers: Vec<CityMarker>,
}

/// Minimum population for a name label at `zoom`, or `None` when zoomed out
/// below the first rung.
pub fn population_threshold(zoom: f32, config: &LabelConfig) -> Option<u64> {
    config
        .ladder
        .iter()
        .filter(|rung| zoom >= rung.min_zoom)
        .max_by_key(|rung| OrderedFloat(rung.min_zoom))
        .map(|rung| rung.min_population)
}

/// Labels ranked by population (larger geographic extent breaks ties),
/// capped at `max_labels`; markers capitals first.
pub fn select_labels(
    snapshot: &WorldSnapshot,
    store: &GeometryStore,
    zoom: f32,
    config: &LabelConfig,
) -> LabelSet {
    let mut set = LabelSet::default();

    if let Some(threshold) = population_threshold(zoom, config) {
        let mut ranked: Vec<(Label, f64)> = snapshot
            .entities()
            .iter()
            .filter(|e| e.attributes.population >= threshold)
            .filter_map(|e| {
                let geometry = store.get(&e.id).filter(|g| g.shape.is_some())?;
                let extent = geometry.bounds.map(|b| b.width() * b.height()).unwrap_or(0.0);
                Some((
                    Label {
                        entity: e.id.clone(),
                        text: e.name.clone(),
                        anchor: geometry.centroid,
                        population: e.attributes.population,
                    },
                    extent,
                ))
            })
            .collect();
        ranked.sort_by_key(|(label, extent)| (Reverse(label.population), Reverse(OrderedFloat(*extent))));
        set.labels = ranked
            .into_iter()
            .take(config.max_labels)
            .map(|(label, _)| label)
            .collect();
    }

    let show_capitals = zoom >= config.capital_marker_zoom;
    let show_cities = zoom >= config.city_marker_zoom;
    if show_capitals || show_cities {
        let mut markers: Vec<CityMarker> = snapshot
            .entities()
            .iter()
            .flat_map(|e| e.cities.iter())
            .filter(|c| c.coord.is_valid() && (show_cities || c.capital))
            .map(|c| CityMarker {
                name: c.name.clone(),
                coord: c.coord,
                kind: if c.capital { MarkerKind::Capital } else { MarkerKind::City },
                population: c.population,
            })
            .collect();
        markers.sort_by_key(|m| (m.kind != MarkerKind::Capital, Reverse(m.population)));
        markers.truncate(config.max_labels);
        set.markers = markers;
    }

    set
}
