//! Greedy nearest-neighbour tour over the selected facilities.
//!
//! Each step moves to the closest facility not yet visited. This is a
//! heuristic; the resulting order is not guaranteed to be the shortest.

use tracing::{debug, info};

use crate::error::PlanError;
use crate::facility::FacilitySet;
use crate::graph::{Coord, EntityId};
use crate::haversine::{haversine_km, path_length_km};
use crate::resolver::PositionIndex;

/// Visiting order over the facilities, starting at the chosen one.
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    ids: Vec<EntityId>,
    excluded: Vec<EntityId>,
}

impl Tour {
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn start(&self) -> Option<&EntityId> {
        self.ids.first()
    }

    /// Facilities left out because they have no coordinate.
    pub fn excluded(&self) -> &[EntityId] {
        &self.excluded
    }

    /// Consecutive `(from, to)` hops.
    pub fn pairs(&self) -> impl Iterator<Item = (&EntityId, &EntityId)> {
        self.ids.windows(2).map(|pair| (&pair[0], &pair[1]))
    }

    /// Great-circle length of the whole tour.
    pub fn straight_line_km(&self, positions: &PositionIndex) -> f64 {
        let coords: Vec<Coord> = self.ids.iter().filter_map(|id| positions.get(id)).collect();
        path_length_km(&coords)
    }
}

/// Builds a tour from `start` over every facility with a known position.
///
/// Facilities without a coordinate are dropped before planning and listed
/// in [`Tour::excluded`]. Ties go to the facility listed first.
pub fn plan_tour(
    start: &EntityId,
    facilities: &FacilitySet,
    positions: &PositionIndex,
) -> Result<Tour, PlanError> {
    if !facilities.contains(start) {
        return Err(PlanError::InvalidStartSelection(start.clone()));
    }
    let Some(mut current) = positions.get(start) else {
        return Err(PlanError::UnresolvableStart(start.clone()));
    };

    let mut excluded = Vec::new();
    let mut remaining: Vec<(&EntityId, Coord)> = Vec::with_capacity(facilities.len());
    for id in facilities.ids() {
        match positions.get(id) {
            Some(coord) if id != start => remaining.push((id, coord)),
            Some(_) => {}
            None => excluded.push(id.clone()),
        }
    }
    if !excluded.is_empty() {
        info!(excluded = excluded.len(), "facilities without coordinates left out of the tour");
    }

    let mut ids = Vec::with_capacity(remaining.len() + 1);
    ids.push(start.clone());

    loop {
        let Some((next_index, distance)) = remaining
            .iter()
            .enumerate()
            .map(|(i, (_, coord))| (i, haversine_km(current, *coord)))
            // `min_by` keeps the first of equal elements.
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
        else {
            break;
        };

        let (next, coord) = remaining.remove(next_index);
        debug!(from = %ids[ids.len() - 1], to = %next, km = distance, "tour step");
        ids.push(next.clone());
        current = coord;
    }

    Ok(Tour { ids, excluded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facility::select_facilities;
    use crate::facility::FacilityQuery;
    use crate::graph::{Entity, Graph};
    use std::collections::HashMap;

    fn facilities(ids: &[&str]) -> FacilitySet {
        let mut graph = Graph::new();
        for id in ids {
            let mut tags = HashMap::new();
            tags.insert("amenity".to_string(), "hospital".to_string());
            graph.upsert(Entity::new(EntityId::node(*id), tags));
        }
        select_facilities(&graph, &FacilityQuery::default())
    }

    fn positions(coords: &[(&str, f64, f64)]) -> PositionIndex {
        coords
            .iter()
            .map(|(id, lat, lon)| (EntityId::node(*id), Coord::new(*lat, *lon)))
            .collect()
    }

    fn raw(tour: &Tour) -> Vec<&str> {
        tour.ids().iter().map(EntityId::raw).collect()
    }

    #[test]
    fn test_nearest_neighbour_order() {
        // d(S,F2) < d(S,F1) < d(S,F3) and d(F2,F1) < d(F2,F3)
        let set = facilities(&["S", "F1", "F2", "F3"]);
        let pos = positions(&[
            ("S", 0.0, 0.0),
            ("F1", 0.0, 2.0),
            ("F2", 0.0, 1.0),
            ("F3", 0.0, -3.0),
        ]);
        let tour = plan_tour(&EntityId::node("S"), &set, &pos).unwrap();
        assert_eq!(raw(&tour), vec!["S", "F2", "F1", "F3"]);
    }

    #[test]
    fn test_ties_go_to_first_listed() {
        let set = facilities(&["S", "east", "west"]);
        let pos = positions(&[("S", 0.0, 0.0), ("east", 0.0, 1.0), ("west", 0.0, -1.0)]);
        let tour = plan_tour(&EntityId::node("S"), &set, &pos).unwrap();
        assert_eq!(raw(&tour), vec!["S", "east", "west"]);
    }

    #[test]
    fn test_unresolved_facilities_are_excluded() {
        let set = facilities(&["A", "B", "C"]);
        let pos = positions(&[("A", 0.0, 0.0), ("C", 0.0, 1.0)]);
        let tour = plan_tour(&EntityId::node("A"), &set, &pos).unwrap();
        assert_eq!(raw(&tour), vec!["A", "C"]);
        assert_eq!(tour.excluded(), &[EntityId::node("B")]);
    }

    #[test]
    fn test_start_outside_facilities_is_rejected() {
        let set = facilities(&["A"]);
        let pos = positions(&[("A", 0.0, 0.0), ("Z", 0.0, 0.0)]);
        let err = plan_tour(&EntityId::node("Z"), &set, &pos).unwrap_err();
        assert_eq!(err, PlanError::InvalidStartSelection(EntityId::node("Z")));
    }

    #[test]
    fn test_start_without_coordinate_is_rejected() {
        let set = facilities(&["A", "B"]);
        let pos = positions(&[("B", 0.0, 0.0)]);
        let err = plan_tour(&EntityId::node("A"), &set, &pos).unwrap_err();
        assert_eq!(err, PlanError::UnresolvableStart(EntityId::node("A")));
    }

    #[test]
    fn test_single_facility_tour() {
        let set = facilities(&["A"]);
        let pos = positions(&[("A", 10.0, 10.0)]);
        let tour = plan_tour(&EntityId::node("A"), &set, &pos).unwrap();
        assert_eq!(tour.len(), 1);
        assert_eq!(tour.pairs().count(), 0);
        assert_eq!(tour.straight_line_km(&pos), 0.0);
    }
}
