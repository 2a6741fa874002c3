//! Diplomatic border overlays.

use ahash::AHashMap;

use crate::core::types::EntityId;
use crate::world::entity::RelationKind;
use crate::world::snapshot::WorldSnapshot;

/// For every owned entity bordering a differently-owned neighbor, the
/// strongest relation between the two owners (War > Hostile > Allied).
///
/// Entities with no qualifying neighbor are omitted. Computed when the world
/// or the relations change, not per frame.
pub fn relation_overlays(snapshot: &WorldSnapshot) -> Vec<(EntityId, RelationKind)> {
    let mut strongest: AHashMap<&EntityId, RelationKind> = AHashMap::new();

    for entity in snapshot.entities() {
        let Some(owner) = entity.owner.as_ref() else {
            continue;
        };
        for neighbor_id in &entity.neighbors {
            let Some(neighbor_owner) = snapshot.owner_of(neighbor_id) else {
                continue;
            };
            if neighbor_owner == owner {
                continue;
            }
            let kind = snapshot.relation(owner, neighbor_owner);
            if kind.overlay_priority() == 0 {
                continue;
            }
            let slot = strongest.entry(&entity.id).or_insert(kind);
            if kind.overlay_priority() > slot.overlay_priority() {
                *slot = kind;
            }
        }
    }

    // Keep entity order so draw order is stable between frames.
    snapshot
        .entities()
        .iter()
        .filter_map(|e| strongest.get(&e.id).map(|kind| (e.id.clone(), *kind)))
        .collect()
}
