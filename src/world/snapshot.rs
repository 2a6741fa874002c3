//! The in-memory world snapshot read by the engine once per event or frame.

use ahash::AHashMap;

use crate::core::types::{EntityId, FactionId};
use crate::theme::Color;
use crate::world::entity::{DiplomaticRelation, EntityGroup, Faction, GeographicEntity, RelationKind};

/// Ownership-only update from the turn engine, applied between frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnershipUpdate {
    pub changes: Vec<(EntityId, Option<FactionId>)>,
}

impl OwnershipUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, entity: impl Into<String>, owner: Option<&str>) -> Self {
        self.changes.push((EntityId::new(entity), owner.map(FactionId::from)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Entities, factions and relations as supplied by the host.
///
/// Entities and factions sit behind accessors so the id indexes always match
/// the vectors they point into.
#[derive(Debug, Clone, Default)]
pub struct WorldSnapshot {
    entities: Vec<GeographicEntity>,
    factions: Vec<Faction>,
    pub relations: Vec<DiplomaticRelation>,
    pub groups: Vec<EntityGroup>,
    entity_index: AHashMap<EntityId, usize>,
    faction_index: AHashMap<FactionId, usize>,
    relation_index: AHashMap<(FactionId, FactionId), RelationKind>,
}

fn pair_key(a: &FactionId, b: &FactionId) -> (FactionId, FactionId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

impl WorldSnapshot {
    pub fn new(
        entities: Vec<GeographicEntity>,
        factions: Vec<Faction>,
        relations: Vec<DiplomaticRelation>,
    ) -> Self {
        let mut snapshot = Self {
            entities,
            factions,
            relations: Vec::new(),
            ..Default::default()
        };
        snapshot.reindex();
        snapshot.set_relations(relations);
        snapshot
    }

    pub fn with_groups(mut self, groups: Vec<EntityGroup>) -> Self {
        self.groups = groups;
        self
    }

    pub fn group(&self, id: &EntityId) -> Option<&EntityGroup> {
        self.groups.iter().find(|g| &g.id == id)
    }

    fn reindex(&mut self) {
        self.entity_index = self
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        self.faction_index = self
            .factions
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id.clone(), i))
            .collect();
    }

    pub fn entities(&self) -> &[GeographicEntity] {
        &self.entities
    }

    pub fn factions(&self) -> &[Faction] {
        &self.factions
    }

    pub fn entity(&self, id: &EntityId) -> Option<&GeographicEntity> {
        let &i = self.entity_index.get(id)?;
        self.entities.get(i).filter(|e| &e.id == id)
    }

    /// Mutable access to one entity's attributes. Changing `id` through this
    /// reference is not supported; use [`WorldSnapshot::replace_entities`].
    pub fn entity_mut(&mut self, id: &EntityId) -> Option<&mut GeographicEntity> {
        let &i = self.entity_index.get(id)?;
        self.entities.get_mut(i).filter(|e| &e.id == id)
    }

    pub fn push_entity(&mut self, entity: GeographicEntity) {
        self.entities.push(entity);
        self.reindex();
    }

    /// Keep only the entities matching `keep`.
    pub fn retain_entities(&mut self, keep: impl FnMut(&GeographicEntity) -> bool) {
        self.entities.retain(keep);
        self.reindex();
    }

    pub fn replace_entities(&mut self, entities: Vec<GeographicEntity>) {
        self.entities = entities;
        self.reindex();
    }

    pub fn owner_of(&self, id: &EntityId) -> Option<&FactionId> {
        self.entity(id).and_then(|e| e.owner.as_ref())
    }

    pub fn faction(&self, id: &FactionId) -> Option<&Faction> {
        let &i = self.faction_index.get(id)?;
        self.factions.get(i).filter(|f| &f.id == id)
    }

    /// Color of an owning faction; unknown factions draw neutral gray.
    pub fn owner_color(&self, owner: Option<&FactionId>) -> Option<Color> {
        owner.map(|o| self.faction(o).map(|f| f.color).unwrap_or(Color::NEUTRAL_GRAY))
    }

    /// Relationship between two factions regardless of order. Unlisted pairs
    /// and a faction with itself are neutral.
    pub fn relation(&self, a: &FactionId, b: &FactionId) -> RelationKind {
        if a == b {
            return RelationKind::Neutral;
        }
        self.relation_index
            .get(&pair_key(a, b))
            .copied()
            .unwrap_or_default()
    }

    /// Returns false if the entity is unknown.
    pub fn set_owner(&mut self, id: &EntityId, owner: Option<FactionId>) -> bool {
        match self.entity_mut(id) {
            Some(entity) => {
                entity.owner = owner;
                true
            }
            None => false,
        }
    }

    /// Apply an ownership update in order; later changes for the same entity win.
    /// Returns the number of changes that referenced a known entity.
    pub fn apply(&mut self, update: &OwnershipUpdate) -> usize {
        let mut applied = 0;
        for (id, owner) in &update.changes {
            if self.set_owner(id, owner.clone()) {
                applied += 1;
            } else {
                tracing::warn!("Ownership update for unknown entity {}", id);
            }
        }
        applied
    }

    pub fn set_relations(&mut self, relations: Vec<DiplomaticRelation>) {
        self.relation_index = relations
            .iter()
            .map(|r| (pair_key(&r.a, &r.b), r.kind))
            .collect();
        self.relations = relations;
    }

    pub fn set_factions(&mut self, factions: Vec<Faction>) {
        self.factions = factions;
        self.reindex();
    }

    /// Members of a higher-level grouping, in entity order.
    pub fn group_members<'a>(&'a self, group: &'a EntityId) -> impl Iterator<Item = &'a GeographicEntity> + 'a {
        self.entities
            .iter()
            .filter(move |e| e.group.as_ref() == Some(group))
    }

    /// Current owner of every entity, for transition diffing.
    pub fn owners(&self) -> impl Iterator<Item = (&EntityId, Option<&FactionId>)> {
        self.entities.iter().map(|e| (&e.id, e.owner.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, MultiPolygon};

    fn unit_square() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ]])
    }

    fn snapshot() -> WorldSnapshot {
        WorldSnapshot::new(
            vec![
                GeographicEntity::new("alpha", "Alpha", unit_square()).with_owner("a").with_group("g"),
                GeographicEntity::new("beta", "Beta", unit_square()).with_group("g"),
            ],
            vec![
                Faction::new("a", "A", Color::rgb(1.0, 0.0, 0.0)),
                Faction::new("b", "B", Color::rgb(0.0, 0.0, 1.0)),
            ],
            vec![DiplomaticRelation::new("b", "a", RelationKind::War)],
        )
    }

    #[test]
    fn test_relation_is_unordered() {
        let s = snapshot();
        assert_eq!(s.relation(&FactionId::from("a"), &FactionId::from("b")), RelationKind::War);
        assert_eq!(s.relation(&FactionId::from("b"), &FactionId::from("a")), RelationKind::War);
        assert_eq!(s.relation(&FactionId::from("a"), &FactionId::from("a")), RelationKind::Neutral);
        assert_eq!(s.relation(&FactionId::from("a"), &FactionId::from("zz")), RelationKind::Neutral);
    }

    #[test]
    fn test_apply_last_write_wins() {
        let mut s = snapshot();
        let update = OwnershipUpdate::new()
            .set("alpha", Some("b"))
            .set("alpha", None)
            .set("ghost", Some("a"));
        assert_eq!(s.apply(&update), 2);
        assert_eq!(s.owner_of(&EntityId::from("alpha")), None);
    }

    #[test]
    fn test_lookup_after_removing_entities() {
        let mut s = snapshot();
        s.retain_entities(|e| e.id.as_str() != "alpha");
        assert!(s.entity(&EntityId::from("alpha")).is_none());
        assert_eq!(s.entity(&EntityId::from("beta")).unwrap().name, "Beta");
        assert!(!s.set_owner(&EntityId::from("alpha"), None));

        s.push_entity(GeographicEntity::new("gamma", "Gamma", unit_square()));
        assert_eq!(s.entities().len(), 2);
        assert_eq!(s.entity(&EntityId::from("gamma")).unwrap().name, "Gamma");
    }

    #[test]
    fn test_group_members() {
        let s = snapshot();
        let group = EntityId::from("g");
        assert_eq!(s.group_members(&group).count(), 2);
    }
}
