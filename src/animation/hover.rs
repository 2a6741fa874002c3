//! Hover highlight with eased brightness.
//!
//! The highlighted entity and the brightness are tracked separately: an
//! entity the pointer just left keeps fading out while the new one fades in.

use crate::core::types::EntityId;

#[derive(Debug, Clone)]
pub struct HoverState {
    target: Option<EntityId>,
    levels: Vec<(EntityId, f32)>,
    fade_per_sec: f32,
}

impl HoverState {
    pub fn new(fade_per_sec: f32) -> Self {
        Self {
            target: None,
            levels: Vec::new(),
            fade_per_sec,
        }
    }

    pub fn target(&self) -> Option<&EntityId> {
        self.target.as_ref()
    }

    pub fn set_target(&mut self, target: Option<EntityId>) {
        if let Some(id) = &target {
            if !self.levels.iter().any(|(e, _)| e == id) {
                self.levels.push((id.clone(), 0.0));
            }
        }
        self.target = target;
    }

    /// Brightness in [0, 1]; zero for entities that are not fading.
    pub fn level(&self, id: &EntityId) -> f32 {
        self.levels
            .iter()
            .find(|(e, _)| e == id)
            .map(|(_, l)| *l)
            .unwrap_or(0.0)
    }

    /// Entities with non-zero brightness.
    pub fn lit(&self) -> impl Iterator<Item = (&EntityId, f32)> {
        self.levels.iter().map(|(id, l)| (id, *l))
    }

    pub fn update(&mut self, dt: f32) {
        let step = self.fade_per_sec * dt.max(0.0);
        let target = self.target.as_ref();
        for (id, level) in self.levels.iter_mut() {
            if Some(&*id) == target {
                *level = (*level + step).min(1.0);
            } else {
                *level = (*level - step).max(0.0);
            }
        }
        self.levels
            .retain(|(id, level)| *level > 0.0 || Some(id) == target);
    }

    pub fn clear(&mut self) {
        self.target = None;
        self.levels.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_in_and_out() {
        let mut hover = HoverState::new(5.0);
        let a = EntityId::from("a");
        let b = EntityId::from("b");

        hover.set_target(Some(a.clone()));
        hover.update(0.1);
        assert!((hover.level(&a) - 0.5).abs() < 1e-6);

        hover.set_target(Some(b.clone()));
        hover.update(0.1);
        assert!(hover.level(&a) < 1e-6);
        assert!((hover.level(&b) - 0.5).abs() < 1e-6);

        hover.set_target(None);
        hover.update(1.0);
        assert_eq!(hover.lit().count(), 0);
    }

    #[test]
    fn test_level_saturates() {
        let mut hover = HoverState::new(6.0);
        let a = EntityId::from("a");
        hover.set_target(Some(a.clone()));
        hover.update(10.0);
        assert_eq!(hover.level(&a), 1.0);
    }
}
