//! # Entity Store
//!
//! Entities are identifiers with an open set of attached components and tags.
//!
//! ## Storage
//! Every entity owns one [`Components`] record holding an optional slot per
//! component type, plus a bitmask of occupied slots. Queries test the mask, so
//! a capability-set query is a single AND per entity.
//!
//! Records are kept in creation order and ids are never reused, so lookups are
//! a binary search and query results come back in creation order.
//!
//! ## Removal
//! [`EntityStore::remove`] only marks an entity. It drops out of queries at
//! once but keeps its components until [`EntityStore::reap`] runs at the end of
//! the tick, so a system iterating a query snapshot never sees storage shift.

use std::fmt;

pub mod components;
pub mod events;

use components::*;

/// Tag carried by the player entity.
pub const PLAYER_TAG: &str = "player";
/// Tag carried by hostile mobs.
pub const MOB_TAG: &str = "mob";
/// Tag carried by doors.
pub const DOOR_TAG: &str = "door";
/// Tag carried by pickups.
pub const ITEM_TAG: &str = "item";

/// Unique identifier for an entity.
///
/// Ids are handed out in increasing order and never reused, so a stale id
/// held by a deferred callback can never alias a newer entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bitmask of attached component kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComponentMask(u32);

impl ComponentMask {
    /// Mask of a set of kinds.
    pub fn of(kinds: &[ComponentKind]) -> Self {
        ComponentMask(kinds.iter().fold(0, |mask, kind| mask | kind.bit()))
    }

    /// Whether every kind of `other` is also in `self`.
    #[inline]
    pub fn contains(self, other: ComponentMask) -> bool {
        self.0 & other.0 == other.0
    }

    fn insert(&mut self, kind: ComponentKind) {
        self.0 |= kind.bit();
    }

    fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !kind.bit();
    }
}

/// A type that can be attached to an entity.
///
/// Implemented for every type listed in the component table below.
pub trait Component: Sized + 'static {
    /// The kind bit used by queries.
    const KIND: ComponentKind;

    /// This component's slot in a record.
    fn slot(components: &Components) -> &Option<Self>;

    /// This component's slot in a record, mutably.
    fn slot_mut(components: &mut Components) -> &mut Option<Self>;
}

macro_rules! declare_components {
    ($($kind:ident => $field:ident : $ty:ty),* $(,)?) => {
        /// Every kind of component an entity can carry.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum ComponentKind {
            $(
                #[allow(missing_docs)]
                $kind,
            )*
        }

        impl ComponentKind {
            #[inline]
            fn bit(self) -> u32 {
                1 << self as u32
            }
        }

        /// The component slots of one entity.
        #[derive(Debug, Default)]
        pub struct Components {
            $(
                #[allow(missing_docs)]
                pub $field: Option<$ty>,
            )*
        }

        $(
            impl Component for $ty {
                const KIND: ComponentKind = ComponentKind::$kind;

                #[inline]
                fn slot(components: &Components) -> &Option<Self> {
                    &components.$field
                }

                #[inline]
                fn slot_mut(components: &mut Components) -> &mut Option<Self> {
                    &mut components.$field
                }
            }
        )*
    };
}

declare_components! {
    Physics => physics: Physics,
    PhysicsCone => physics_cone: PhysicsCone,
    Health => health: Health,
    Mana => mana: Mana,
    MobAi => mob_ai: MobAi,
    Door => door: Door,
    Item => item: Item,
    TextHolder => text_holder: TextHolder,
    Lexicon => lexicon: Lexicon,
    Text3D => text_3d: Text3D,
    TextProjectile => text_projectile: TextProjectile,
    ParticleEffect => particle_effect: ParticleEffect,
    CameraController => camera_controller: CameraController,
    Experience => experience: Experience,
    Inventory => inventory: Inventory,
}

#[derive(Debug)]
struct EntityRecord {
    id: EntityId,
    mask: ComponentMask,
    tags: Vec<&'static str>,
    doomed: bool,
    components: Components,
}

/// Owns every entity and its components.
#[derive(Debug, Default)]
pub struct EntityStore {
    next_id: u64,
    records: Vec<EntityRecord>,
}

impl EntityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an entity with no components.
    pub fn create_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.records.push(EntityRecord {
            id,
            mask: ComponentMask::default(),
            tags: Vec::new(),
            doomed: false,
            components: Components::default(),
        });
        id
    }

    fn position(&self, id: EntityId) -> Option<usize> {
        self.records.binary_search_by_key(&id, |record| record.id).ok()
    }

    fn record(&self, id: EntityId) -> Option<&EntityRecord> {
        self.position(id).map(|index| &self.records[index])
    }

    fn record_mut(&mut self, id: EntityId) -> Option<&mut EntityRecord> {
        self.position(id).map(|index| &mut self.records[index])
    }

    /// Attaches a component, replacing any previous one of the same type.
    ///
    /// Returns `false` if the entity does not exist.
    pub fn add_component<C: Component>(&mut self, id: EntityId, component: C) -> bool {
        match self.record_mut(id) {
            Some(record) => {
                *C::slot_mut(&mut record.components) = Some(component);
                record.mask.insert(C::KIND);
                true
            }
            None => false,
        }
    }

    /// Detaches and returns a component.
    pub fn remove_component<C: Component>(&mut self, id: EntityId) -> Option<C> {
        let record = self.record_mut(id)?;
        record.mask.remove(C::KIND);
        C::slot_mut(&mut record.components).take()
    }

    /// Borrows a component.
    pub fn get<C: Component>(&self, id: EntityId) -> Option<&C> {
        C::slot(&self.record(id)?.components).as_ref()
    }

    /// Borrows a component mutably.
    pub fn get_mut<C: Component>(&mut self, id: EntityId) -> Option<&mut C> {
        C::slot_mut(&mut self.record_mut(id)?.components).as_mut()
    }

    /// Whether the entity carries a component.
    pub fn has<C: Component>(&self, id: EntityId) -> bool {
        self.record(id)
            .is_some_and(|record| record.mask.contains(ComponentMask::of(&[C::KIND])))
    }

    /// Adds a tag to an entity.
    pub fn add_tag(&mut self, id: EntityId, tag: &'static str) {
        if let Some(record) = self.record_mut(id) {
            if !record.tags.contains(&tag) {
                record.tags.push(tag);
            }
        }
    }

    /// Whether the entity carries a tag.
    pub fn has_tag(&self, id: EntityId, tag: &str) -> bool {
        self.record(id)
            .is_some_and(|record| record.tags.iter().any(|t| *t == tag))
    }

    /// Live entities carrying every kind in `kinds`, in creation order.
    ///
    /// The result is a snapshot; entities created or removed while it is
    /// being walked do not disturb it.
    pub fn query(&self, kinds: &[ComponentKind]) -> Vec<EntityId> {
        let mask = ComponentMask::of(kinds);
        self.records
            .iter()
            .filter(|record| !record.doomed && record.mask.contains(mask))
            .map(|record| record.id)
            .collect()
    }

    /// Live entities carrying a tag, in creation order.
    pub fn query_tag(&self, tag: &str) -> Vec<EntityId> {
        self.records
            .iter()
            .filter(|record| !record.doomed && record.tags.iter().any(|t| *t == tag))
            .map(|record| record.id)
            .collect()
    }

    /// First live entity carrying a tag.
    pub fn first_tagged(&self, tag: &str) -> Option<EntityId> {
        self.records
            .iter()
            .find(|record| !record.doomed && record.tags.iter().any(|t| *t == tag))
            .map(|record| record.id)
    }

    /// Marks an entity for removal at the next [`EntityStore::reap`].
    ///
    /// Returns `false` if the entity was already gone or marked.
    pub fn remove(&mut self, id: EntityId) -> bool {
        match self.record_mut(id) {
            Some(record) if !record.doomed => {
                record.doomed = true;
                true
            }
            _ => false,
        }
    }

    /// Whether the entity exists and is not marked for removal.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.record(id).is_some_and(|record| !record.doomed)
    }

    /// Whether the entity still has storage, marked or not.
    pub fn contains(&self, id: EntityId) -> bool {
        self.position(id).is_some()
    }

    /// Drops every marked entity with its components and returns their ids.
    pub fn reap(&mut self) -> Vec<EntityId> {
        let mut reaped = Vec::new();
        self.records.retain(|record| {
            if record.doomed {
                reaped.push(record.id);
            }
            !record.doomed
        });
        reaped
    }

    /// Marks every entity for removal.
    pub fn remove_all(&mut self) {
        for record in &mut self.records {
            record.doomed = true;
        }
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.records.iter().filter(|record| !record.doomed).count()
    }

    /// Whether there are no live entities.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
