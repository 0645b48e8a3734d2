//! # Components
//!
//! Data records attached to entities. Behavior lives in the systems; the
//! methods here only keep each record's own invariants.

use std::{
    f32::consts::TAU,
    ops::{Deref, DerefMut},
};

use cgmath::{Point3, Vector3, Zero};

use super::EntityId;
use crate::core::dice::Dice;

/// Color of a buffer still accepting letters.
pub const TEXT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
/// Color of a buffer whose command succeeded.
pub const SUCCESS_COLOR: [f32; 3] = [0.1, 0.8, 0.1];
/// Color of a buffer whose command had no effect.
pub const FAILURE_COLOR: [f32; 3] = [0.5, 0.5, 0.5];
/// Color of a buffer that matched no word.
pub const INVALID_COLOR: [f32; 3] = [0.8, 0.1, 0.1];

/// Gravity-affected body colliding with the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Physics {
    /// Centre of the body in world space
    pub pos: Point3<f32>,
    /// Displacement per tick
    pub vel: Vector3<f32>,
    /// Extent along x
    pub width: f32,
    /// Extent along z
    pub length: f32,
    /// Extent along y
    pub height: f32,
    /// Weight in cone contacts
    pub mass: f32,
    /// Multiplier on world gravity
    pub gravity_scale: f32,
    /// Horizontal velocity kept per tick while on the ground
    pub friction: f32,
    /// Immovable bodies never keep any velocity
    pub movable: bool,
}

impl Default for Physics {
    fn default() -> Self {
        Physics {
            pos: Point3::new(0.0, 0.0, 0.0),
            vel: Vector3::zero(),
            width: 4.0,
            length: 4.0,
            height: 4.0,
            mass: 1.0,
            gravity_scale: 1.0,
            friction: 0.94,
            movable: true,
        }
    }
}

impl Physics {
    /// A default body at `pos`.
    pub fn at(pos: Point3<f32>) -> Self {
        Physics {
            pos,
            ..Default::default()
        }
    }

    /// Replaces the body's extents.
    pub fn with_size(mut self, width: f32, length: f32, height: f32) -> Self {
        self.width = width;
        self.length = length;
        self.height = height;
        self
    }

    /// Makes the body immovable.
    pub fn immovable(mut self) -> Self {
        self.movable = false;
        self
    }
}

/// Soft circular repulsion field used for entity separation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsCone {
    /// Radius of the field in the xz plane
    pub radius: f32,
}

/// What a call to [`Meter::damage`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The meter was already empty; nothing changed.
    Ignored,
    /// The meter dropped but is still above zero.
    Hurt,
    /// This hit emptied the meter.
    Killed,
}

/// A bounded amount, `amount <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meter {
    /// Current value; may go below zero on the killing hit
    pub amount: i32,
    /// Upper bound
    pub max: i32,
}

impl Meter {
    /// A full meter.
    pub fn new(max: i32) -> Self {
        Meter { amount: max, max }
    }

    /// Removes `amount`.
    ///
    /// An empty meter ignores further damage, so the killing outcome is
    /// reported exactly once. Amounts of zero or less are ignored too.
    pub fn damage(&mut self, amount: i32) -> DamageOutcome {
        if self.amount <= 0 || amount <= 0 {
            return DamageOutcome::Ignored;
        }
        self.amount -= amount;
        if self.amount <= 0 {
            DamageOutcome::Killed
        } else {
            DamageOutcome::Hurt
        }
    }

    /// Adds up to `amount` without passing `max`. An empty meter stays empty.
    ///
    /// Returns how much was actually added.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if self.amount <= 0 {
            return 0;
        }
        let before = self.amount;
        self.amount = (self.amount + amount.max(0)).min(self.max);
        self.amount - before
    }

    /// Removes `cost` if the meter holds at least that much.
    pub fn spend(&mut self, cost: i32) -> bool {
        if self.amount < cost {
            return false;
        }
        self.amount -= cost;
        true
    }

    /// Raises the bound and refills.
    pub fn raise_max(&mut self, extra: i32) {
        self.max += extra;
        self.amount = self.max;
    }

    /// Whether the meter has run out.
    pub fn is_empty(&self) -> bool {
        self.amount <= 0
    }

    /// Filled share in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        if self.max <= 0 {
            return 0.0;
        }
        (self.amount.max(0) as f32 / self.max as f32).min(1.0)
    }
}

macro_rules! meter_component {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub Meter);

        impl $name {
            /// A full meter of `max`.
            pub fn new(max: i32) -> Self {
                $name(Meter::new(max))
            }
        }

        impl Deref for $name {
            type Target = Meter;

            fn deref(&self) -> &Meter {
                &self.0
            }
        }

        impl DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Meter {
                &mut self.0
            }
        }
    };
}

meter_component!(
    /// Hit points. Reaching zero kills the entity.
    Health
);
meter_component!(
    /// Spell points spent by `zap`.
    Mana
);

/// Hostile pursuit and melee behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct MobAi {
    /// Damage roll of one attack
    pub attack_dice: Dice,
    /// Distance at which the mob stops and attacks
    pub attack_range: f32,
    /// Pursuit acceleration per tick
    pub acceleration: f32,
    /// Distance beyond which the player is ignored
    pub sight_range: f32,
    /// Ticks between attacks
    pub cooldown_ticks: u32,
    /// Ticks left until the next attack
    pub cooldown: u32,
    /// Experience awarded to the killer
    pub xp_value: u32,
}

/// A door that opens and closes on command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Door {
    /// Open doors neither block sight nor repel
    pub open: bool,
}

/// A pickup that teaches its holder new words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Display name, also the inventory entry
    pub name: String,
    /// Words granted on pickup
    pub verbs: Vec<String>,
}

/// Live buffer of letters typed at an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct TextHolder {
    /// Letters received so far
    pub text: String,
    /// A locked buffer is waiting on a resolution and drops new letters
    pub locked: bool,
    /// Current display color
    pub color: [f32; 3],
    /// Whether the buffer is fading out
    pub fading: bool,
    /// Display opacity
    pub alpha: f32,
}

impl Default for TextHolder {
    fn default() -> Self {
        TextHolder {
            text: String::new(),
            locked: false,
            color: TEXT_COLOR,
            fading: false,
            alpha: 1.0,
        }
    }
}

impl TextHolder {
    /// Appends a letter unless the buffer is locked.
    pub fn push(&mut self, letter: char) -> bool {
        if self.locked {
            return false;
        }
        self.text.push(letter);
        true
    }

    /// Starts fading the buffer out.
    pub fn fade_out(&mut self) {
        self.fading = true;
    }

    /// Advances the fade. A fully faded buffer clears itself.
    ///
    /// Returns `true` on the tick the buffer clears.
    pub fn update(&mut self, fade_rate: f32) -> bool {
        if !self.fading {
            return false;
        }
        self.alpha -= fade_rate;
        if self.alpha <= 0.0 {
            self.clear();
            return true;
        }
        false
    }

    /// Empties and unlocks the buffer.
    pub fn clear(&mut self) {
        *self = TextHolder::default();
    }
}

/// Words an entity responds to, or knows how to say.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexicon {
    /// Lower-case words
    pub words: Vec<String>,
}

impl Lexicon {
    /// A lexicon of the given words.
    pub fn new(words: &[&str]) -> Self {
        Lexicon {
            words: words.iter().map(|word| word.to_lowercase()).collect(),
        }
    }

    /// Whether the word is in the lexicon, ignoring case.
    pub fn knows(&self, word: &str) -> bool {
        self.words.iter().any(|known| known.eq_ignore_ascii_case(word))
    }

    /// Adds a word. Returns `false` if it was already known.
    pub fn grant(&mut self, word: &str) -> bool {
        if self.knows(word) {
            return false;
        }
        self.words.push(word.to_lowercase());
        true
    }
}

/// Floating text in the world: typed letters and damage numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct Text3D {
    /// Glyphs shown
    pub text: String,
    /// RGBA tint
    pub color: [f32; 4],
    /// Tick after which the entity is removed
    pub expire_tick: Option<u64>,
}

/// A typed letter in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextProjectile {
    /// The entity that typed the letter
    pub shooter: EntityId,
    /// The letter delivered on impact
    pub letter: char,
}

/// One spark of a particle effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// World position
    pub pos: Point3<f32>,
    /// Displacement per tick
    pub vel: Vector3<f32>,
}

/// Parameters of a particle burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticlePreset {
    /// Sparks in the burst
    pub count: usize,
    /// Initial spark speed
    pub speed: f32,
    /// Alpha lost per tick
    pub fade_rate: f32,
    /// RGBA tint
    pub color: [f32; 4],
    /// Height added to the spawn point
    pub lift: f32,
}

/// White sparks of a melee strike.
pub const STRIKE_PARTICLES: ParticlePreset = ParticlePreset {
    count: 10,
    speed: 0.08,
    fade_rate: 0.02,
    color: [1.0, 1.0, 1.0, 1.0],
    lift: 0.0,
};

/// Red spray of a death.
pub const BLOOD_PARTICLES: ParticlePreset = ParticlePreset {
    count: 20,
    speed: 0.025,
    fade_rate: 0.01,
    color: [1.0, 0.0, 0.0, 1.0],
    lift: 1.0,
};

/// Gray puff of a letter landing.
pub const HIT_PARTICLES: ParticlePreset = ParticlePreset {
    count: 7,
    speed: 0.05,
    fade_rate: 0.03,
    color: [0.7, 0.7, 0.7, 1.0],
    lift: 0.0,
};

/// Upward bias of every spark's launch velocity.
pub const PARTICLE_LIFT: f32 = 0.03;

/// A short-lived burst of sparks.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleEffect {
    /// Live sparks
    pub particles: Vec<Particle>,
    /// RGBA tint; alpha falls every tick
    pub color: [f32; 4],
    /// Alpha lost per tick
    pub fade_rate: f32,
}

impl ParticleEffect {
    /// Builds a burst at `at` with random spark directions.
    pub fn burst(preset: &ParticlePreset, at: Point3<f32>, rng: &mut fastrand::Rng) -> Self {
        let origin = at + Vector3::unit_y() * preset.lift;
        let particles = (0..preset.count)
            .map(|_| Particle {
                pos: origin,
                vel: random_direction(rng) * preset.speed + Vector3::unit_y() * PARTICLE_LIFT,
            })
            .collect();
        ParticleEffect {
            particles,
            color: preset.color,
            fade_rate: preset.fade_rate,
        }
    }
}

/// Uniformly distributed unit vector.
pub fn random_direction(rng: &mut fastrand::Rng) -> Vector3<f32> {
    let angle = rng.f32() * TAU;
    let y = rng.f32() * 2.0 - 1.0;
    let r = (1.0 - y * y).sqrt();
    Vector3::new(r * angle.cos(), y, r * angle.sin())
}

/// Marks the entity the camera follows and steers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraController;

/// Experience and character level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Experience {
    /// Total experience earned
    pub xp: u32,
    /// Current character level, starting at 1
    pub level: u32,
    /// Experience total needed for the next level
    pub next: u32,
}

impl Experience {
    /// Level 1 with the first threshold at `first_level`.
    pub fn new(first_level: u32) -> Self {
        Experience {
            xp: 0,
            level: 1,
            next: first_level.max(1),
        }
    }

    /// Adds experience and returns how many levels were gained.
    ///
    /// Each threshold is double the previous one.
    pub fn gain(&mut self, amount: u32) -> u32 {
        self.xp += amount;
        let mut gained = 0;
        while self.xp >= self.next {
            self.level += 1;
            self.next *= 2;
            gained += 1;
        }
        gained
    }

    /// Progress toward the next level in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        let floor = if self.level > 1 { self.next / 2 } else { 0 };
        let span = (self.next - floor).max(1);
        (self.xp.saturating_sub(floor) as f32 / span as f32).min(1.0)
    }
}

/// Names of carried items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    /// Item names in pickup order
    pub items: Vec<String>,
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;

    use super::*;

    #[test]
    fn death_fires_once() {
        let mut health = Health::new(10);
        assert_eq!(health.damage(4), DamageOutcome::Hurt);
        assert_eq!(health.damage(7), DamageOutcome::Killed);
        for _ in 0..5 {
            assert_eq!(health.damage(3), DamageOutcome::Ignored);
        }
        assert_eq!(health.amount, -1);
        assert_eq!(health.heal(5), 0);
    }

    #[test]
    fn negative_damage_cannot_overfill() {
        let mut health = Health::new(10);
        assert_eq!(health.damage(-2), DamageOutcome::Ignored);
        assert_eq!(health.damage(0), DamageOutcome::Ignored);
        assert_eq!((health.amount, health.max), (10, 10));
    }

    #[test]
    fn heal_stops_at_max() {
        let mut health = Health::new(10);
        health.damage(6);
        assert_eq!(health.heal(100), 6);
        assert_eq!(health.amount, 10);
    }

    #[test]
    fn mana_cannot_go_negative() {
        let mut mana = Mana::new(10);
        assert!(mana.spend(5));
        assert!(mana.spend(5));
        assert!(!mana.spend(5));
        assert_eq!(mana.amount, 0);
    }

    #[test]
    fn locked_buffers_drop_letters_and_faded_ones_clear() {
        let mut holder = TextHolder::default();
        assert!(holder.push('o'));
        holder.locked = true;
        assert!(!holder.push('p'));
        assert_eq!(holder.text, "o");

        holder.fade_out();
        let mut ticks = 0;
        while !holder.update(0.25) {
            ticks += 1;
        }
        assert_eq!(ticks, 3);
        assert_eq!(holder, TextHolder::default());
    }

    #[test]
    fn experience_thresholds_double() {
        let mut xp = Experience::new(20);
        assert_eq!(xp.gain(10), 0);
        assert_eq!(xp.gain(10), 1);
        assert_eq!((xp.level, xp.next), (2, 40));
        assert_eq!(xp.gain(100), 2);
        assert_eq!((xp.level, xp.next), (4, 160));
    }

    #[test]
    fn lexicon_ignores_case() {
        let mut lexicon = Lexicon::new(&["Open"]);
        assert!(lexicon.knows("OPEN"));
        assert!(!lexicon.grant("open"));
        assert!(lexicon.grant("zap"));
        assert_eq!(lexicon.words, vec!["open", "zap"]);
    }

    #[test]
    fn random_directions_are_unit_length() {
        let mut rng = fastrand::Rng::with_seed(1);
        for _ in 0..100 {
            assert!((random_direction(&mut rng).magnitude() - 1.0).abs() < 1e-4);
        }
    }
}
