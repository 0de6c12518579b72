//! Stat catalog and the read-only character snapshot
//!
//! Character records are owned by the character store; the roller only sees
//! a snapshot of the values it needs to size a pool.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_DISTRESS, MAX_STAT, MIN_DISTRESS};
use crate::pool::{PoolSize, compute_pool};

/// Which column of the sheet a stat lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatGroup {
    Attribute,
    Skill,
}

/// Every stat on the character sheet.
///
/// Serde names match the keys used in exported character JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatKey {
    // Attributes
    Force,
    Dexterite,
    Vigueur,
    Charisme,
    Manipulation,
    SangFroid,
    Intelligence,
    Astuces,
    Resolution,
    // Skills
    ArmesAFeu,
    Artisanat,
    Athletisme,
    Bagarre,
    Conduite,
    Furtivite,
    Larcin,
    Melee,
    Survie,
    Animaux,
    Erudition,
    Commandement,
    Empathie,
    Etiquettes,
    ExperienceDeLaRue,
    Intimidation,
    Persuasion,
    Representation,
    Subterfuge,
    Finances,
    Investigation,
    Medecine,
    Occultisme,
    Politique,
    Science,
    Technologie,
    Vigilance,
}

impl StatKey {
    pub const ATTRIBUTES: [StatKey; 9] = [
        StatKey::Force,
        StatKey::Dexterite,
        StatKey::Vigueur,
        StatKey::Charisme,
        StatKey::Manipulation,
        StatKey::SangFroid,
        StatKey::Intelligence,
        StatKey::Astuces,
        StatKey::Resolution,
    ];

    pub const SKILLS: [StatKey; 27] = [
        StatKey::ArmesAFeu,
        StatKey::Artisanat,
        StatKey::Athletisme,
        StatKey::Bagarre,
        StatKey::Conduite,
        StatKey::Furtivite,
        StatKey::Larcin,
        StatKey::Melee,
        StatKey::Survie,
        StatKey::Animaux,
        StatKey::Erudition,
        StatKey::Commandement,
        StatKey::Empathie,
        StatKey::Etiquettes,
        StatKey::ExperienceDeLaRue,
        StatKey::Intimidation,
        StatKey::Persuasion,
        StatKey::Representation,
        StatKey::Subterfuge,
        StatKey::Finances,
        StatKey::Investigation,
        StatKey::Medecine,
        StatKey::Occultisme,
        StatKey::Politique,
        StatKey::Science,
        StatKey::Technologie,
        StatKey::Vigilance,
    ];

    /// Attributes then skills, in sheet order
    pub fn all() -> impl Iterator<Item = StatKey> {
        Self::ATTRIBUTES.into_iter().chain(Self::SKILLS)
    }

    pub fn group(&self) -> StatGroup {
        if Self::ATTRIBUTES.contains(self) {
            StatGroup::Attribute
        } else {
            StatGroup::Skill
        }
    }

    /// Display label shown on the sheet
    pub fn label(&self) -> &'static str {
        match self {
            StatKey::Force => "Force",
            StatKey::Dexterite => "Dextérité",
            StatKey::Vigueur => "Vigueur",
            StatKey::Charisme => "Charisme",
            StatKey::Manipulation => "Manipulation",
            StatKey::SangFroid => "Sang-froid",
            StatKey::Intelligence => "Intelligence",
            StatKey::Astuces => "Astuces",
            StatKey::Resolution => "Résolution",
            StatKey::ArmesAFeu => "Armes à feu",
            StatKey::Artisanat => "Artisanat",
            StatKey::Athletisme => "Athlétisme",
            StatKey::Bagarre => "Bagarre",
            StatKey::Conduite => "Conduite",
            StatKey::Furtivite => "Furtivité",
            StatKey::Larcin => "Larcin",
            StatKey::Melee => "Mêlée",
            StatKey::Survie => "Survie",
            StatKey::Animaux => "Animaux",
            StatKey::Erudition => "Érudition",
            StatKey::Commandement => "Commandement",
            StatKey::Empathie => "Empathie",
            StatKey::Etiquettes => "Étiquettes",
            StatKey::ExperienceDeLaRue => "Expérience de la rue",
            StatKey::Intimidation => "Intimidation",
            StatKey::Persuasion => "Persuasion",
            StatKey::Representation => "Représentation",
            StatKey::Subterfuge => "Subterfuge",
            StatKey::Finances => "Finances",
            StatKey::Investigation => "Investigation",
            StatKey::Medecine => "Médecine",
            StatKey::Occultisme => "Occultisme",
            StatKey::Politique => "Politique",
            StatKey::Science => "Science",
            StatKey::Technologie => "Technologie",
            StatKey::Vigilance => "Vigilance",
        }
    }

    /// Parse a JSON key (e.g. `"sangFroid"`)
    pub fn from_key(key: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(key.to_string())).ok()
    }
}

/// Read-only view of the character fields the roller needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSnapshot {
    #[serde(default)]
    pub stats: BTreeMap<StatKey, u8>,
    #[serde(rename = "detresse", default = "default_gauge")]
    pub distress: u8,
    #[serde(default = "default_gauge")]
    pub danger: u8,
}

fn default_gauge() -> u8 {
    MIN_DISTRESS
}

impl Default for StatSnapshot {
    fn default() -> Self {
        Self {
            stats: BTreeMap::new(),
            distress: MIN_DISTRESS,
            danger: MIN_DISTRESS,
        }
    }
}

impl StatSnapshot {
    /// Stat value (0 when missing, clamped to 0..=5)
    pub fn value(&self, key: StatKey) -> u8 {
        self.stats.get(&key).copied().unwrap_or(0).min(MAX_STAT)
    }

    /// Distress level clamped to 1..=5
    pub fn distress_level(&self) -> u8 {
        self.distress.clamp(MIN_DISTRESS, MAX_DISTRESS)
    }

    /// Danger level clamped to 1..=5
    pub fn danger_level(&self) -> u8 {
        self.danger.clamp(MIN_DISTRESS, MAX_DISTRESS)
    }

    pub fn with_stat(mut self, key: StatKey, value: u8) -> Self {
        self.stats.insert(key, value);
        self
    }

    pub fn with_distress(mut self, level: u8) -> Self {
        self.distress = level;
        self
    }
}

/// Roller view state. Transient, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RollConfiguration {
    pub stat_a: StatKey,
    pub stat_b: StatKey,
    pub modifier: i32,
    pub include_distress: bool,
}

impl Default for RollConfiguration {
    fn default() -> Self {
        Self {
            stat_a: StatKey::Charisme,
            stat_b: StatKey::Persuasion,
            modifier: 0,
            include_distress: true,
        }
    }
}

impl RollConfiguration {
    /// Size the pool for this configuration against a character snapshot
    pub fn pool(&self, snapshot: &StatSnapshot) -> PoolSize {
        compute_pool(
            u32::from(snapshot.value(self.stat_a)),
            u32::from(snapshot.value(self.stat_b)),
            self.modifier,
            snapshot.distress_level(),
            self.include_distress,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(StatKey::all().count(), 36);
        assert_eq!(StatKey::Resolution.group(), StatGroup::Attribute);
        assert_eq!(StatKey::Vigilance.group(), StatGroup::Skill);
    }

    #[test]
    fn test_json_keys() {
        assert_eq!(StatKey::from_key("sangFroid"), Some(StatKey::SangFroid));
        assert_eq!(StatKey::from_key("armesAFeu"), Some(StatKey::ArmesAFeu));
        assert_eq!(
            StatKey::from_key("experienceDeLaRue"),
            Some(StatKey::ExperienceDeLaRue)
        );
        assert_eq!(StatKey::from_key("nope"), None);
    }

    #[test]
    fn test_snapshot_from_character_json() {
        let json = r#"{
            "id": "abc",
            "name": "Mara",
            "stats": { "charisme": 2, "persuasion": 3, "force": 9 },
            "detresse": 2,
            "danger": 4
        }"#;
        let snap: StatSnapshot = serde_json::from_str(json).expect("valid snapshot");
        assert_eq!(snap.value(StatKey::Charisme), 2);
        assert_eq!(snap.value(StatKey::Force), 5);
        assert_eq!(snap.value(StatKey::Larcin), 0);
        assert_eq!(snap.distress_level(), 2);
        assert_eq!(snap.danger_level(), 4);
    }

    #[test]
    fn test_default_configuration_pool() {
        let snap = StatSnapshot::default()
            .with_stat(StatKey::Charisme, 2)
            .with_stat(StatKey::Persuasion, 3)
            .with_distress(2);
        let pool = RollConfiguration::default().pool(&snap);
        assert_eq!(pool.normal, 5);
        assert_eq!(pool.distress, 2);
    }

    #[test]
    fn test_distress_clamped_on_read() {
        let snap = StatSnapshot::default().with_distress(0);
        assert_eq!(snap.distress_level(), 1);
        let snap = StatSnapshot::default().with_distress(12);
        assert_eq!(snap.distress_level(), 5);
    }

    #[test]
    fn test_negative_modifier_clamps() {
        let config = RollConfiguration {
            modifier: -1,
            include_distress: false,
            ..Default::default()
        };
        let pool = config.pool(&StatSnapshot::default());
        assert!(pool.is_empty());
    }
}
