use strum::{EnumCount, EnumIter, IntoStaticStr};

use super::Element;

/// Every stat the engine understands.
///
/// Fractions are stored as decimals: `crit_rate = 0.05` means 5%.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumCount, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StatKey {
    // ========================================================================
    // Core stats (scaled by their `_pct` companion)
    // ========================================================================
    Hp,
    Atk,
    Def,
    Spd,
    HpPct,
    AtkPct,
    DefPct,
    SpdPct,
    Aggro,

    // ========================================================================
    // Offense
    // ========================================================================
    CritRate,
    CritDmg,
    BreakEffect,
    BreakEfficiencyBoost,
    SuperBreakDmgBoost,
    DefIgnore,
    PhysicalDmgBoost,
    FireDmgBoost,
    IceDmgBoost,
    LightningDmgBoost,
    WindDmgBoost,
    QuantumDmgBoost,
    ImaginaryDmgBoost,
    AllTypeDmgBoost,
    BasicAtkDmgBoost,
    SkillDmgBoost,
    UltDmgBoost,
    FuaDmgBoost,
    DotDmgBoost,
    PhysicalResPen,
    FireResPen,
    IceResPen,
    LightningResPen,
    WindResPen,
    QuantumResPen,
    ImaginaryResPen,
    AllTypeResPen,

    // ========================================================================
    // Defense and debuff targets
    // ========================================================================
    EffectHitRate,
    EffectRes,
    CrowdControlRes,
    BleedRes,
    BurnRes,
    FrozenRes,
    ShockRes,
    WindShearRes,
    EntanglementRes,
    ImprisonmentRes,
    PhysicalRes,
    FireRes,
    IceRes,
    LightningRes,
    WindRes,
    QuantumRes,
    ImaginaryRes,
    PhysicalVuln,
    FireVuln,
    IceVuln,
    LightningVuln,
    WindVuln,
    QuantumVuln,
    ImaginaryVuln,
    AllTypeVuln,
    DefReduction,
    AllDmgDealtReduction,
    DmgTakenReduction,

    // ========================================================================
    // Support
    // ========================================================================
    EnergyRegenRate,
    MaxEp,
    OutgoingHealingBoost,
    IncomingHealBoost,
    ShieldStrengthBoost,
}

impl StatKey {
    /// Percentage companion for the stats computed as `base × (1 + pct) + add`.
    pub const fn percent_companion(self) -> Option<StatKey> {
        match self {
            StatKey::Hp => Some(StatKey::HpPct),
            StatKey::Atk => Some(StatKey::AtkPct),
            StatKey::Def => Some(StatKey::DefPct),
            StatKey::Spd => Some(StatKey::SpdPct),
            _ => None,
        }
    }

    pub const fn is_percent(self) -> bool {
        matches!(
            self,
            StatKey::HpPct | StatKey::AtkPct | StatKey::DefPct | StatKey::SpdPct
        )
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub const fn dmg_boost(element: Element) -> StatKey {
        match element {
            Element::Physical => StatKey::PhysicalDmgBoost,
            Element::Fire => StatKey::FireDmgBoost,
            Element::Ice => StatKey::IceDmgBoost,
            Element::Lightning => StatKey::LightningDmgBoost,
            Element::Wind => StatKey::WindDmgBoost,
            Element::Quantum => StatKey::QuantumDmgBoost,
            Element::Imaginary => StatKey::ImaginaryDmgBoost,
        }
    }

    pub const fn res(element: Element) -> StatKey {
        match element {
            Element::Physical => StatKey::PhysicalRes,
            Element::Fire => StatKey::FireRes,
            Element::Ice => StatKey::IceRes,
            Element::Lightning => StatKey::LightningRes,
            Element::Wind => StatKey::WindRes,
            Element::Quantum => StatKey::QuantumRes,
            Element::Imaginary => StatKey::ImaginaryRes,
        }
    }

    pub const fn res_pen(element: Element) -> StatKey {
        match element {
            Element::Physical => StatKey::PhysicalResPen,
            Element::Fire => StatKey::FireResPen,
            Element::Ice => StatKey::IceResPen,
            Element::Lightning => StatKey::LightningResPen,
            Element::Wind => StatKey::WindResPen,
            Element::Quantum => StatKey::QuantumResPen,
            Element::Imaginary => StatKey::ImaginaryResPen,
        }
    }

    pub const fn vuln(element: Element) -> StatKey {
        match element {
            Element::Physical => StatKey::PhysicalVuln,
            Element::Fire => StatKey::FireVuln,
            Element::Ice => StatKey::IceVuln,
            Element::Lightning => StatKey::LightningVuln,
            Element::Wind => StatKey::WindVuln,
            Element::Quantum => StatKey::QuantumVuln,
            Element::Imaginary => StatKey::ImaginaryVuln,
        }
    }
}
