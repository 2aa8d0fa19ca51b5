//! Borehole soil descriptions.
//!
//! GEF boreholes describe soils with NEN 5104 codes such as `Kz1` or
//! `Zs2g1`: a main letter followed by additions, each with an optional
//! intensity digit. BRO-XML boreholes use geotechnical soil names that map
//! onto a published fraction table.

use crate::constants::{SOIL_CODE_INTENSITY, UNCLASSIFIED_SOIL_CODES};
use crate::models::{SoilFractions, SoilLabel};

/// Result of looking up a soil description
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoilDescription {
    Classified {
        label: SoilLabel,
        fractions: SoilFractions,
    },
    /// A known code for material without soil fractions (water, missing)
    NotClassifiable,
    /// A code or name that is not in the lookup tables
    Unknown,
}

/// Secondary share from which a mixed label is used
const MIXED_SHARE: f64 = 0.3;

/// Fraction a code letter contributes to
fn letter_fraction(letter: char) -> Option<SoilLabel> {
    let label = match letter {
        'g' => SoilLabel::Gravel,
        'z' | 'm' => SoilLabel::Sand,
        's' => SoilLabel::Silt,
        'k' => SoilLabel::Clay,
        'l' => SoilLabel::Loam,
        'h' | 'v' | 'p' => SoilLabel::Peat,
        _ => return None,
    };
    Some(label)
}

fn share_mut(fractions: &mut SoilFractions, label: SoilLabel) -> &mut f64 {
    match label {
        SoilLabel::Gravel => &mut fractions.gravel,
        SoilLabel::Sand => &mut fractions.sand,
        SoilLabel::Silt => &mut fractions.silt,
        SoilLabel::Loam => &mut fractions.loam,
        SoilLabel::Peat => &mut fractions.peat,
        _ => &mut fractions.clay,
    }
}

/// Interpret a GEF NEN 5104 soil code.
///
/// Each addition letter takes the share of its intensity digit (5, 10, 15
/// or 20 %, 5 % without a digit); the main soil gets the remainder. Only
/// the first word of the code is read.
pub fn classify_gef_code(code: &str) -> SoilDescription {
    let code = code.replace('\'', "");
    let Some(word) = code.split_whitespace().next() else {
        return SoilDescription::Unknown;
    };
    if UNCLASSIFIED_SOIL_CODES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(word))
    {
        return SoilDescription::NotClassifiable;
    }

    let chars: Vec<char> = word.to_ascii_lowercase().chars().collect();
    let Some(main) = chars.first().copied().and_then(letter_fraction) else {
        return SoilDescription::Unknown;
    };

    let mut fractions = SoilFractions::default();
    let mut position = 1;
    while position < chars.len() {
        let c = chars[position];
        if c.is_ascii_digit() {
            // a digit only counts directly after an addition letter
            position += 1;
            continue;
        }
        let Some(addition) = letter_fraction(c) else {
            return SoilDescription::Unknown;
        };
        let intensity = match chars.get(position + 1).and_then(|d| d.to_digit(10)) {
            Some(digit) => match SOIL_CODE_INTENSITY.get(digit as usize) {
                Some(share) if digit > 0 => *share,
                _ => return SoilDescription::Unknown,
            },
            None => SOIL_CODE_INTENSITY[0],
        };
        *share_mut(&mut fractions, addition) = intensity;
        position += 1;
    }

    // a repeated main letter among the additions is replaced by the remainder
    *share_mut(&mut fractions, main) = 0.0;
    let remainder = 1.0 - fractions.sum();
    if remainder < 0.0 {
        return SoilDescription::Unknown;
    }
    *share_mut(&mut fractions, main) = remainder;

    SoilDescription::Classified {
        label: label_from_fractions(&fractions, main),
        fractions,
    }
}

/// Label of a composition, refined by a substantial secondary fraction
pub fn label_from_fractions(fractions: &SoilFractions, main: SoilLabel) -> SoilLabel {
    match main {
        SoilLabel::Sand if fractions.silt >= MIXED_SHARE => SoilLabel::SiltySand,
        SoilLabel::Sand if fractions.clay >= MIXED_SHARE => SoilLabel::ClayeySand,
        SoilLabel::Silt if fractions.clay >= MIXED_SHARE => SoilLabel::ClayeySilt,
        SoilLabel::Clay if fractions.silt >= MIXED_SHARE => SoilLabel::SiltyClay,
        other => other,
    }
}

/// Largest fraction, the coarsest one on ties
pub fn dominant_fraction(fractions: &SoilFractions) -> Option<SoilLabel> {
    let mut best: Option<(SoilLabel, f64)> = None;
    for (label, share) in fractions.shares() {
        if share > best.map_or(0.0, |(_, s)| s) {
            best = Some((label, share));
        }
    }
    best.map(|(label, _)| label)
}

/// Distribution of a BRO geotechnical soil name as
/// `[rocks, gravel, sand, silt, clay, peat]`
fn bro_distribution(name: &str) -> Option<[f64; 6]> {
    let distribution = match name {
        "blokken" | "keien" | "keienNietGespecificeerd" | "keitjes"
        | "keitjesNietGespecificeerd" => [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        "keienMetGrind" | "keitjesMetGrind" => [0.7, 0.3, 0.0, 0.0, 0.0, 0.0],
        "keienMetZand" | "keitjesMetZand" => [0.7, 0.0, 0.3, 0.0, 0.0, 0.0],
        "keienMetSilt" | "keitjesMetSilt" => [0.7, 0.0, 0.0, 0.3, 0.0, 0.0],
        "keienMetKlei" | "keitjesMetKlei" => [0.7, 0.0, 0.0, 0.0, 0.3, 0.0],

        "grind" => [0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        "grindMetKeien" | "grindMetKeitjes" | "keiigGrind" => [0.3, 0.7, 0.0, 0.0, 0.0, 0.0],
        "zwakZandigGrind" => [0.0, 0.8, 0.2, 0.0, 0.0, 0.0],
        "matigZandigGrind" => [0.0, 0.7, 0.3, 0.0, 0.0, 0.0],
        "sterkZandigGrind" => [0.0, 0.6, 0.4, 0.0, 0.0, 0.0],
        "uiterstZandigGrind" => [0.0, 0.5, 0.5, 0.0, 0.0, 0.0],
        "siltigGrind" => [0.0, 0.7, 0.0, 0.3, 0.0, 0.0],

        "zand" => [0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
        "zandMetKeien" | "zandMetKeitjes" => [0.3, 0.0, 0.7, 0.0, 0.0, 0.0],
        "zwakGrindigZand" => [0.0, 0.2, 0.8, 0.0, 0.0, 0.0],
        "sterkGrindigZand" => [0.0, 0.4, 0.6, 0.0, 0.0, 0.0],
        "siltigZand" | "matigSiltigZand" => [0.0, 0.0, 0.7, 0.3, 0.0, 0.0],
        "zwakSiltigZand" => [0.0, 0.0, 0.8, 0.2, 0.0, 0.0],
        "sterkSiltigZand" => [0.0, 0.0, 0.6, 0.4, 0.0, 0.0],
        "uiterstSiltigZand" => [0.0, 0.0, 0.5, 0.5, 0.0, 0.0],
        "siltigZandMetGrind" => [0.0, 0.15, 0.7, 0.15, 0.0, 0.0],
        "kleiigZand" => [0.0, 0.0, 0.7, 0.0, 0.3, 0.0],
        "kleiigZandMetGrind" => [0.0, 0.15, 0.7, 0.0, 0.15, 0.0],

        "silt" => [0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        "siltMetKeien" | "siltMetKeitjes" => [0.3, 0.0, 0.0, 0.7, 0.0, 0.0],
        "zwakGrindigSilt" => [0.0, 0.2, 0.0, 0.8, 0.0, 0.0],
        "sterkGrindigSilt" => [0.0, 0.4, 0.0, 0.6, 0.0, 0.0],
        "zwakZandigSilt" => [0.0, 0.0, 0.2, 0.8, 0.0, 0.0],
        "zwakZandigSiltMetGrind" => [0.0, 0.1, 0.1, 0.8, 0.0, 0.0],
        "sterkZandigSilt" => [0.0, 0.0, 0.4, 0.6, 0.0, 0.0],
        "sterkZandigSiltMetGrind" => [0.0, 0.2, 0.2, 0.6, 0.0, 0.0],

        "klei" => [0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        "kleiMetKeien" | "kleiMetKeitjes" => [0.3, 0.0, 0.0, 0.0, 0.7, 0.0],
        "zwakGrindigeKlei" => [0.0, 0.2, 0.0, 0.0, 0.8, 0.0],
        "sterkGrindigeKlei" => [0.0, 0.4, 0.0, 0.0, 0.6, 0.0],
        "zwakZandigeKlei" => [0.0, 0.0, 0.2, 0.0, 0.8, 0.0],
        "matigZandigeKlei" => [0.0, 0.0, 0.3, 0.0, 0.7, 0.0],
        "zwakZandigeKleiMetGrind" => [0.0, 0.1, 0.1, 0.0, 0.8, 0.0],
        "sterkZandigeKlei" => [0.0, 0.0, 0.4, 0.0, 0.6, 0.0],
        "sterkZandigeKleiMetGrind" => [0.0, 0.2, 0.2, 0.0, 0.6, 0.0],
        "organischKlei" => [0.0, 0.0, 0.0, 0.0, 0.6, 0.4],
        "zwakSiltigeKlei" => [0.0, 0.0, 0.0, 0.1, 0.9, 0.0],
        "matigSiltigeKlei" => [0.0, 0.0, 0.0, 0.2, 0.8, 0.0],
        "sterkSiltigeKlei" => [0.0, 0.0, 0.0, 0.3, 0.7, 0.0],
        "uiterstSiltigeKlei" => [0.0, 0.0, 0.0, 0.5, 0.5, 0.0],

        "sterkZandigeLeem" => [0.1, 0.25, 0.1, 0.45, 0.05, 0.05],
        "zwakZandigeLeem" => [0.1, 0.15, 0.1, 0.45, 0.1, 0.1],

        "detritus" | "detritusNietGespecificeerd" | "humus" | "veen" | "gyttja"
        | "gyttjaNietGespecificeerd" | "dy" | "bruinkool" | "bruinkoolNietGespecificeerd" => {
            [0.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        }
        "zwakZandigeDetritus" | "zwakZandigeHumus" | "zwakZandigVeen" => {
            [0.0, 0.0, 0.2, 0.0, 0.0, 0.8]
        }
        "sterkZandigeDetritus" | "sterkZandigeHumus" | "sterkZandigVeen" => {
            [0.0, 0.0, 0.4, 0.0, 0.0, 0.6]
        }
        "siltigeDetritus" | "siltigeHumus" | "siltigVeen" | "mineraalarmVeen" => {
            [0.0, 0.0, 0.0, 0.2, 0.0, 0.8]
        }
        "kleiigeDetritus" | "kleiigeHumus" | "kleiigVeen" => [0.0, 0.0, 0.0, 0.0, 0.2, 0.8],
        "zwakKleiigVeen" => [0.0, 0.0, 0.0, 0.0, 0.1, 0.9],
        "sterkKleiigVeen" => [0.0, 0.0, 0.0, 0.0, 0.3, 0.7],

        "niet gedefinieerd" | "nietGedefinieerd" | "unknown" => [0.0; 6],
        _ => return None,
    };
    Some(distribution)
}

/// Interpret a BRO geotechnical soil name; rocks are counted as gravel
pub fn classify_bro_name(name: &str) -> SoilDescription {
    let name = name.trim().trim_matches('\'');
    let Some([rocks, gravel, sand, silt, clay, peat]) = bro_distribution(name) else {
        return SoilDescription::Unknown;
    };

    let fractions = SoilFractions {
        gravel: rocks + gravel,
        sand,
        silt,
        clay,
        loam: 0.0,
        peat,
    };
    let Some(main) = dominant_fraction(&fractions) else {
        return SoilDescription::NotClassifiable;
    };
    let label = if name.ends_with("Leem") {
        SoilLabel::Loam
    } else {
        label_from_fractions(&fractions, main)
    };

    SoilDescription::Classified { label, fractions }
}
