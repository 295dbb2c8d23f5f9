//! Static gazetteer of Da Nang's administrative districts.
//!
//! Each district is registered under both its bare name and its prefixed
//! name. The prefixes are irregular ("Quận" for the urban districts,
//! "Huyện" for Hòa Vang), so the table lists both forms instead of trying
//! to strip prefixes from user input.

use super::normalizer::canonical_key;
use crate::core::geo::Coordinate;
use crate::prelude::HashMap;
use once_cell::sync::Lazy;

/// Administrative prefix carried by a district's full name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminPrefix {
    /// Urban district
    Quan,
    /// Rural district
    Huyen,
}

impl AdminPrefix {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Quan => "Quận",
            Self::Huyen => "Huyện",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum District {
    HoaVang,
    CamLe,
    HaiChau,
    LienChieu,
    NguHanhSon,
    SonTra,
    ThanhKhe,
}

impl District {
    /// All districts in the order the form lists them.
    pub const ALL: [District; 7] = [
        District::HoaVang,
        District::CamLe,
        District::HaiChau,
        District::LienChieu,
        District::NguHanhSon,
        District::SonTra,
        District::ThanhKhe,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::HoaVang => "Hòa Vang",
            Self::CamLe => "Cẩm Lệ",
            Self::HaiChau => "Hải Châu",
            Self::LienChieu => "Liên Chiểu",
            Self::NguHanhSon => "Ngũ Hành Sơn",
            Self::SonTra => "Sơn Trà",
            Self::ThanhKhe => "Thanh Khê",
        }
    }

    pub fn prefix(&self) -> AdminPrefix {
        match self {
            Self::HoaVang => AdminPrefix::Huyen,
            _ => AdminPrefix::Quan,
        }
    }

    /// Full administrative name, e.g. "Quận Hải Châu"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prefix().label(), self.name())
    }

    pub fn coordinate(&self) -> Coordinate {
        match self {
            Self::HoaVang => Coordinate::new(107.4543, 15.8342),
            Self::CamLe => Coordinate::new(108.2033, 16.0679),
            Self::HaiChau => Coordinate::new(108.2158, 16.0733),
            Self::LienChieu => Coordinate::new(108.1703, 16.0089),
            Self::NguHanhSon => Coordinate::new(108.2517, 16.0278),
            Self::SonTra => Coordinate::new(108.2764, 16.1122),
            Self::ThanhKhe => Coordinate::new(108.1897, 16.0558),
        }
    }

    /// Looks a free-text label up in the gazetteer.
    pub fn from_label(label: &str) -> Option<District> {
        GAZETTEER.get(&canonical_key(label)).copied()
    }
}

impl std::fmt::Display for District {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical key -> district, for both bare and prefixed names.
pub(crate) static GAZETTEER: Lazy<HashMap<String, District>> = Lazy::new(|| {
    let mut table = HashMap::default();
    for district in District::ALL {
        table.insert(canonical_key(district.name()), district);
        table.insert(canonical_key(&district.full_name()), district);
    }
    table
});
