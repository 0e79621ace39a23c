//! Value types shared by the artist graph and the matching engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ArtistError, Result};

/// Stable catalog identifier of an artist or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtistId(pub i64);

impl ArtistId {
    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for ArtistId {
    fn from(value: i64) -> Self {
        ArtistId(value)
    }
}

impl fmt::Display for ArtistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role under which an artist is credited on a song or listed in a line-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditType {
    Vocalist,
    BackingVocalist,
    Performer,
    Composer,
    Arranger,
}

impl CreditType {
    pub const ALL: [CreditType; 5] = [
        CreditType::Vocalist,
        CreditType::BackingVocalist,
        CreditType::Performer,
        CreditType::Composer,
        CreditType::Arranger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CreditType::Vocalist => "vocalist",
            CreditType::BackingVocalist => "backing_vocalist",
            CreditType::Performer => "performer",
            CreditType::Composer => "composer",
            CreditType::Arranger => "arranger",
        }
    }

    /// Vocal roles are compared member by member; the others only need one hit.
    pub fn is_vocal(&self) -> bool {
        matches!(self, CreditType::Vocalist | CreditType::BackingVocalist)
    }

    fn bit(self) -> u8 {
        match self {
            CreditType::Vocalist => 1,
            CreditType::BackingVocalist => 1 << 1,
            CreditType::Performer => 1 << 2,
            CreditType::Composer => 1 << 3,
            CreditType::Arranger => 1 << 4,
        }
    }
}

impl fmt::Display for CreditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CreditType {
    type Err = ArtistError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vocalist" => Ok(CreditType::Vocalist),
            "backing_vocalist" => Ok(CreditType::BackingVocalist),
            "performer" => Ok(CreditType::Performer),
            "composer" => Ok(CreditType::Composer),
            "arranger" => Ok(CreditType::Arranger),
            other => Err(ArtistError::UnknownCreditType(other.to_string())),
        }
    }
}

/// Set of credit types a search considers.
///
/// Serialized as a list of role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<CreditType>", into = "Vec<CreditType>")]
pub struct CreditTypes(u8);

impl CreditTypes {
    pub const fn empty() -> Self {
        CreditTypes(0)
    }

    pub const fn all() -> Self {
        CreditTypes(0b1_1111)
    }

    pub fn contains(self, credit_type: CreditType) -> bool {
        self.0 & credit_type.bit() != 0
    }

    pub fn insert(&mut self, credit_type: CreditType) {
        self.0 |= credit_type.bit();
    }

    pub fn with(mut self, credit_type: CreditType) -> Self {
        self.insert(credit_type);
        self
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = CreditType> {
        CreditType::ALL
            .into_iter()
            .filter(move |credit_type| self.contains(*credit_type))
    }
}

impl FromIterator<CreditType> for CreditTypes {
    fn from_iter<I: IntoIterator<Item = CreditType>>(iter: I) -> Self {
        iter.into_iter()
            .fold(CreditTypes::empty(), |set, credit_type| set.with(credit_type))
    }
}

impl From<Vec<CreditType>> for CreditTypes {
    fn from(value: Vec<CreditType>) -> Self {
        value.into_iter().collect()
    }
}

impl From<CreditTypes> for Vec<CreditType> {
    fn from(value: CreditTypes) -> Self {
        value.iter().collect()
    }
}

/// Which roster of an artist a reference points at.
///
/// The catalog encodes `Solo` as `-1`; that sentinel only exists at the
/// storage boundary (see [`LineUpRef::from_raw`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum LineUpRef {
    Solo,
    Index(usize),
}

impl LineUpRef {
    pub const SOLO_SENTINEL: i64 = -1;

    pub fn from_raw(raw: i64) -> Result<Self> {
        if raw == Self::SOLO_SENTINEL {
            return Ok(LineUpRef::Solo);
        }
        usize::try_from(raw)
            .map(LineUpRef::Index)
            .map_err(|_| ArtistError::InvalidSnapshot(format!("invalid line-up id {raw}")))
    }

    pub fn to_raw(self) -> i64 {
        match self {
            LineUpRef::Solo => Self::SOLO_SENTINEL,
            LineUpRef::Index(index) => index as i64,
        }
    }
}

impl TryFrom<i64> for LineUpRef {
    type Error = ArtistError;

    fn try_from(value: i64) -> Result<Self> {
        LineUpRef::from_raw(value)
    }
}

impl From<LineUpRef> for i64 {
    fn from(value: LineUpRef) -> Self {
        value.to_raw()
    }
}

/// A credited artist: either the artist alone or one of its line-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtistRef {
    pub artist_id: ArtistId,
    #[serde(rename = "line_up_id")]
    pub line_up: LineUpRef,
}

impl ArtistRef {
    pub fn solo(artist_id: impl Into<ArtistId>) -> Self {
        Self {
            artist_id: artist_id.into(),
            line_up: LineUpRef::Solo,
        }
    }

    pub fn line_up(artist_id: impl Into<ArtistId>, index: usize) -> Self {
        Self {
            artist_id: artist_id.into(),
            line_up: LineUpRef::Index(index),
        }
    }
}

/// Edge of the artist graph: `artist_id` taking part in some roster with `role`.
///
/// Stored on a member to name its groups, and on a line-up to name its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupMembership {
    pub artist_id: ArtistId,
    pub role: CreditType,
    #[serde(rename = "line_up_id")]
    pub line_up: LineUpRef,
}

impl GroupMembership {
    pub fn new(artist_id: impl Into<ArtistId>, role: CreditType, line_up: LineUpRef) -> Self {
        Self {
            artist_id: artist_id.into(),
            role,
            line_up,
        }
    }

    pub fn to_ref(&self) -> ArtistRef {
        ArtistRef {
            artist_id: self.artist_id,
            line_up: self.line_up,
        }
    }
}

/// Per-role credits of a song, in credited order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongCredits {
    pub vocalists: Vec<ArtistRef>,
    pub backing_vocalists: Vec<ArtistRef>,
    pub performers: Vec<ArtistRef>,
    pub composers: Vec<ArtistRef>,
    pub arrangers: Vec<ArtistRef>,
}

impl SongCredits {
    pub fn by_role(&self, role: CreditType) -> &[ArtistRef] {
        match role {
            CreditType::Vocalist => &self.vocalists,
            CreditType::BackingVocalist => &self.backing_vocalists,
            CreditType::Performer => &self.performers,
            CreditType::Composer => &self.composers,
            CreditType::Arranger => &self.arrangers,
        }
    }

    pub fn push(&mut self, role: CreditType, artist: ArtistRef) {
        let list = match role {
            CreditType::Vocalist => &mut self.vocalists,
            CreditType::BackingVocalist => &mut self.backing_vocalists,
            CreditType::Performer => &mut self.performers,
            CreditType::Composer => &mut self.composers,
            CreditType::Arranger => &mut self.arrangers,
        };
        list.push(artist);
    }

    /// Vocalists followed by backing vocalists.
    pub fn vocal_refs(&self) -> impl Iterator<Item = ArtistRef> + '_ {
        self.vocalists
            .iter()
            .chain(self.backing_vocalists.iter())
            .copied()
    }

    /// Performers, composers and arrangers.
    pub fn support_refs(&self) -> impl Iterator<Item = ArtistRef> + '_ {
        self.performers
            .iter()
            .chain(self.composers.iter())
            .chain(self.arrangers.iter())
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CreditType, &ArtistRef)> + '_ {
        CreditType::ALL
            .into_iter()
            .flat_map(move |role| self.by_role(role).iter().map(move |artist| (role, artist)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_up_ref_sentinel() {
        assert_eq!(LineUpRef::from_raw(-1).unwrap(), LineUpRef::Solo);
        assert_eq!(LineUpRef::from_raw(2).unwrap(), LineUpRef::Index(2));
        assert!(LineUpRef::from_raw(-3).is_err());
        assert_eq!(LineUpRef::Solo.to_raw(), -1);
        assert_eq!(LineUpRef::Index(4).to_raw(), 4);
    }

    #[test]
    fn test_credit_type_parse() {
        for credit_type in CreditType::ALL {
            assert_eq!(credit_type.as_str().parse::<CreditType>().unwrap(), credit_type);
        }
        assert!("lyricist".parse::<CreditType>().is_err());
    }

    #[test]
    fn test_credit_types_set() {
        let set: CreditTypes = [CreditType::Vocalist, CreditType::Composer].into_iter().collect();
        assert!(set.contains(CreditType::Vocalist));
        assert!(set.contains(CreditType::Composer));
        assert!(!set.contains(CreditType::Arranger));
        assert_eq!(set.iter().count(), 2);

        assert!(CreditTypes::empty().is_empty());
        assert_eq!(CreditTypes::all().iter().count(), 5);
    }

    #[test]
    fn test_credit_types_serialize_as_list() {
        let set = CreditTypes::empty()
            .with(CreditType::BackingVocalist)
            .with(CreditType::Vocalist);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["vocalist","backing_vocalist"]"#);

        let parsed: CreditTypes = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn test_artist_ref_serializes_sentinel() {
        let json = serde_json::to_value(ArtistRef::solo(7)).unwrap();
        assert_eq!(json, serde_json::json!({ "artist_id": 7, "line_up_id": -1 }));

        let parsed: ArtistRef =
            serde_json::from_value(serde_json::json!({ "artist_id": 3, "line_up_id": 1 })).unwrap();
        assert_eq!(parsed, ArtistRef::line_up(3, 1));
    }

    #[test]
    fn test_song_credits_role_groups() {
        let mut credits = SongCredits::default();
        credits.push(CreditType::Vocalist, ArtistRef::solo(1));
        credits.push(CreditType::BackingVocalist, ArtistRef::solo(2));
        credits.push(CreditType::Composer, ArtistRef::solo(3));
        credits.push(CreditType::Arranger, ArtistRef::solo(4));

        let vocal: Vec<_> = credits.vocal_refs().map(|r| r.artist_id.0).collect();
        let support: Vec<_> = credits.support_refs().map(|r| r.artist_id.0).collect();
        assert_eq!(vocal, vec![1, 2]);
        assert_eq!(support, vec![3, 4]);
        assert_eq!(credits.iter().count(), 4);
        assert!(!credits.is_empty());
    }
}
