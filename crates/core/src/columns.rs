//! Spreadsheet schema inference.
//!
//! Episode sheets are maintained by hand and their column headers drift
//! ("Topic", "Episode Topic", "Subject", ...). Instead of hard-coding
//! positions we resolve each logical [`Field`] against an ordered alias list
//! once per fetch. Matching is exact and case-sensitive: a header that is not
//! spelled like one of the aliases below is not recognised.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Bumped whenever [`Field::aliases`] changes so deployments can tell which
/// alias table resolved a given sheet.
pub const ALIAS_TABLE_VERSION: u32 = 1;

/// Sentinel reported for a field whose column was not found.
pub const ABSENT: i64 = -1;

const FIELD_COUNT: usize = 12;

/// Logical fields the service reads from an episode row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Category,
    Title,
    Topic,
    Demand,
    Supply,
    Voice,
    Host,
    Main,
    Bonus,
    BonusName,
    Date,
    Status,
}

impl Field {
    /// Every field, in the order they are resolved and serialized.
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Category,
        Field::Title,
        Field::Topic,
        Field::Demand,
        Field::Supply,
        Field::Voice,
        Field::Host,
        Field::Main,
        Field::Bonus,
        Field::BonusName,
        Field::Date,
        Field::Status,
    ];

    /// The key used for this field in JSON output.
    pub fn key(self) -> &'static str {
        match self {
            Field::Category => "category",
            Field::Title => "title",
            Field::Topic => "topic",
            Field::Demand => "demand",
            Field::Supply => "supply",
            Field::Voice => "voice",
            Field::Host => "host",
            Field::Main => "main",
            Field::Bonus => "bonus",
            Field::BonusName => "bonusName",
            Field::Date => "date",
            Field::Status => "status",
        }
    }

    /// Accepted header strings, highest priority first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Category => &["Category", "category", "CATEGORY", "Genre", "Niche"],
            Field::Title => &[
                "Title",
                "title",
                "TITLE",
                "Episode Title",
                "Podcast Title",
                "Show Title",
            ],
            Field::Topic => &["Topic", "topic", "TOPIC", "Episode Topic", "Subject"],
            Field::Demand => &["Demand", "demand", "DEMAND", "Search Demand", "Demand Level"],
            Field::Supply => &["Supply", "supply", "SUPPLY", "Competition", "Supply Level"],
            Field::Voice => &["Voice", "voice", "VOICE", "Voice Style", "Tone"],
            Field::Host => &["Host", "host", "HOST", "Host Name", "Persona"],
            Field::Main => &["Main Day", "Main", "main", "MAIN", "Main Episode Day"],
            Field::Bonus => &["Bonus Day", "Bonus", "bonus", "BONUS", "Bonus Episode Day"],
            Field::BonusName => &[
                "Bonus Name",
                "Bonus Episode",
                "Bonus Title",
                "bonus name",
                "bonusName",
            ],
            Field::Date => &[
                "Date",
                "date",
                "DATE",
                "Air Date",
                "Publish Date",
                "Release Date",
            ],
            Field::Status => &["Status", "status", "STATUS", "Generated", "Processed", "Done"],
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Resolved mapping from logical field to zero-based column index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    indices: [Option<usize>; FIELD_COUNT],
}

impl ColumnMap {
    /// Column index for `field`, or `None` when the header was not found.
    pub fn get(&self, field: Field) -> Option<usize> {
        self.indices[field.slot()]
    }

    /// Column index for `field` with [`ABSENT`] standing in for "not found".
    pub fn index_or_absent(&self, field: Field) -> i64 {
        self.get(field).map_or(ABSENT, |i| i as i64)
    }

    /// Read `field` from a data row. Absent columns and short rows read as `""`.
    pub fn cell<'a, S: AsRef<str>>(&self, row: &'a [S], field: Field) -> &'a str {
        self.get(field)
            .and_then(|i| row.get(i))
            .map_or("", |s| s.as_ref())
    }

    fn set(&mut self, field: Field, index: Option<usize>) {
        self.indices[field.slot()] = index;
    }
}

impl Serialize for ColumnMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FIELD_COUNT))?;
        for field in Field::ALL {
            map.serialize_entry(field.key(), &self.index_or_absent(field))?;
        }
        map.end()
    }
}

/// Resolve every [`Field`] against `header`.
///
/// Aliases are tried in priority order; the first alias that equals some
/// header cell wins, and the position of the first such cell is recorded.
pub fn infer_columns<S: AsRef<str>>(header: &[S]) -> ColumnMap {
    let mut map = ColumnMap::default();
    for field in Field::ALL {
        let index = field
            .aliases()
            .iter()
            .find_map(|alias| header.iter().position(|cell| cell.as_ref() == *alias));
        map.set(field, index);
    }
    map
}
