//! Delimited-text import.
//!
//! Each collection comes from its own file with a header row. Column
//! names follow the English field names; the French headers of older
//! exports (`prenom`, `num_equipe`, `bus_manual`, `capacite`, ...) are
//! accepted as aliases.
//!
//! | File | Columns |
//! |------|---------|
//! | people | id, first_name, last_name, email, phone, new, certified, organizer, volunteer, adult, team_id, manual_vehicle_id |
//! | teams | id, name, faction |
//! | vehicles | id, capacity |
//!
//! Boolean cells accept `true/false`, `1/0`, `yes/no`, `oui/non`, `x`;
//! an empty cell is `false`. Empty id cells are "no reference".
//!
//! Files are UTF-8 unless the input config says `windows-1252`, the
//! encoding of those older exports. Undecodable UTF-8 is a row error.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use encoding_rs::WINDOWS_1252;
use encoding_rs_io::DecodeReaderBytesBuilder;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{InputConfig, InputEncoding};
use crate::error::{ConvoyError, Result};
use crate::models::{Collection, Person, Role, Roster, Team, Vehicle};

#[derive(Debug, Deserialize)]
struct PersonRecord {
    id: u32,
    #[serde(default, alias = "prenom")]
    first_name: String,
    #[serde(default, alias = "nom")]
    last_name: String,
    #[serde(default, alias = "mail")]
    email: String,
    #[serde(default, alias = "telephone")]
    phone: String,
    #[serde(default, alias = "nouveau", deserialize_with = "flag")]
    new: bool,
    #[serde(default, alias = "ce", deserialize_with = "flag")]
    certified: bool,
    #[serde(default, alias = "orga", deserialize_with = "flag")]
    organizer: bool,
    #[serde(default, alias = "benevole", deserialize_with = "flag")]
    volunteer: bool,
    #[serde(alias = "majeur", deserialize_with = "flag")]
    adult: bool,
    #[serde(default, alias = "num_equipe")]
    team_id: Option<u32>,
    #[serde(default, alias = "bus_manual")]
    manual_vehicle_id: Option<u32>,
}

impl PersonRecord {
    fn into_person(self) -> Result<Person> {
        let role = Role::from_flags(self.new, self.certified, self.organizer, self.volunteer)
            .ok_or(ConvoyError::UnassignedRole { person_id: self.id })?;
        let flags = [self.new, self.certified, self.organizer, self.volunteer];
        if flags.iter().filter(|&&f| f).count() > 1 {
            warn!(person_id = self.id, role = ?role, "several role flags set; keeping the first");
        }

        Ok(Person {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            role,
            is_adult: self.adult,
            team_id: self.team_id,
            manual_vehicle_id: self.manual_vehicle_id,
            assigned_vehicle_id: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TeamRecord {
    #[serde(alias = "numero")]
    id: u32,
    #[serde(default, alias = "nom")]
    name: String,
    #[serde(default)]
    faction: i64,
}

#[derive(Debug, Deserialize)]
struct VehicleRecord {
    #[serde(alias = "numero")]
    id: u32,
    #[serde(alias = "capacite")]
    capacity: u32,
}

/// Parses a boolean cell.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "f" | "no" | "n" | "non" => Some(false),
        "1" | "true" | "t" | "yes" | "y" | "oui" | "o" | "x" => Some(true),
        _ => None,
    }
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).ok_or_else(|| de::Error::custom(format!("invalid boolean {raw:?}")))
}

/// Wraps `reader` so that it yields UTF-8.
pub fn decode<'a, R: Read + 'a>(reader: R, encoding: InputEncoding) -> Box<dyn Read + 'a> {
    match encoding {
        // csv checks UTF-8 itself and reports the row
        InputEncoding::Utf8 => Box::new(reader),
        InputEncoding::Windows1252 => Box::new(
            DecodeReaderBytesBuilder::new()
                .encoding(Some(WINDOWS_1252))
                .bom_override(true)
                .strip_bom(true)
                .build(reader),
        ),
    }
}

fn read_records<T: DeserializeOwned, R: Read>(
    reader: R,
    delimiter: u8,
    collection: Collection,
) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (row_idx, result) in reader.deserialize().enumerate() {
        // +2: 1-based, after the header
        let row = row_idx + 2;
        let record = result.map_err(|e| ConvoyError::InvalidRecord {
            collection,
            row,
            message: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Reads people. Fails with `UnassignedRole` on a person without any role.
pub fn read_people<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Person>> {
    read_records::<PersonRecord, _>(reader, delimiter, Collection::People)?
        .into_iter()
        .map(PersonRecord::into_person)
        .collect()
}

pub fn read_teams<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Team>> {
    Ok(read_records::<TeamRecord, _>(reader, delimiter, Collection::Teams)?
        .into_iter()
        .map(|r| Team::new(r.id).with_name(r.name).with_faction(r.faction))
        .collect())
}

pub fn read_vehicles<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Vehicle>> {
    Ok(
        read_records::<VehicleRecord, _>(reader, delimiter, Collection::Vehicles)?
            .into_iter()
            .map(|r| Vehicle::new(r.id, r.capacity))
            .collect(),
    )
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| ConvoyError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the three input files into a roster.
///
/// # Errors
/// File and parse errors, `UnassignedRole`, `DuplicateId`.
pub fn load_roster(input: &InputConfig) -> Result<Roster> {
    let delimiter = input.delimiter_byte();
    let encoding = input.encoding;

    info!(path = %input.people.display(), ?encoding, "reading people");
    let people = read_people(decode(open(&input.people)?, encoding), delimiter)?;
    info!(path = %input.vehicles.display(), "reading vehicles");
    let vehicles = read_vehicles(decode(open(&input.vehicles)?, encoding), delimiter)?;
    info!(path = %input.teams.display(), "reading teams");
    let teams = read_teams(decode(open(&input.teams)?, encoding), delimiter)?;

    Roster::from_parts(people, teams, vehicles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        for raw in ["1", "true", "True", " yes ", "OUI", "x"] {
            assert_eq!(parse_flag(raw), Some(true), "{raw}");
        }
        for raw in ["", "0", "False", "no", "non"] {
            assert_eq!(parse_flag(raw), Some(false), "{raw}");
        }
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_read_people() {
        let data = "\
id;first_name;last_name;email;phone;new;certified;organizer;volunteer;adult;team_id;manual_vehicle_id
1;Alice;Martin;a@x.org;0601;1;0;0;0;1;3;
2;Bob;Petit;b@x.org;0602;0;0;1;0;true;;2
3;Chloe;Durand;;;0;1;0;0;0;3;
";
        let people = read_people(data.as_bytes(), b';').unwrap();
        assert_eq!(people.len(), 3);

        assert_eq!(people[0].role, Role::New);
        assert_eq!(people[0].team_id, Some(3));
        assert_eq!(people[0].manual_vehicle_id, None);

        assert_eq!(people[1].role, Role::Organizer);
        assert_eq!(people[1].team_id, None);
        assert_eq!(people[1].manual_vehicle_id, Some(2));

        assert_eq!(people[2].role, Role::Certified);
        assert!(!people[2].is_adult);
        assert_eq!(people[2].email, "");
    }

    #[test]
    fn test_read_people_french_headers() {
        let data = "\
id;prenom;nom;mail;telephone;nouveau;ce;num_equipe;benevole;orga;majeur;bus_manual
7;Jean;Dupont;j@x.fr;0700;False;True;2;False;False;True;
";
        let people = read_people(data.as_bytes(), b';').unwrap();
        assert_eq!(people[0].first_name, "Jean");
        assert_eq!(people[0].role, Role::Certified);
        assert_eq!(people[0].team_id, Some(2));
    }

    #[test]
    fn test_missing_role() {
        let data = "id;new;certified;organizer;volunteer;adult\n4;0;0;0;0;1\n";
        let err = read_people(data.as_bytes(), b';').unwrap_err();
        assert!(matches!(err, ConvoyError::UnassignedRole { person_id: 4 }));
    }

    #[test]
    fn test_invalid_row_reports_position() {
        let data = "id;capacity\n1;50\n2;lots\n";
        let err = read_vehicles(data.as_bytes(), b';').unwrap_err();
        match err {
            ConvoyError::InvalidRecord {
                collection, row, ..
            } => {
                assert_eq!(collection, Collection::Vehicles);
                assert_eq!(row, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    const CP1252_PEOPLE: &[u8] = b"id;prenom;nom;nouveau;ce;benevole;orga;majeur;num_equipe;bus_manual\n\
        1;H\xE9l\xE8ne;Dupont;0;1;0;0;1;1;\n\
        2;Fran\xE7ois;L\xE9v\xEAque;1;0;0;0;0;1;\n";

    #[test]
    fn test_read_people_windows_1252() {
        let people = read_people(decode(CP1252_PEOPLE, InputEncoding::Windows1252), b';').unwrap();
        assert_eq!(people[0].first_name, "Hélène");
        assert_eq!(people[0].role, Role::Certified);
        assert_eq!(people[1].first_name, "François");
        assert_eq!(people[1].last_name, "Lévêque");
    }

    #[test]
    fn test_windows_1252_bytes_as_utf8_rejected() {
        let err = read_people(decode(CP1252_PEOPLE, InputEncoding::Utf8), b';').unwrap_err();
        assert!(matches!(
            err,
            ConvoyError::InvalidRecord {
                collection: Collection::People,
                row: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_windows_1252_setting_honours_utf8_bom() {
        let data = "\u{feff}id;name;faction\n1;Équipe;1\n";
        let teams = read_teams(decode(data.as_bytes(), InputEncoding::Windows1252), b';').unwrap();
        assert_eq!(teams[0].id, 1);
        assert_eq!(teams[0].name, "Équipe");
    }

    #[test]
    fn test_load_roster_windows_1252() {
        let dir = tempfile::tempdir().unwrap();
        let input = InputConfig {
            people: dir.path().join("people.csv"),
            teams: dir.path().join("teams.csv"),
            vehicles: dir.path().join("vehicles.csv"),
            encoding: InputEncoding::Windows1252,
            ..InputConfig::default()
        };
        std::fs::write(&input.people, CP1252_PEOPLE).unwrap();
        std::fs::write(&input.teams, b"numero;nom;faction\n1;Cerf-volant \xE9t\xE9;0\n").unwrap();
        std::fs::write(&input.vehicles, "numero;capacite\n1;10\n").unwrap();

        let roster = load_roster(&input).unwrap();
        assert_eq!(roster.people.len(), 2);
        assert_eq!(roster.people.get(1).unwrap().first_name, "Hélène");
        assert_eq!(roster.teams.get(1).unwrap().name, "Cerf-volant été");
    }

    #[test]
    fn test_read_teams_and_vehicles() {
        let teams = read_teams("numero;nom;faction\n1;Foxes;1\n2;Owls;-1\n".as_bytes(), b';')
            .unwrap();
        assert_eq!(teams[1].name, "Owls");
        assert_eq!(teams[1].faction, -1);

        let vehicles = read_vehicles("numero,capacite\n1,50\n".as_bytes(), b',').unwrap();
        assert_eq!(vehicles[0].capacity, 50);
    }

    #[test]
    fn test_load_roster_rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let input = InputConfig {
            people: dir.path().join("people.csv"),
            teams: dir.path().join("teams.csv"),
            vehicles: dir.path().join("vehicles.csv"),
            ..InputConfig::default()
        };
        std::fs::write(&input.people, "id;organizer;adult\n1;1;1\n").unwrap();
        std::fs::write(&input.teams, "id;name;faction\n").unwrap();
        std::fs::write(&input.vehicles, "id;capacity\n1;10\n1;20\n").unwrap();

        let err = load_roster(&input).unwrap_err();
        assert!(matches!(
            err,
            ConvoyError::DuplicateId {
                collection: Collection::Vehicles,
                id: 1
            }
        ));
    }

    #[test]
    fn test_load_roster_missing_file() {
        let input = InputConfig {
            people: "/nonexistent/people.csv".into(),
            ..InputConfig::default()
        };
        let err = load_roster(&input).unwrap_err();
        assert!(matches!(err, ConvoyError::Open { .. }));
    }
}
