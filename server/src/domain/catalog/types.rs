//! Catalog response shapes and the documents they are built from

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::CatalogError;
use crate::core::constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::data::search::{SortField, SortOrder};

// ============================================================================
// Response shapes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FilmShort {
    pub uuid: Uuid,
    pub title: String,
    pub imdb_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenreShort {
    pub uuid: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PersonShort {
    pub uuid: Uuid,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FilmDetail {
    pub uuid: Uuid,
    pub title: String,
    pub imdb_rating: Option<f64>,
    pub description: Option<String>,
    pub genres: Vec<GenreShort>,
    pub directors: Vec<PersonShort>,
    pub actors: Vec<PersonShort>,
    pub writers: Vec<PersonShort>,
}

/// Part a person played in a film
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PersonRole {
    Actor,
    Director,
    Writer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FilmInPerson {
    pub uuid: Uuid,
    pub roles: Vec<PersonRole>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PersonDetail {
    pub uuid: Uuid,
    pub full_name: String,
    pub films: Vec<FilmInPerson>,
}

impl PersonDetail {
    pub fn new(person: PersonShort, films: Vec<FilmInPerson>) -> Self {
        Self {
            uuid: person.uuid,
            full_name: person.full_name,
            films,
        }
    }
}

// ============================================================================
// Query parameters
// ============================================================================

/// 1-based page of results; bounds are enforced by the HTTP layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Offset of the first hit
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn size(&self) -> u64 {
        u64::from(self.page_size)
    }
}

/// Sort parameters films accept, with the index field each one sorts on
///
/// `title` is analyzed text in the index; its keyword subfield sorts.
const SORTABLE_FIELDS: &[(&str, &str)] = &[("imdb_rating", "imdb_rating"), ("title", "title.raw")];

/// Film list ordering, written as `field` or `-field` for descending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilmSort {
    field: &'static str,
    index_field: &'static str,
    order: SortOrder,
}

impl Default for FilmSort {
    fn default() -> Self {
        Self {
            field: "imdb_rating",
            index_field: "imdb_rating",
            order: SortOrder::Desc,
        }
    }
}

impl FilmSort {
    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        let (name, order) = match raw.strip_prefix('-') {
            Some(name) => (name, SortOrder::Desc),
            None => (raw, SortOrder::Asc),
        };
        let &(field, index_field) = SORTABLE_FIELDS
            .iter()
            .find(|(param, _)| *param == name)
            .ok_or_else(|| CatalogError::InvalidSort(raw.to_string()))?;
        Ok(Self {
            field,
            index_field,
            order,
        })
    }

    /// Canonical text form, used in cache keys
    pub fn as_param(&self) -> String {
        match self.order {
            SortOrder::Asc => self.field.to_string(),
            SortOrder::Desc => format!("-{}", self.field),
        }
    }

    pub fn to_sort_field(&self) -> SortField {
        SortField {
            field: self.index_field.to_string(),
            order: self.order,
        }
    }
}

// ============================================================================
// Stored documents
// ============================================================================

/// `{id, name}` reference embedded in film documents
#[derive(Debug, Deserialize)]
pub(crate) struct NamedRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FilmDoc {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub imdb_rating: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genres: Vec<NamedRef>,
    #[serde(default)]
    pub directors: Vec<NamedRef>,
    #[serde(default)]
    pub actors: Vec<NamedRef>,
    #[serde(default)]
    pub writers: Vec<NamedRef>,
}

impl FilmDoc {
    /// Roles of `person_id` in this film, in actor, director, writer order
    pub fn roles_of(&self, person_id: Uuid) -> Vec<PersonRole> {
        [
            (&self.actors, PersonRole::Actor),
            (&self.directors, PersonRole::Director),
            (&self.writers, PersonRole::Writer),
        ]
        .into_iter()
        .filter(|(people, _)| people.iter().any(|p| p.id == person_id))
        .map(|(_, role)| role)
        .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenreDoc {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PersonDoc {
    pub id: Uuid,
    pub full_name: String,
}

fn people(refs: Vec<NamedRef>) -> Vec<PersonShort> {
    refs.into_iter()
        .map(|r| PersonShort {
            uuid: r.id,
            full_name: r.name,
        })
        .collect()
}

impl From<FilmDoc> for FilmShort {
    fn from(doc: FilmDoc) -> Self {
        Self {
            uuid: doc.id,
            title: doc.title,
            imdb_rating: doc.imdb_rating,
        }
    }
}

impl From<FilmDoc> for FilmDetail {
    fn from(doc: FilmDoc) -> Self {
        Self {
            uuid: doc.id,
            title: doc.title,
            imdb_rating: doc.imdb_rating,
            description: doc.description,
            genres: doc
                .genres
                .into_iter()
                .map(|g| GenreShort {
                    uuid: g.id,
                    name: g.name,
                })
                .collect(),
            directors: people(doc.directors),
            actors: people(doc.actors),
            writers: people(doc.writers),
        }
    }
}

impl From<GenreDoc> for GenreShort {
    fn from(doc: GenreDoc) -> Self {
        Self {
            uuid: doc.id,
            name: doc.name,
        }
    }
}

impl From<PersonDoc> for PersonShort {
    fn from(doc: PersonDoc) -> Self {
        Self {
            uuid: doc.id,
            full_name: doc.full_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pagination_offsets() {
        assert_eq!(Pagination::default(), Pagination::new(1, 50));
        assert_eq!(Pagination::new(1, 50).offset(), 0);
        assert_eq!(Pagination::new(3, 20).offset(), 40);
        assert_eq!(Pagination::new(3, 20).size(), 20);
    }

    #[test]
    fn test_film_sort_parse() {
        let desc = FilmSort::parse("-imdb_rating").unwrap();
        assert_eq!(desc, FilmSort::default());
        assert_eq!(desc.as_param(), "-imdb_rating");
        assert_eq!(desc.to_sort_field(), SortField::desc("imdb_rating"));

        let asc = FilmSort::parse("imdb_rating").unwrap();
        assert_eq!(asc.as_param(), "imdb_rating");
        assert_eq!(asc.to_sort_field().order, SortOrder::Asc);
    }

    #[test]
    fn test_film_sort_by_title() {
        let sort = FilmSort::parse("title").unwrap();
        assert_eq!(sort.as_param(), "title");
        assert_eq!(
            sort.to_sort_field(),
            SortField {
                field: "title.raw".to_string(),
                order: SortOrder::Asc,
            }
        );
        assert_eq!(FilmSort::parse("-title").unwrap().as_param(), "-title");
    }

    #[test]
    fn test_film_sort_rejects_unknown_field() {
        assert!(matches!(
            FilmSort::parse("-description"),
            Err(CatalogError::InvalidSort(s)) if s == "-description"
        ));
        assert!(FilmSort::parse("").is_err());
    }

    #[test]
    fn test_film_doc_to_detail() {
        let director = Uuid::new_v4();
        let doc: FilmDoc = serde_json::from_value(json!({
            "id": Uuid::nil(),
            "title": "The Matrix",
            "imdb_rating": 8.7,
            "genres": [{"id": Uuid::nil(), "name": "Action"}],
            "directors": [{"id": director, "name": "Lana Wachowski"}]
        }))
        .unwrap();

        let detail = FilmDetail::from(doc);
        assert_eq!(detail.title, "The Matrix");
        assert_eq!(detail.description, None);
        assert_eq!(detail.genres[0].name, "Action");
        assert_eq!(detail.directors[0].uuid, director);
        assert_eq!(detail.directors[0].full_name, "Lana Wachowski");
        assert!(detail.actors.is_empty());
    }

    #[test]
    fn test_roles_order() {
        let person = Uuid::new_v4();
        let doc: FilmDoc = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "title": "Solo",
            "writers": [{"id": person, "name": "P"}],
            "actors": [{"id": person, "name": "P"}]
        }))
        .unwrap();

        assert_eq!(
            doc.roles_of(person),
            vec![PersonRole::Actor, PersonRole::Writer]
        );
        assert!(doc.roles_of(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn test_person_role_wire_format() {
        assert_eq!(
            serde_json::to_value(PersonRole::Director).unwrap(),
            json!("director")
        );
    }

    #[test]
    fn test_response_shapes_survive_msgpack() {
        let detail = PersonDetail {
            uuid: Uuid::new_v4(),
            full_name: "Keanu Reeves".into(),
            films: vec![FilmInPerson {
                uuid: Uuid::new_v4(),
                roles: vec![PersonRole::Actor],
            }],
        };
        let bytes = rmp_serde::to_vec(&detail).unwrap();
        let back: PersonDetail = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(back, detail);
    }
}
