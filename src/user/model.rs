use chrono::{DateTime, Utc};
use diesel::prelude::{Queryable, Selectable};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Id;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: Id,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub university: Option<String>,
    pub sport: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Profile {
    pub fn new(id: Id, full_name: impl Into<String>) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            avatar_url: None,
            university: None,
            sport: None,
            skills: vec![],
        }
    }

    pub fn with_university(self, university: impl Into<String>) -> Self {
        Self {
            university: Some(university.into()),
            ..self
        }
    }

    pub fn with_sport(self, sport: impl Into<String>) -> Self {
        Self {
            sport: Some(sport.into()),
            ..self
        }
    }

    pub fn with_skills<I, S>(self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            skills: skills.into_iter().map(Into::into).collect(),
            ..self
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = crate::schema::profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProfileRow {
    id: Uuid,
    full_name: String,
    avatar_url: Option<String>,
    university: Option<String>,
    sport: Option<String>,
    skills: Vec<String>,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id.into(),
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            university: row.university,
            sport: row.sport,
            skills: row.skills,
        }
    }
}
