use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::records::{
    Award, Basics, Certificate, Education, Interest, Language, Project, Publication, Reference,
    Skill, Volunteer, WorkExperience,
};

// ────────────────────────────────────────────────────────────────────────────
// Identifiers
// ────────────────────────────────────────────────────────────────────────────

/// Identity of a resume document. Assigned at creation, never changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeId(pub Uuid);

impl ResumeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ResumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable identity of one element inside a section, generated on add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Work,
    Volunteer,
    Education,
    Awards,
    Certificates,
    Publications,
    Skills,
    Languages,
    Interests,
    References,
    Projects,
}

impl SectionKind {
    pub const ALL: [SectionKind; 11] = [
        SectionKind::Work,
        SectionKind::Volunteer,
        SectionKind::Education,
        SectionKind::Awards,
        SectionKind::Certificates,
        SectionKind::Publications,
        SectionKind::Skills,
        SectionKind::Languages,
        SectionKind::Interests,
        SectionKind::References,
        SectionKind::Projects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Work => "work",
            SectionKind::Volunteer => "volunteer",
            SectionKind::Education => "education",
            SectionKind::Awards => "awards",
            SectionKind::Certificates => "certificates",
            SectionKind::Publications => "publications",
            SectionKind::Skills => "skills",
            SectionKind::Languages => "languages",
            SectionKind::Interests => "interests",
            SectionKind::References => "references",
            SectionKind::Projects => "projects",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown resume section '{0}'")]
pub struct UnknownSection(pub String);

impl FromStr for SectionKind {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

/// One element of a section: the record plus its stable id.
///
/// Stored as a single flat JSON object; entries persisted without an `id`
/// receive a fresh one on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item<T> {
    #[serde(default)]
    pub id: ItemId,
    #[serde(flatten)]
    pub record: T,
}

/// An ordered collection of records. List order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Section<T> {
    items: Vec<Item<T>>,
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Section<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn records(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|item| &item.record)
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    pub fn get(&self, id: ItemId) -> Option<&T> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map(|item| &item.record)
    }

    pub fn get_at(&self, index: usize) -> Option<&T> {
        self.items.get(index).map(|item| &item.record)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut T> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .map(|item| &mut item.record)
    }

    pub fn get_at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index).map(|item| &mut item.record)
    }

    /// Appends a record and returns its newly generated id.
    pub fn push(&mut self, record: T) -> ItemId {
        let id = ItemId::new();
        self.items.push(Item { id, record });
        id
    }

    pub fn remove(&mut self, id: ItemId) -> Option<T> {
        let index = self.position(id)?;
        self.remove_at(index)
    }

    /// Removes the element at `index`, shifting later elements left.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index < self.items.len() {
            Some(self.items.remove(index).record)
        } else {
            None
        }
    }
}

impl<T> FromIterator<T> for Section<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut section = Section::default();
        for record in iter {
            section.push(record);
        }
        section
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resume document
// ────────────────────────────────────────────────────────────────────────────

/// A resume document as held by the store and persisted to storage.
///
/// Every key is optional on input and always present on output; absent
/// values load as empty strings or lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Resume {
    pub id: ResumeId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    pub basics: Basics,
    pub work: Section<WorkExperience>,
    pub volunteer: Section<Volunteer>,
    pub education: Section<Education>,
    pub awards: Section<Award>,
    pub certificates: Section<Certificate>,
    pub publications: Section<Publication>,
    pub skills: Section<Skill>,
    pub languages: Section<Language>,
    pub interests: Section<Interest>,
    pub references: Section<Reference>,
    pub projects: Section<Project>,
}

/// Current time at the millisecond precision timestamps are stored with.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

impl Resume {
    /// An empty document with a fresh id and both timestamps set to now.
    pub fn new() -> Self {
        let now = now_millis();
        Self {
            id: ResumeId::new(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }

    /// Bumps `updated_at` without ever moving it backwards.
    pub fn touch(&mut self) {
        let now = now_millis();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    pub fn section_len(&self, kind: SectionKind) -> usize {
        match kind {
            SectionKind::Work => self.work.len(),
            SectionKind::Volunteer => self.volunteer.len(),
            SectionKind::Education => self.education.len(),
            SectionKind::Awards => self.awards.len(),
            SectionKind::Certificates => self.certificates.len(),
            SectionKind::Publications => self.publications.len(),
            SectionKind::Skills => self.skills.len(),
            SectionKind::Languages => self.languages.len(),
            SectionKind::Interests => self.interests.len(),
            SectionKind::References => self.references.len(),
            SectionKind::Projects => self.projects.len(),
        }
    }

    /// True when no basics field is filled and every section is empty.
    pub fn is_blank(&self) -> bool {
        self.basics == Basics::default()
            && SectionKind::ALL
                .into_iter()
                .all(|kind| self.section_len(kind) == 0)
    }
}

/// Whole-section replacement for the draft. Supplied sections overwrite the
/// draft's; omitted ones are left alone. Replaced items get fresh ids.
///
/// A complete JSON Resume document deserializes into this type, which makes
/// it double as the import format. Its `$schema` and `meta` keys, and the id
/// and timestamps of a document fetched from this service, are accepted and
/// dropped; any other unknown key is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ResumePatch {
    #[serde(rename = "$schema", skip_serializing)]
    pub(crate) _schema: Option<Value>,
    #[serde(rename = "meta", skip_serializing)]
    pub(crate) _meta: Option<Value>,
    #[serde(rename = "id", skip_serializing)]
    pub(crate) _id: Option<Value>,
    #[serde(rename = "createdAt", skip_serializing)]
    pub(crate) _created_at: Option<Value>,
    #[serde(rename = "updatedAt", skip_serializing)]
    pub(crate) _updated_at: Option<Value>,
    pub basics: Option<Basics>,
    pub work: Option<Vec<WorkExperience>>,
    pub volunteer: Option<Vec<Volunteer>>,
    pub education: Option<Vec<Education>>,
    pub awards: Option<Vec<Award>>,
    pub certificates: Option<Vec<Certificate>>,
    pub publications: Option<Vec<Publication>>,
    pub skills: Option<Vec<Skill>>,
    pub languages: Option<Vec<Language>>,
    pub interests: Option<Vec<Interest>>,
    pub references: Option<Vec<Reference>>,
    pub projects: Option<Vec<Project>>,
}

impl ResumePatch {
    pub fn apply(self, resume: &mut Resume) {
        if let Some(basics) = self.basics {
            resume.basics = basics;
        }
        replace_section(&mut resume.work, self.work);
        replace_section(&mut resume.volunteer, self.volunteer);
        replace_section(&mut resume.education, self.education);
        replace_section(&mut resume.awards, self.awards);
        replace_section(&mut resume.certificates, self.certificates);
        replace_section(&mut resume.publications, self.publications);
        replace_section(&mut resume.skills, self.skills);
        replace_section(&mut resume.languages, self.languages);
        replace_section(&mut resume.interests, self.interests);
        replace_section(&mut resume.references, self.references);
        replace_section(&mut resume.projects, self.projects);
    }
}

fn replace_section<T>(section: &mut Section<T>, records: Option<Vec<T>>) {
    if let Some(records) = records {
        *section = records.into_iter().collect();
    }
}

/// The JSON Resume representation of a document: `basics` plus every
/// collection, without document id, timestamps or item ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JsonResume {
    pub basics: Basics,
    pub work: Vec<WorkExperience>,
    pub volunteer: Vec<Volunteer>,
    pub education: Vec<Education>,
    pub awards: Vec<Award>,
    pub certificates: Vec<Certificate>,
    pub publications: Vec<Publication>,
    pub skills: Vec<Skill>,
    pub languages: Vec<Language>,
    pub interests: Vec<Interest>,
    pub references: Vec<Reference>,
    pub projects: Vec<Project>,
}

impl From<&Resume> for JsonResume {
    fn from(resume: &Resume) -> Self {
        fn records<T: Clone>(section: &Section<T>) -> Vec<T> {
            section.records().cloned().collect()
        }

        JsonResume {
            basics: resume.basics.clone(),
            work: records(&resume.work),
            volunteer: records(&resume.volunteer),
            education: records(&resume.education),
            awards: records(&resume.awards),
            certificates: records(&resume.certificates),
            publications: records(&resume.publications),
            skills: records(&resume.skills),
            languages: records(&resume.languages),
            interests: records(&resume.interests),
            references: records(&resume.references),
            projects: records(&resume.projects),
        }
    }
}
